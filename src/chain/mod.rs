//! Chain access: the narrow client surface the fuzzer consumes from a node.
//!
//! Everything above this module (workers, watcher, replenisher) talks to the
//! node only through `ChainClient`, so the websocket client can be swapped for
//! an in-memory one in tests.

pub mod ws;
#[cfg(test)]
pub mod mock;

use crate::crypto::SignedTx;
use crate::utils::Result;
use ethers::types::{Address, Block, Transaction, H256, U256};
use tokio::sync::mpsc;

pub use ws::WsClient;

/// New chain heads as they arrive. An `Err` item means the subscription is gone.
pub type HeadStream = mpsc::UnboundedReceiver<Result<Block<H256>>>;

#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + 'static {
    async fn chain_id(&self) -> Result<u64>;

    /// Nonce including transactions still in the node's pool.
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    async fn pending_balance(&self, address: Address) -> Result<U256>;

    async fn send_transaction(&self, tx: &SignedTx) -> Result<H256>;

    async fn subscribe_new_heads(&self) -> Result<HeadStream>;

    /// Full block with transaction bodies.
    async fn block_by_hash(&self, hash: H256) -> Result<Block<Transaction>>;

    /// Resolve once `hash` has a receipt.
    async fn wait_mined(&self, hash: H256) -> Result<()>;
}
