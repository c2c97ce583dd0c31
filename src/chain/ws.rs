//! Websocket `ChainClient` backed by an `ethers` provider.

use crate::chain::{ChainClient, HeadStream};
use crate::crypto::SignedTx;
use crate::utils::{FuzzError, Result};
use ethers::providers::{Middleware, Provider, Ws};
use ethers::types::{Address, Block, BlockNumber, Transaction, H256, U256};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct WsClient {
    provider: Arc<Provider<Ws>>,
    receipt_poll: Duration,
}

impl WsClient {
    pub async fn connect(url: &str, receipt_poll: Duration) -> Result<Self> {
        let provider = Provider::<Ws>::connect(url)
            .await
            .map_err(|e| FuzzError::Rpc(format!("could not connect to rpc '{}': {}", url, e)))?;
        info!("connected to {}", url);
        Ok(Self { provider: Arc::new(provider), receipt_poll })
    }
}

#[async_trait::async_trait]
impl ChainClient for WsClient {
    async fn chain_id(&self) -> Result<u64> {
        let id = self.provider.get_chainid().await.map_err(|e| FuzzError::Rpc(e.to_string()))?;
        Ok(id.as_u64())
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| FuzzError::Rpc(e.to_string()))?;
        Ok(nonce.as_u64())
    }

    async fn pending_balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| FuzzError::Rpc(e.to_string()))
    }

    async fn send_transaction(&self, tx: &SignedTx) -> Result<H256> {
        let pending = self
            .provider
            .send_raw_transaction(tx.raw.clone())
            .await
            .map_err(|e| FuzzError::Send(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn subscribe_new_heads(&self) -> Result<HeadStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = self.provider.clone();
        tokio::spawn(async move {
            let mut stream = match provider.subscribe_blocks().await {
                Ok(s) => s,
                Err(e) => {
                    let _ = tx.send(Err(FuzzError::Subscription(e.to_string())));
                    return;
                }
            };
            while let Some(head) = stream.next().await {
                if tx.send(Ok(head)).is_err() {
                    debug!("head receiver dropped, ending subscription");
                    return;
                }
            }
            let _ = tx.send(Err(FuzzError::Subscription("new head stream ended".into())));
        });
        Ok(rx)
    }

    async fn block_by_hash(&self, hash: H256) -> Result<Block<Transaction>> {
        self.provider
            .get_block_with_txs(hash)
            .await
            .map_err(|e| FuzzError::Rpc(e.to_string()))?
            .ok_or_else(|| FuzzError::NotFound(format!("block {:?}", hash)))
    }

    async fn wait_mined(&self, hash: H256) -> Result<()> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(|e| FuzzError::Rpc(e.to_string()))?;
            if receipt.is_some() {
                return Ok(());
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }
}
