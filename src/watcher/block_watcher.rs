//! Follows new chain heads, feeds each block into the rate controller and
//! counts how many of our own transactions made it in.
//!
//! Losing the head subscription is fatal: without fresh blocks the controller
//! would keep steering on stale data.

use crate::chain::{ChainClient, HeadStream};
use crate::control::{Adjustment, BlockObservation, CooldownPolicy, HysteresisPolicy, RateController};
use crate::crypto::recover_sender;
use crate::utils::{FuzzError, Result, METRICS};
use ethers::types::{Address, Block, Transaction, H256};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct BlockReport {
    pub number: u64,
    /// Transactions in the block sent by one of our accounts.
    pub included: usize,
    pub adjustment: Adjustment,
}

pub struct BlockWatcher<C: ChainClient, P: CooldownPolicy = HysteresisPolicy> {
    client: Arc<C>,
    controller: RateController<P>,
    watched: HashSet<Address>,
}

impl<C: ChainClient, P: CooldownPolicy> BlockWatcher<C, P> {
    pub fn new(client: Arc<C>, controller: RateController<P>, watched: impl IntoIterator<Item = Address>) -> Self {
        Self { client, controller, watched: watched.into_iter().collect() }
    }

    pub fn controller(&self) -> &RateController<P> {
        &self.controller
    }

    /// Fetch the full block behind `head` and process it.
    pub async fn process_head(&mut self, head: &Block<H256>) -> Result<BlockReport> {
        let hash = head
            .hash
            .ok_or_else(|| FuzzError::NotFound("new head without hash".into()))?;
        let block = self.client.block_by_hash(hash).await?;
        Ok(self.process_block(&block))
    }

    pub fn process_block(&mut self, block: &Block<Transaction>) -> BlockReport {
        let number = block.number.map(|n| n.as_u64()).unwrap_or_default();

        let mut included = 0;
        for tx in &block.transactions {
            match recover_sender(tx) {
                Ok(sender) if self.watched.contains(&sender) => {
                    included += 1;
                    debug!(?sender, nonce = %tx.nonce, block = number, "included tx");
                }
                Ok(_) => {}
                // foreign tx types; only the diagnostic count is affected
                Err(e) => debug!(tx = ?tx.hash, "could not recover sender: {}", e),
            }
        }

        let adjustment = self.controller.observe(&BlockObservation::from_block(block));

        METRICS.inc_counter("blocks_observed");
        METRICS.add_counter("fuzz_txs_included", included as u64);
        METRICS.set_gauge("fee_cap_wei", adjustment.fee_cap.low_u128() as f64);
        METRICS.set_gauge("cooldown_ms", adjustment.cooldown.as_secs_f64() * 1000.0);
        if let Some(avg) = adjustment.average_utilization {
            METRICS.set_gauge("avg_utilization", avg as f64);
        }

        info!(
            block = number,
            gas_usage_percent = adjustment.utilization,
            fee_cap = %adjustment.fee_cap,
            going_down = adjustment.going_down,
            "included {} transactions, sending a transaction every {:?}",
            included,
            adjustment.cooldown
        );

        BlockReport { number, included, adjustment }
    }

    /// Consume heads until shutdown. `ready` fires after the first block is processed.
    pub async fn run(
        mut self,
        mut heads: HeadStream,
        ready: oneshot::Sender<()>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ready = Some(ready);
        loop {
            let head = tokio::select! {
                h = heads.recv() => h,
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("block watcher stopping");
                        return Ok(());
                    }
                    continue;
                }
            };
            let head = match head {
                Some(Ok(head)) => head,
                Some(Err(e)) => {
                    error!("new head subscription error: {}", e);
                    return Err(e);
                }
                None => {
                    error!("new head subscription closed");
                    return Err(FuzzError::Subscription("new head stream closed".into()));
                }
            };
            if let Err(e) = self.process_head(&head).await {
                error!(block = ?head.number, "could not process block: {}", e);
                return Err(e);
            }
            if let Some(tx) = ready.take() {
                let _ = tx.send(());
            }
        }
    }

    /// Subscribe, start the watcher task and wait until the first head has
    /// been processed, so the fee cap and cooldown are initialized before use.
    pub async fn spawn(self, shutdown: watch::Receiver<bool>) -> Result<JoinHandle<Result<()>>> {
        let heads = self.client.subscribe_new_heads().await?;
        let (ready_tx, ready_rx) = oneshot::channel();
        let handle = tokio::spawn(self.run(heads, ready_tx, shutdown));

        if ready_rx.await.is_ok() {
            return Ok(handle);
        }
        match handle.await {
            Ok(Err(e)) => Err(e),
            Ok(Ok(())) => Err(FuzzError::Subscription("watcher stopped before the first head".into())),
            Err(e) => Err(FuzzError::Subscription(format!("watcher task failed: {}", e))),
        }
    }
}
