//! Per-account submission loop.
//!
//! acquire nonce -> build -> sign -> submit
//!   success: advance cursor, sleep the published cooldown, repeat
//!   failure: re-read the pending nonce, retry right away without sleeping
//!
//! Send failures are expected under fee and nonce churn and stay at debug level.

use crate::chain::ChainClient;
use crate::control::FeeState;
use crate::crypto::{sign_transaction, Account};
use crate::node::service_handle::sleep_or_shutdown;
use crate::txgen::{Filler, OpcodeGenerator, ProgramGenerator, TxSynthesizer};
use crate::utils::{Result, METRICS};
use crate::worker::nonce::NonceCursor;
use ethers::types::{H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Cooldowns at or below this are not slept.
    pub min_sleep: Duration,
    pub fee_tip: U256,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { min_sleep: Duration::from_millis(10), fee_tip: U256::one() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Sent { nonce: u64, hash: H256 },
    /// `resynced_to` is `None` when the nonce query failed too.
    Rejected { nonce: u64, resynced_to: Option<u64> },
}

pub struct AccountWorker<C: ChainClient, G: ProgramGenerator = OpcodeGenerator> {
    account: Account,
    chain_id: u64,
    client: Arc<C>,
    fees: Arc<FeeState>,
    synth: Arc<TxSynthesizer<G>>,
    src: Filler,
    cursor: NonceCursor,
    cfg: WorkerConfig,
}

impl<C: ChainClient, G: ProgramGenerator> AccountWorker<C, G> {
    /// Create the worker, seeding its cursor from the node's pending nonce.
    pub async fn start(
        account: Account,
        chain_id: u64,
        client: Arc<C>,
        fees: Arc<FeeState>,
        synth: Arc<TxSynthesizer<G>>,
        src: Filler,
        cfg: WorkerConfig,
    ) -> Self {
        let address = account.address();
        let start = match client.pending_nonce(address).await {
            Ok(n) => n,
            Err(e) => {
                // the first rejected send resyncs
                warn!(?address, "could not get nonce: {}", e);
                0
            }
        };
        Self { account, chain_id, client, fees, synth, src, cursor: NonceCursor::new(start), cfg }
    }

    pub fn nonce(&self) -> u64 {
        self.cursor.current()
    }

    /// One build/sign/submit iteration. Only signing failures are returned as errors.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let address = self.account.address();
        let nonce = self.cursor.current();
        let intent = self.synth.build(nonce, self.fees.fee_cap(), self.cfg.fee_tip, &mut self.src);
        let signed = sign_transaction(&intent.to_typed(), &self.account.wallet, self.chain_id)?;

        match self.client.send_transaction(&signed).await {
            Ok(hash) => {
                debug!(sender = ?address, nonce, shape = ?intent.shape, "sent tx");
                METRICS.inc_counter("tx_sent");
                self.cursor.advance();
                Ok(StepOutcome::Sent { nonce, hash })
            }
            Err(e) => {
                debug!(sender = ?address, nonce, "could not send tx: {}", e);
                METRICS.inc_counter("tx_send_failed");
                match self.client.pending_nonce(address).await {
                    Ok(pending) => {
                        METRICS.inc_counter("nonce_resync");
                        self.cursor.resync(pending);
                        Ok(StepOutcome::Rejected { nonce, resynced_to: Some(pending) })
                    }
                    Err(qe) => {
                        warn!(sender = ?address, "could not get nonce: {}", qe);
                        Ok(StepOutcome::Rejected { nonce, resynced_to: None })
                    }
                }
            }
        }
    }

    /// Loop until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                debug!(account = self.account.index, "worker stopping");
                return Ok(());
            }
            let pause = match self.step().await? {
                StepOutcome::Sent { .. } => {
                    let cooldown = self.fees.cooldown();
                    (cooldown > self.cfg.min_sleep).then_some(cooldown)
                }
                StepOutcome::Rejected { resynced_to: None, .. } => Some(self.cfg.min_sleep),
                StepOutcome::Rejected { .. } => None,
            };
            match pause {
                Some(d) => {
                    if sleep_or_shutdown(d, &mut shutdown).await {
                        return Ok(());
                    }
                }
                None => tokio::task::yield_now().await,
            }
        }
    }
}
