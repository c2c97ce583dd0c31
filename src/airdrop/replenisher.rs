use crate::chain::ChainClient;
use crate::control::FeeState;
use crate::crypto::sign_transaction;
use crate::node::service_handle::{sleep_or_shutdown, until_shutdown};
use crate::utils::{Result, METRICS};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Gas of a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

#[derive(Debug, Clone)]
pub struct AirdropConfig {
    /// Balance every account is brought back to.
    pub target: U256,
    pub period: Duration,
    /// Delay between resends of a rejected transfer.
    pub retry_delay: Duration,
    /// Published fee cap and tip are multiplied by this to get included quickly.
    pub fee_multiplier: u64,
    pub fee_tip: U256,
}

impl Default for AirdropConfig {
    fn default() -> Self {
        Self {
            target: ethers::utils::WEI_IN_ETHER * 100u64,
            period: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            fee_multiplier: 2,
            fee_tip: U256::one(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct AirdropReport {
    /// (recipient, amount) per transfer sent, in order.
    pub funded: Vec<(Address, U256)>,
    pub skipped: usize,
    pub last_tx: Option<H256>,
}

pub struct Replenisher<C: ChainClient> {
    client: Arc<C>,
    funder: LocalWallet,
    chain_id: u64,
    fees: Arc<FeeState>,
    cfg: AirdropConfig,
    shutdown: watch::Receiver<bool>,
}

impl<C: ChainClient> Replenisher<C> {
    pub fn new(
        client: Arc<C>,
        funder: LocalWallet,
        chain_id: u64,
        fees: Arc<FeeState>,
        cfg: AirdropConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { client, funder, chain_id, fees, cfg, shutdown }
    }

    /// Transfer request from the funder, bidding above the published fees.
    pub fn transfer_request(&self, to: Address, value: U256, nonce: u64) -> TypedTransaction {
        let mult = U256::from(self.cfg.fee_multiplier);
        Eip1559TransactionRequest::new()
            .to(to)
            .value(value)
            .nonce(nonce)
            .gas(TRANSFER_GAS)
            .max_priority_fee_per_gas(self.cfg.fee_tip.saturating_mul(mult))
            .max_fee_per_gas(self.fees.fee_cap().saturating_mul(mult))
            .into()
    }

    /// Top up every account below target, then wait for the last transfer
    /// to be mined so the next pass sees real balances. Balance, nonce and
    /// signing failures are fatal; rejected sends are retried until accepted.
    /// Every node call gives way to shutdown, which returns what was done so far.
    pub async fn run_once(&self, targets: &[Address]) -> Result<AirdropReport> {
        let mut shutdown = self.shutdown.clone();
        let mut report = AirdropReport::default();
        debug!(target_balance = %self.cfg.target, "airdrop to get accounts back to target");

        for &to in targets {
            let balance = match until_shutdown(self.client.pending_balance(to), &mut shutdown).await {
                Some(res) => res?,
                None => return Ok(report),
            };
            if balance >= self.cfg.target {
                debug!(addr = ?to, %balance, "already funded");
                report.skipped += 1;
                continue;
            }
            let value = self.cfg.target - balance;
            debug!(addr = ?to, %value, "airdropping");

            let nonce = match until_shutdown(self.client.pending_nonce(self.funder.address()), &mut shutdown).await {
                Some(res) => res?,
                None => return Ok(report),
            };
            let signed = sign_transaction(&self.transfer_request(to, value, nonce), &self.funder, self.chain_id)?;

            loop {
                match until_shutdown(self.client.send_transaction(&signed), &mut shutdown).await {
                    None => return Ok(report),
                    Some(Ok(_)) => break,
                    Some(Err(e)) => {
                        warn!(addr = ?to, "could not send airdrop transaction: {}", e);
                        METRICS.inc_counter("airdrop_retry");
                        if sleep_or_shutdown(self.cfg.retry_delay, &mut shutdown).await {
                            return Ok(report);
                        }
                    }
                }
            }
            METRICS.inc_counter("airdrop_sent");
            report.funded.push((to, value));
            report.last_tx = Some(signed.hash);
        }

        match report.last_tx {
            Some(hash) => {
                info!(transfers = report.funded.len(), "waiting for airdrop");
                match until_shutdown(self.client.wait_mined(hash), &mut shutdown).await {
                    Some(res) => res?,
                    None => {
                        info!("shutdown while waiting for airdrop");
                        return Ok(report);
                    }
                }
                info!("airdrop successful");
            }
            None => info!("airdrop finished without airdropping anything"),
        }
        Ok(report)
    }

    /// Repeat `run_once` every period until shutdown. The first pass is the
    /// caller's, this only runs the periodic ones.
    pub async fn run(self, targets: Vec<Address>) -> Result<()> {
        let mut shutdown = self.shutdown.clone();
        let mut ticker = interval_at(Instant::now() + self.cfg.period, self.cfg.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once(&targets).await?;
                    if *shutdown.borrow() {
                        info!("replenisher stopping");
                        return Ok(());
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("replenisher stopping");
                        return Ok(());
                    }
                }
            }
        }
    }
}
