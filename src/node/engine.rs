//! Fuzzer orchestration: wire up watcher, replenisher and account workers.
//!
//! Startup order matters. The watcher must have processed one head before
//! anything reads the fee cap, and accounts must be funded before workers
//! start spending.

use crate::airdrop::Replenisher;
use crate::chain::ChainClient;
use crate::control::{FeeState, RateController};
use crate::crypto::{derive_accounts, Account};
use crate::node::config::FuzzConfig;
use crate::node::service_handle::ServiceHandle;
use crate::txgen::{Filler, TxSynthesizer};
use crate::utils::Result;
use crate::watcher::BlockWatcher;
use crate::worker::AccountWorker;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;

/// Main fuzzer object
pub struct Fuzzer<C: ChainClient> {
    client: Arc<C>,
    funder: LocalWallet,
    chain_id: u64,
    cfg: FuzzConfig,
    fees: Arc<FeeState>,
}

impl<C: ChainClient> Fuzzer<C> {
    pub async fn new(client: Arc<C>, funder: LocalWallet, cfg: FuzzConfig) -> Result<Self> {
        cfg.validate()?;
        let chain_id = client.chain_id().await?;
        let fees = Arc::new(FeeState::new(cfg.initial_fee_cap(), cfg.initial_cooldown()));
        info!(chain_id, funder = ?funder.address(), "fuzzer ready");
        Ok(Self { client, funder, chain_id, cfg, fees })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn fees(&self) -> &Arc<FeeState> {
        &self.fees
    }

    /// Derive accounts `start..end` from `mnemonic` and start fuzzing from them.
    pub async fn fuzz(&self, seed: u64, mnemonic: &str, start: u32, end: u32) -> Result<ServiceHandle> {
        let accounts = derive_accounts(mnemonic, start, end)?;
        self.start(accounts, seed).await
    }

    /// Start all subsystems and return the ServiceHandle for shutdown.
    pub async fn start(&self, accounts: Vec<Account>, seed: u64) -> Result<ServiceHandle> {
        info!(seed, "fuzzing using random seed");
        let (mut svc, shutdown_rx) = ServiceHandle::new();
        let addrs: Vec<Address> = accounts.iter().map(Account::address).collect();

        // -----------------------
        // Block watcher (blocks until the first head)
        // -----------------------
        let controller = RateController::with_policy(self.cfg.controller(), self.cfg.policy(), self.fees.clone());
        let watcher = BlockWatcher::new(self.client.clone(), controller, addrs.iter().copied());
        let h = watcher.spawn(shutdown_rx.clone()).await?;
        svc.attach("block-watcher", h);

        // -----------------------
        // Replenisher: once now, then periodically
        // -----------------------
        let replenisher = Replenisher::new(
            self.client.clone(),
            self.funder.clone(),
            self.chain_id,
            self.fees.clone(),
            self.cfg.airdrop(),
            shutdown_rx.clone(),
        );
        replenisher.run_once(&addrs).await?;
        svc.attach("replenisher", tokio::spawn(replenisher.run(addrs.clone())));

        // -----------------------
        // Account workers
        // -----------------------
        let mut rng = StdRng::seed_from_u64(seed);
        let synth = Arc::new(TxSynthesizer::new(self.cfg.synth()));
        for account in accounts {
            let index = account.index;
            let src = Filler::from_rng(&mut rng, self.cfg.random_buffer_len);
            let worker = AccountWorker::start(
                account,
                self.chain_id,
                self.client.clone(),
                self.fees.clone(),
                synth.clone(),
                src,
                self.cfg.worker(),
            )
            .await;
            svc.attach(format!("worker-{}", index), tokio::spawn(worker.run(shutdown_rx.clone())));
        }

        info!(workers = addrs.len(), "fuzzer started");
        Ok(svc)
    }
}
