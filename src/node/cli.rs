use crate::chain::WsClient;
use crate::crypto::parse_private_key;
use crate::node::config::FuzzConfig;
use crate::node::engine::Fuzzer;
use crate::utils::{init_logging, METRICS};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rand::RngCore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// CLI for the transaction fuzzer.
#[derive(Parser)]
#[clap(name = "txfuzz", version)]
pub struct Cli {
    /// Optional TOML file with fuzzer tunables
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Send random transactions from derived accounts until interrupted
    Spam {
        /// websocket rpc endpoint, e.g. ws://127.0.0.1:8546
        rpc_url: String,

        /// hex private key of the account that funds the fuzzing accounts
        funding_key: String,

        /// mnemonic the fuzzing accounts are derived from
        mnemonic: String,

        /// account indices: `start` or `start..end` (end exclusive)
        #[clap(value_parser = parse_index_range)]
        range: (u32, u32),

        /// hex seed for the random source; drawn from the OS when absent
        #[clap(value_parser = parse_seed)]
        seed: Option<u64>,

        /// log every send
        #[clap(short, long)]
        verbose: bool,

        /// also generate legacy (pre-1559) transactions
        #[clap(long)]
        allow_legacy: bool,
    },
}

/// Parse `start` or `start..end` into a half-open index range.
pub fn parse_index_range(s: &str) -> std::result::Result<(u32, u32), String> {
    let (start, end) = match s.split_once("..") {
        Some((a, b)) => (parse_index(a)?, parse_index(b)?),
        None => {
            let start = parse_index(s)?;
            let end = start.checked_add(1).ok_or_else(|| format!("index {} too large", start))?;
            (start, end)
        }
    };
    if end <= start {
        return Err(format!("empty range {}..{}", start, end));
    }
    Ok((start, end))
}

fn parse_index(s: &str) -> std::result::Result<u32, String> {
    s.trim().parse::<u32>().map_err(|e| format!("bad index '{}': {}", s, e))
}

/// Parse a hex seed (optional `0x`) as a big-endian u64, left-padded to 8 bytes.
pub fn parse_seed(s: &str) -> std::result::Result<u64, String> {
    let digits = s.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Err("empty seed".into());
    }
    let padded = if digits.len() % 2 == 1 { format!("0{}", digits) } else { digits.to_string() };
    let bytes = hex::decode(&padded).map_err(|e| format!("bad seed '{}': {}", s, e))?;
    if bytes.len() > 8 {
        return Err(format!("seed '{}' longer than 8 bytes", s));
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(&bytes);
    Ok(u64::from_be_bytes(buf))
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Spam { rpc_url, funding_key, mnemonic, range, seed, verbose, allow_legacy } => {
            init_logging(verbose);

            let mut cfg = match &cli.config {
                Some(path) => FuzzConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
                None => FuzzConfig::default(),
            };
            cfg.allow_legacy_txs |= allow_legacy;

            let funder = parse_private_key(&funding_key).context("bad funding key")?;
            let seed = seed.unwrap_or_else(|| rand::rngs::OsRng.next_u64());
            info!(seed = %format!("0x{:016x}", seed), start = range.0, end = range.1, "starting txfuzz");

            let client = WsClient::connect(&rpc_url, cfg.receipt_poll()).await?;
            let fuzzer = Fuzzer::new(Arc::new(client), funder, cfg).await.context("could not set up fuzzer")?;
            let mut svc = fuzzer.fuzz(seed, &mnemonic, range.0, range.1).await?;

            let exit = tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    res?;
                    None
                }
                exit = svc.first_exit() => Some(exit),
            };

            match exit {
                None => {
                    info!("shutting down fuzzer...");
                    svc.shutdown().await;
                    info!(metrics = %METRICS.summary(), "fuzzer stopped");
                    Ok(())
                }
                Some((name, res)) => {
                    let err = match res {
                        Ok(()) => anyhow!("task {} exited unexpectedly", name),
                        Err(e) => anyhow!("task {} failed: {}", name, e),
                    };
                    error!("{}", err);
                    svc.shutdown().await;
                    info!(metrics = %METRICS.summary(), "fuzzer stopped");
                    Err(err)
                }
            }
        }
    }
}
