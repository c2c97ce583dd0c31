//! In-memory `ChainClient` used by unit tests. Behaves like a node's pending
//! view: a send is accepted only at the sender's pending nonce, after which the
//! nonce advances and the value is credited to the recipient.

use crate::chain::{ChainClient, HeadStream};
use crate::crypto::SignedTx;
use crate::utils::{FuzzError, Result};
use ethers::types::{Address, Block, Transaction, H256, U256, U64};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;

#[derive(Default)]
struct MockState {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    send_failures: VecDeque<FuzzError>,
    attempts: Vec<SignedTx>,
    accepted: Vec<SignedTx>,
    nonce_queries: HashMap<Address, usize>,
    blocks: HashMap<H256, Block<Transaction>>,
    waited: Vec<H256>,
}

pub struct MockChain {
    pub chain_id: u64,
    state: Mutex<MockState>,
    head_tx: mpsc::UnboundedSender<Result<Block<H256>>>,
    head_rx: Mutex<Option<HeadStream>>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        let (head_tx, head_rx) = mpsc::unbounded_channel();
        Self {
            chain_id,
            state: Mutex::new(MockState::default()),
            head_tx,
            head_rx: Mutex::new(Some(head_rx)),
        }
    }

    pub fn set_nonce(&self, addr: Address, nonce: u64) {
        self.state.lock().nonces.insert(addr, nonce);
    }

    pub fn set_balance(&self, addr: Address, balance: U256) {
        self.state.lock().balances.insert(addr, balance);
    }

    /// The next send is rejected with `err` regardless of its nonce.
    pub fn fail_next_send(&self, err: FuzzError) {
        self.state.lock().send_failures.push_back(err);
    }

    pub fn attempts(&self) -> Vec<SignedTx> {
        self.state.lock().attempts.clone()
    }

    pub fn accepted(&self) -> Vec<SignedTx> {
        self.state.lock().accepted.clone()
    }

    pub fn nonce_queries(&self, addr: Address) -> usize {
        self.state.lock().nonce_queries.get(&addr).copied().unwrap_or(0)
    }

    pub fn waited(&self) -> Vec<H256> {
        self.state.lock().waited.clone()
    }

    /// Register a full block and announce its head.
    pub fn push_block(&self, block: Block<Transaction>) {
        let hash = block.hash.unwrap_or_default();
        let head = Block::<H256> {
            hash: Some(hash),
            number: block.number,
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            base_fee_per_gas: block.base_fee_per_gas,
            ..Default::default()
        };
        self.state.lock().blocks.insert(hash, block);
        let _ = self.head_tx.send(Ok(head));
    }

    pub fn push_head_error(&self, err: FuzzError) {
        let _ = self.head_tx.send(Err(err));
    }
}

/// Build a block with the given usage figures and no transactions.
pub fn block(number: u64, gas_used: u64, gas_limit: u64, base_fee: u64) -> Block<Transaction> {
    Block {
        hash: Some(H256::from_low_u64_be(number + 1)),
        number: Some(U64::from(number)),
        gas_used: U256::from(gas_used),
        gas_limit: U256::from(gas_limit),
        base_fee_per_gas: Some(U256::from(base_fee)),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let mut st = self.state.lock();
        *st.nonce_queries.entry(address).or_insert(0) += 1;
        Ok(st.nonces.get(&address).copied().unwrap_or(0))
    }

    async fn pending_balance(&self, address: Address) -> Result<U256> {
        Ok(self.state.lock().balances.get(&address).copied().unwrap_or_default())
    }

    async fn send_transaction(&self, tx: &SignedTx) -> Result<H256> {
        let mut st = self.state.lock();
        st.attempts.push(tx.clone());
        if let Some(err) = st.send_failures.pop_front() {
            return Err(err);
        }
        let expected = st.nonces.get(&tx.from).copied().unwrap_or(0);
        if tx.nonce != expected {
            return Err(FuzzError::Send(format!("nonce mismatch: got {}, want {}", tx.nonce, expected)));
        }
        st.nonces.insert(tx.from, expected + 1);
        if let Some(to) = tx.to {
            let bal = st.balances.entry(to).or_default();
            *bal = bal.saturating_add(tx.value);
        }
        st.accepted.push(tx.clone());
        Ok(tx.hash)
    }

    async fn subscribe_new_heads(&self) -> Result<HeadStream> {
        self.head_rx
            .lock()
            .take()
            .ok_or_else(|| FuzzError::Subscription("already subscribed".into()))
    }

    async fn block_by_hash(&self, hash: H256) -> Result<Block<Transaction>> {
        self.state
            .lock()
            .blocks
            .get(&hash)
            .cloned()
            .ok_or_else(|| FuzzError::NotFound(format!("block {:?}", hash)))
    }

    async fn wait_mined(&self, hash: H256) -> Result<()> {
        self.state.lock().waited.push(hash);
        Ok(())
    }
}

/// A mined legacy transaction signed by `wallet`, as a node would return it.
pub fn signed_legacy_tx(wallet: &ethers::signers::LocalWallet, nonce: u64, chain_id: u64) -> Transaction {
    use ethers::signers::Signer;
    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::TransactionRequest;

    let wallet = wallet.clone().with_chain_id(chain_id);
    let to = Address::repeat_byte(0x22);
    let typed: TypedTransaction = TransactionRequest::new()
        .to(to)
        .nonce(nonce)
        .value(5u64)
        .gas(21_000u64)
        .gas_price(2u64)
        .chain_id(chain_id)
        .into();
    let sig = wallet.sign_transaction_sync(&typed).expect("sign");
    Transaction {
        nonce: U256::from(nonce),
        to: Some(to),
        value: U256::from(5u64),
        gas: U256::from(21_000u64),
        gas_price: Some(U256::from(2u64)),
        chain_id: Some(U256::from(chain_id)),
        v: U64::from(sig.v),
        r: sig.r,
        s: sig.s,
        ..Default::default()
    }
}
