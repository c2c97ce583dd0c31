use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Transaction, H256, U256};
use ethers::utils::keccak256;
use crate::utils::{FuzzError, Result};

/// A signed, RLP-encoded transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub hash: H256,
    pub from: Address,
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub raw: Bytes,
}

/// Sign `tx` for `chain_id` with `wallet`.
pub fn sign_transaction(tx: &TypedTransaction, wallet: &LocalWallet, chain_id: u64) -> Result<SignedTx> {
    let mut tx = tx.clone();
    tx.set_chain_id(chain_id);
    tx.set_from(wallet.address());

    let wallet = wallet.clone().with_chain_id(chain_id);
    let signature = wallet
        .sign_transaction_sync(&tx)
        .map_err(|e| FuzzError::Signing(e.to_string()))?;
    let raw = tx.rlp_signed(&signature);

    Ok(SignedTx {
        hash: H256::from(keccak256(&raw)),
        from: wallet.address(),
        nonce: tx.nonce().map(|n| n.as_u64()).unwrap_or_default(),
        to: tx.to_addr().copied(),
        value: tx.value().copied().unwrap_or_default(),
        raw,
    })
}

/// Recover the sender of a mined transaction from its signature.
pub fn recover_sender(tx: &Transaction) -> Result<Address> {
    tx.recover_from().map_err(|e| FuzzError::Signing(e.to_string()))
}
