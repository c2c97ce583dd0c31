use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use tracing::{debug, info};
use crate::utils::{FuzzError, Result};

/// A derived fuzzing account. The nonce cursor lives with the worker that owns it.
#[derive(Clone, Debug)]
pub struct Account {
    pub index: u32,
    pub wallet: LocalWallet,
}

impl Account {
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Derive accounts `start..end` (end exclusive) on the default Ethereum path
/// `m/44'/60'/0'/0/<index>`. Same mnemonic and range always yield the same accounts.
pub fn derive_accounts(mnemonic: &str, start: u32, end: u32) -> Result<Vec<Account>> {
    if end <= start {
        return Err(FuzzError::KeyDerivation(format!("empty index range {}..{}", start, end)));
    }

    let mut accounts = Vec::with_capacity((end - start) as usize);
    for index in start..end {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(mnemonic)
            .index(index)
            .map_err(|e| FuzzError::KeyDerivation(format!("index {}: {}", index, e)))?
            .build()
            .map_err(|e| FuzzError::KeyDerivation(format!("index {}: {}", index, e)))?;
        debug!(index, address = ?wallet.address(), "derived account");
        accounts.push(Account { index, wallet });
    }
    info!(start, end, "derived accounts from mnemonic range");
    Ok(accounts)
}

/// Parse a hex encoded secp256k1 private key, with or without `0x`.
pub fn parse_private_key(key: &str) -> Result<LocalWallet> {
    let trimmed = key.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(stripped)
        .map_err(|e| FuzzError::KeyDerivation(format!("private key is not hex: {}", e)))?;
    LocalWallet::from_bytes(&bytes)
        .map_err(|e| FuzzError::KeyDerivation(format!("invalid private key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "test test test test test test test test test test test junk";

    #[test]
    fn test_derive_known_accounts() {
        let accounts = derive_accounts(PHRASE, 0, 2).unwrap();
        assert_eq!(accounts.len(), 2);
        let first: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        let second: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        assert_eq!(accounts[0].address(), first);
        assert_eq!(accounts[1].address(), second);
        assert_eq!(accounts[1].index, 1);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = derive_accounts(PHRASE, 3, 5).unwrap();
        let b = derive_accounts(PHRASE, 3, 5).unwrap();
        let a: Vec<Address> = a.iter().map(Account::address).collect();
        let b: Vec<Address> = b.iter().map(Account::address).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(matches!(derive_accounts(PHRASE, 4, 4), Err(FuzzError::KeyDerivation(_))));
    }

    #[test]
    fn test_parse_private_key() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let wallet = parse_private_key(key).unwrap();
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(wallet.address(), expected);
        // prefix is optional
        assert_eq!(parse_private_key(&key[2..]).unwrap().address(), expected);
        assert!(parse_private_key("0xnothex").is_err());
    }
}
