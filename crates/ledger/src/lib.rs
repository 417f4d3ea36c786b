//! On-chain notarization of confirmed treasury transactions.
//!
//! The crate exposes the [`Ledger`] trait consumed by the engine, the
//! alloy-backed [`ChainLedger`] implementation and the [`detail_hash`]
//! function that produces the 32-byte payload anchored on-chain.

use alloy::signers::local::PrivateKeySigner;

pub use alloy::primitives::B256;
pub use chain::ChainLedger;
pub use detail::{DetailFacts, detail_hash};
pub use error::{ContractFileError, LedgerError};
pub use settings::LedgerSettings;

mod chain;
mod detail;
mod error;
mod settings;

pub type ResultLedger<T> = Result<T, LedgerError>;

/// Outcome of a successful notarization submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Hash of the submitted chain transaction, `0x`-prefixed.
    pub tx_hash: String,
    /// The anchored detail hash, `0x`-prefixed.
    pub detail_hash: String,
}

/// Remote ledger used by the engine.
///
/// Implementations must be cheap to share behind an `Arc`.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Submits one `logTransaction(treasury, detailHash)` call and returns the
    /// resulting chain transaction hash.
    async fn submit(&self, treasury_address: &str, detail_hash: B256) -> ResultLedger<Submission>;

    /// Looks up the block a submitted transaction was mined in.
    ///
    /// Returns `Ok(None)` while the transaction is still unmined.
    async fn block_number(&self, tx_hash: &str) -> ResultLedger<Option<u64>>;

    /// Mints a dedicated address for a new treasury.
    fn generate_address(&self) -> ResultLedger<String> {
        Ok(generate_address())
    }
}

/// Generates a fresh keypair and returns its checksummed address.
///
/// The private key is dropped immediately.
pub fn generate_address() -> String {
    PrivateKeySigner::random().address().to_checksum(None)
}

/// Renders a hash as `0x`-prefixed lowercase hex.
pub fn hex_hash(hash: B256) -> String {
    alloy::hex::encode_prefixed(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use std::str::FromStr;

    #[test]
    fn generated_addresses_are_valid_and_distinct() {
        let a = generate_address();
        let b = generate_address();
        assert_ne!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 42);
        assert!(Address::from_str(&a).is_ok());
    }

    #[test]
    fn hex_hash_is_prefixed_lowercase() {
        let hash = B256::repeat_byte(0xAB);
        let rendered = hex_hash(hash);
        assert_eq!(rendered.len(), 66);
        assert!(rendered.starts_with("0xabab"));
    }
}
