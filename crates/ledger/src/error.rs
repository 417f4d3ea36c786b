//! Errors raised by the ledger client.
use std::path::PathBuf;

use alloy::transports::{RpcError, TransportErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The node could not be reached, or the call timed out.
    #[error("Network error: {0}")]
    Network(String),
    /// The signer key is missing or unusable.
    #[error("Signing error: {0}")]
    Signing(String),
    /// The node rejected the call.
    #[error("Contract error: {0}")]
    Contract(String),
    /// Contract metadata was not loaded at startup.
    #[error("Ledger not configured: {0}")]
    NotConfigured(String),
}

/// Why the contract deployment file could not be used.
#[derive(Error, Debug)]
pub enum ContractFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse contract file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid contract address {address}: {reason}")]
    Address { address: String, reason: String },
}

impl From<RpcError<TransportErrorKind>> for LedgerError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::Contract(payload.to_string()),
            // Raised by the fillers before anything is sent: signer and
            // missing transaction fields.
            RpcError::LocalUsageError(inner) => Self::Signing(inner.to_string()),
            other => Self::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_network_errors() {
        let err = TransportErrorKind::custom_str("connection refused");
        assert!(matches!(LedgerError::from(err), LedgerError::Network(_)));
    }

    #[test]
    fn local_usage_failures_are_signing_errors() {
        let err = RpcError::<TransportErrorKind>::local_usage_str("no signer for sender");
        assert!(matches!(LedgerError::from(err), LedgerError::Signing(_)));
    }
}
