use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::error::ContractFileError;

/// Connection settings for [`ChainLedger`](crate::ChainLedger).
#[derive(Clone, Debug, Deserialize)]
pub struct LedgerSettings {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Hex signer key, with or without `0x`.
    #[serde(default)]
    pub private_key: Option<String>,
    /// JSON file holding the deployed `TreasuryLogger` address.
    #[serde(default = "default_contract_file")]
    pub contract_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            private_key: None,
            contract_file: default_contract_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_contract_file() -> PathBuf {
    PathBuf::from("contracts/TreasuryLogger.json")
}

fn default_timeout_secs() -> u64 {
    15
}

/// Deployment metadata written by the contract deploy scripts. The ABI is
/// ignored: the single call is declared with `sol!`.
#[derive(Debug, Deserialize)]
struct ContractDeployment {
    address: String,
}

pub(crate) fn load_contract(path: &Path) -> Result<Address, ContractFileError> {
    let data = std::fs::read_to_string(path).map_err(|source| ContractFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_contract(&data)
}

fn parse_contract(data: &str) -> Result<Address, ContractFileError> {
    let deployment: ContractDeployment = serde_json::from_str(data)?;
    deployment
        .address
        .parse::<Address>()
        .map_err(|err| ContractFileError::Address {
            reason: err.to_string(),
            address: deployment.address,
        })
}
