//! alloy-backed ledger talking to a `TreasuryLogger` contract over JSON-RPC.

use std::{str::FromStr, time::Duration};

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, B256, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol,
    sol_types::SolCall,
};
use tokio::time::timeout;

use crate::{
    Ledger, LedgerError, LedgerSettings, ResultLedger, Submission, hex_hash,
    settings::load_contract,
};

sol! {
    function logTransaction(address treasury, bytes32 detailHash) external;
}

/// The call only emits an event.
const GAS_LIMIT: u64 = 50_000;

pub struct ChainLedger {
    provider: Option<DynProvider>,
    contract: Option<Address>,
    /// Why `submit` is unavailable when `contract` is `None`.
    reason: String,
    timeout: Duration,
}

impl ChainLedger {
    /// Connects to the configured node.
    ///
    /// A missing or invalid key and an unparsable RPC URL are errors. Missing
    /// contract metadata is not: the client comes up degraded and `submit`
    /// fails with [`LedgerError::NotConfigured`].
    pub async fn connect(settings: &LedgerSettings) -> ResultLedger<Self> {
        let key = settings
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LedgerError::Signing("private key not set".to_string()))?;
        let key_hex = key.strip_prefix("0x").unwrap_or(key);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|err| LedgerError::Signing(format!("invalid private key: {err}")))?;
        let sender = signer.address();

        let url: url::Url = settings.rpc_url.parse().map_err(|err| {
            LedgerError::Network(format!("invalid RPC URL '{}': {err}", settings.rpc_url))
        })?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        let timeout_duration = Duration::from_secs(settings.timeout_secs);

        // The node may come up later; only the submissions will fail.
        match timeout(timeout_duration, provider.get_chain_id()).await {
            Ok(Ok(chain_id)) => tracing::info!(
                rpc_url = %settings.rpc_url,
                chain_id,
                sender = %sender,
                "Ledger connected"
            ),
            Ok(Err(err)) => tracing::warn!(
                rpc_url = %settings.rpc_url,
                error = %err,
                "Ledger node did not answer the chain id probe"
            ),
            Err(_) => tracing::warn!(
                rpc_url = %settings.rpc_url,
                "Ledger node timed out on the chain id probe"
            ),
        }

        let (contract, reason) = match load_contract(&settings.contract_file) {
            Ok(address) => {
                tracing::info!(contract = %address, "Contract metadata loaded");
                (Some(address), String::new())
            }
            Err(err) => {
                tracing::warn!(reason = %err, "Contract not loaded, notarization disabled");
                (None, err.to_string())
            }
        };

        Ok(Self {
            provider: Some(provider),
            contract,
            reason,
            timeout: timeout_duration,
        })
    }

    /// A ledger with no node behind it. Every remote call fails with
    /// [`LedgerError::NotConfigured`]; address generation still works.
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            provider: None,
            contract: None,
            reason: reason.into(),
            timeout: Duration::ZERO,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_some() && self.contract.is_some()
    }

    fn not_configured(&self) -> LedgerError {
        LedgerError::NotConfigured(self.reason.clone())
    }

    fn timed_out(&self, what: &str) -> LedgerError {
        LedgerError::Network(format!(
            "{what} timed out after {}s",
            self.timeout.as_secs()
        ))
    }
}

#[async_trait::async_trait]
impl Ledger for ChainLedger {
    async fn submit(&self, treasury_address: &str, detail_hash: B256) -> ResultLedger<Submission> {
        let (Some(provider), Some(contract)) = (&self.provider, self.contract) else {
            return Err(self.not_configured());
        };
        let treasury = Address::from_str(treasury_address).map_err(|err| {
            LedgerError::Contract(format!("invalid treasury address {treasury_address}: {err}"))
        })?;

        let call = logTransactionCall {
            treasury,
            detailHash: detail_hash,
        };
        let request = TransactionRequest::default()
            .with_to(contract)
            .with_input(call.abi_encode())
            .with_gas_limit(GAS_LIMIT);

        let pending = match timeout(self.timeout, provider.send_transaction(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(self.timed_out("submission")),
        };
        let tx_hash = *pending.tx_hash();

        tracing::debug!(tx_hash = %tx_hash, treasury = %treasury, "Notarization submitted");
        Ok(Submission {
            tx_hash: hex_hash(tx_hash),
            detail_hash: hex_hash(detail_hash),
        })
    }

    async fn block_number(&self, tx_hash: &str) -> ResultLedger<Option<u64>> {
        let Some(provider) = &self.provider else {
            return Err(self.not_configured());
        };
        let hash = TxHash::from_str(tx_hash)
            .map_err(|err| LedgerError::Contract(format!("invalid tx hash {tx_hash}: {err}")))?;

        match timeout(self.timeout, provider.get_transaction_receipt(hash)).await {
            Ok(result) => Ok(result?.and_then(|receipt| receipt.block_number)),
            Err(_) => Err(self.timed_out("receipt lookup")),
        }
    }
}
