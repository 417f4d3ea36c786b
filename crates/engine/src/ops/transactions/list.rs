use std::str::FromStr;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ChainLog, EngineError, ResultEngine, Transaction, TransactionStatus, chain_logs, transactions,
};

use super::super::{Engine, with_tx};

/// Which statuses a listing returns.
///
/// Parsed from the `status` query text: `"all"` keeps everything, an empty
/// text hides deleted transactions, anything else is a comma-separated
/// allow-list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    #[default]
    Active,
    Only(Vec<TransactionStatus>),
}

impl FromStr for StatusFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Active);
        }
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let statuses = trimmed
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(TransactionStatus::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        if statuses.is_empty() {
            return Err(EngineError::Validation(format!(
                "invalid status filter: {s}"
            )));
        }
        Ok(Self::Only(statuses))
    }
}

/// A transaction together with its notarization record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub transaction: Transaction,
    pub chain_log: Option<ChainLog>,
}

impl TryFrom<(transactions::Model, Option<chain_logs::Model>)> for TransactionEntry {
    type Error = EngineError;

    fn try_from(
        (transaction, chain_log): (transactions::Model, Option<chain_logs::Model>),
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction: Transaction::try_from(transaction)?,
            chain_log: chain_log.map(ChainLog::try_from).transpose()?,
        })
    }
}

impl Engine {
    /// Lists the transactions of a treasury, newest first.
    pub async fn list_transactions(
        &self,
        treasury_id: Uuid,
        actor: &str,
        filter: &StatusFilter,
    ) -> ResultEngine<Vec<TransactionEntry>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::TreasuryId.eq(treasury_id.to_string()));
            match filter {
                StatusFilter::All => {}
                StatusFilter::Active => {
                    query = query.filter(
                        transactions::Column::Status.ne(TransactionStatus::Deleted.as_str()),
                    );
                }
                StatusFilter::Only(statuses) => {
                    query = query.filter(
                        transactions::Column::Status.is_in(statuses.iter().map(|s| s.as_str())),
                    );
                }
            }

            let rows = query
                .find_also_related(chain_logs::Entity)
                .order_by_desc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            rows.into_iter()
                .map(TransactionEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn transaction(
        &self,
        treasury_id: Uuid,
        transaction_id: Uuid,
        actor: &str,
    ) -> ResultEngine<TransactionEntry> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, treasury_id, actor).await?;
            let model = self
                .find_transaction(&db_tx, treasury_id, transaction_id)
                .await?;
            let chain_log = chain_logs::Entity::find()
                .filter(chain_logs::Column::TransactionId.eq(model.id.clone()))
                .one(&db_tx)
                .await?;
            TransactionEntry::try_from((model, chain_log))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_hides_deleted() {
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
        assert_eq!("  ".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
    }

    #[test]
    fn all_keeps_everything() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
    }

    #[test]
    fn comma_list_restricts_statuses() {
        assert_eq!(
            "pending, rejected".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(vec![TransactionStatus::Pending, TransactionStatus::Rejected])
        );
        assert_eq!(
            "deleted".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(vec![TransactionStatus::Deleted])
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(matches!(
            "pending,completed".parse::<StatusFilter>(),
            Err(EngineError::Validation(_))
        ));
        assert!(",".parse::<StatusFilter>().is_err());
    }
}
