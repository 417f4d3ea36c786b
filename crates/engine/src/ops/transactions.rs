//! Transaction lifecycle operations.
//!
//! Every precondition (membership, role, ownership, status) is checked inside
//! the store transaction before the row is touched. Status changes are
//! additionally guarded by a conditional update on the current status, so a
//! concurrent transition turns into `InvalidState` instead of a double write.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, TransactionStatus, transactions};

mod list;
mod write;

pub use list::{StatusFilter, TransactionEntry};

/// Applies `changes` only while the row is still in one of `from`.
async fn transition<C: ConnectionTrait>(
    db: &C,
    transaction_id: &str,
    from: &[TransactionStatus],
    changes: transactions::ActiveModel,
) -> ResultEngine<transactions::Model> {
    let result = transactions::Entity::update_many()
        .set(changes)
        .filter(transactions::Column::Id.eq(transaction_id))
        .filter(transactions::Column::Status.is_in(from.iter().map(|s| s.as_str())))
        .exec(db)
        .await?;
    if result.rows_affected != 1 {
        return Err(EngineError::InvalidState(
            "transaction status changed concurrently".to_string(),
        ));
    }
    transactions::Entity::find_by_id(transaction_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
}
