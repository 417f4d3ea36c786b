//! Detail hash over the immutable facts of a transaction.
//!
//! The preimage is `id|KIND|amount|note|created_at` where `amount` is rendered
//! with exactly 8 decimals and `created_at` as RFC 3339 UTC with microseconds.
//! Anyone holding the stored row can recompute the hash and compare it with
//! the value anchored on-chain.

use alloy::primitives::{B256, keccak256};
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Clone, Copy, Debug)]
pub struct DetailFacts<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    /// Confirmed amount when present, otherwise the requested one.
    pub amount: &'a str,
    /// Empty when the transaction has no note.
    pub note: &'a str,
    pub created_at: DateTime<Utc>,
}

impl DetailFacts<'_> {
    pub fn preimage(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.id,
            self.kind,
            self.amount,
            self.note,
            self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
        )
    }
}

pub fn detail_hash(facts: &DetailFacts<'_>) -> B256 {
    keccak256(facts.preimage().as_bytes())
}
