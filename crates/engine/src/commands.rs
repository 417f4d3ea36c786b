//! Command structs for engine operations.
//!
//! These types carry the payload of write operations (create, confirm,
//! reject, update, bank account upsert). The treasury, the target and the
//! acting user are passed to the operation itself.

use crate::{Amount, TransactionKind};

/// Record a new income or expense.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub kind: TransactionKind,
    pub amount: Amount,
    pub note: Option<String>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(kind: TransactionKind, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Confirm a pending transaction.
///
/// `amount` is the amount actually received or paid; it may differ from the
/// requested one. A note, when given, overwrites the transaction note.
#[derive(Clone, Debug)]
pub struct ConfirmCmd {
    pub amount: Amount,
    pub note: Option<String>,
}

impl ConfirmCmd {
    #[must_use]
    pub fn new(amount: Amount) -> Self {
        Self { amount, note: None }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct RejectCmd {
    pub reason: String,
}

impl RejectCmd {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Edit a pending or rejected transaction.
///
/// The note is replaced as a whole: leaving it unset clears it.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub amount: Amount,
    pub note: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(amount: Amount) -> Self {
        Self { amount, note: None }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Create or replace the bank account of a treasury.
#[derive(Clone, Debug)]
pub struct BankAccountCmd {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub qr_code_url: Option<String>,
}

impl BankAccountCmd {
    #[must_use]
    pub fn new(
        bank_name: impl Into<String>,
        account_number: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            bank_name: bank_name.into(),
            account_number: account_number.into(),
            account_name: account_name.into(),
            qr_code_url: None,
        }
    }

    #[must_use]
    pub fn qr_code_url(mut self, url: impl Into<String>) -> Self {
        self.qr_code_url = Some(url.into());
        self
    }
}
