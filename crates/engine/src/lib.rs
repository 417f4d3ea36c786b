//! Treasury engine: transactions, their confirmation lifecycle and the
//! asynchronous on-chain notarization of confirmed transactions.

pub use bank_accounts::BankAccount;
pub use chain_logs::{ChainLog, ChainStatus};
pub use commands::{
    BankAccountCmd, ConfirmCmd, CreateTransactionCmd, RejectCmd, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use members::{Member, MemberRole};
pub use money::{AMOUNT_DECIMALS, Amount};
pub use notarization::{
    NotarizationJob, NotarizationQueue, NotarizationScheduler, NotarizationWorker, Notarizer,
};
pub use ops::{
    Balance, Engine, EngineBuilder, IncomeByMemberRow, MonthlyExpenseRow, StatusFilter,
    TopContributorRow, TransactionEntry, TreasuryDetail, YearlySummaryRow,
};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use treasury::Treasury;

mod bank_accounts;
mod chain_logs;
mod commands;
mod error;
mod members;
mod money;
mod notarization;
mod ops;
mod transactions;
mod treasury;
pub mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
