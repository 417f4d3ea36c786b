#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use ledger::{B256, Ledger, LedgerError, ResultLedger, Submission, hex_hash};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Amount, ConfirmCmd, CreateTransactionCmd, Engine, EngineError, MemberRole,
    NotarizationJob, NotarizationScheduler, ResultEngine, Transaction, TransactionKind,
};
use migration::MigratorTrait;

/// Ledger double: records submissions and fails on demand.
#[derive(Default)]
pub struct FakeLedger {
    failing: AtomicBool,
    submissions: Mutex<Vec<(String, B256)>>,
    block: Mutex<Option<u64>>,
}

impl FakeLedger {
    pub fn fail_with_network_error(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn mine_at(&self, block: u64) {
        *self.block.lock().unwrap() = Some(block);
    }

    pub fn submissions(&self) -> Vec<(String, B256)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn submit(&self, treasury_address: &str, detail_hash: B256) -> ResultLedger<Submission> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::Network("connection refused".to_string()));
        }
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push((treasury_address.to_string(), detail_hash));
        Ok(Submission {
            tx_hash: format!("0x{:064x}", submissions.len()),
            detail_hash: hex_hash(detail_hash),
        })
    }

    async fn block_number(&self, _tx_hash: &str) -> ResultLedger<Option<u64>> {
        Ok(*self.block.lock().unwrap())
    }
}

/// Scheduler double: keeps jobs until the test runs them.
#[derive(Default)]
pub struct RecordingScheduler {
    jobs: Mutex<Vec<NotarizationJob>>,
    refusing: AtomicBool,
}

impl RecordingScheduler {
    pub fn refuse(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }

    pub fn take(&self) -> Vec<NotarizationJob> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

impl NotarizationScheduler for RecordingScheduler {
    fn schedule(&self, job: NotarizationJob) -> ResultEngine<()> {
        if self.refusing.load(Ordering::SeqCst) {
            return Err(EngineError::InvalidState("queue closed".to_string()));
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub ledger: Arc<FakeLedger>,
    pub scheduler: Arc<RecordingScheduler>,
}

pub const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

pub async fn harness() -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in USERS {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }

    let ledger = Arc::new(FakeLedger::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let engine = Engine::builder()
        .database(db.clone())
        .ledger(ledger.clone())
        .scheduler(scheduler.clone())
        .build()
        .await
        .unwrap();

    Harness {
        engine,
        db,
        ledger,
        scheduler,
    }
}

pub fn amount(text: &str) -> Amount {
    text.parse().unwrap()
}

impl Harness {
    /// A treasury administered by alice, with bob as treasurer and carol as
    /// plain member. dave stays outside.
    pub async fn treasury(&self) -> Uuid {
        let treasury = self
            .engine
            .create_treasury("alice", "Club", Some("monthly dues"))
            .await
            .unwrap();
        self.engine
            .add_member(treasury.id, "alice", "bob", MemberRole::Treasurer)
            .await
            .unwrap();
        self.engine
            .add_member(treasury.id, "alice", "carol", MemberRole::Member)
            .await
            .unwrap();
        treasury.id
    }

    pub async fn create(
        &self,
        treasury_id: Uuid,
        actor: &str,
        kind: TransactionKind,
        value: &str,
    ) -> Transaction {
        self.engine
            .create_transaction(
                treasury_id,
                actor,
                CreateTransactionCmd::new(kind, amount(value)),
            )
            .await
            .unwrap()
    }

    pub async fn confirm(&self, treasury_id: Uuid, transaction_id: Uuid, value: &str) -> Transaction {
        self.engine
            .confirm_transaction(
                treasury_id,
                transaction_id,
                "bob",
                ConfirmCmd::new(amount(value)),
            )
            .await
            .unwrap()
    }

    pub async fn chain_log_count(&self) -> i64 {
        let row = self
            .db
            .query_one(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT COUNT(*) AS count FROM chain_logs",
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get("", "count").unwrap()
    }

    /// Runs every scheduled job inline.
    pub async fn drain(&self) {
        let notarizer = self.engine.notarizer();
        for job in self.scheduler.take() {
            notarizer.run(job).await.unwrap();
        }
    }
}
