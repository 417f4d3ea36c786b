mod common;

use engine::{
    ChainStatus, ConfirmCmd, CreateTransactionCmd, EngineError, RejectCmd, StatusFilter,
    TransactionKind, TransactionStatus, UpdateTransactionCmd,
};
use uuid::Uuid;

use common::{amount, harness};

#[tokio::test]
async fn create_starts_pending_without_confirmation() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let tx = h
        .engine
        .create_transaction(
            treasury_id,
            "carol",
            CreateTransactionCmd::new(TransactionKind::Income, amount("100.00")).note("  dues  "),
        )
        .await
        .unwrap();

    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.created_by, "carol");
    assert_eq!(tx.note.as_deref(), Some("dues"));
    assert!(tx.confirmed_amount.is_none());
    assert!(tx.confirmed_by.is_none());
    assert!(tx.confirmed_at.is_none());

    let entry = h.engine.transaction(treasury_id, tx.id, "carol").await.unwrap();
    assert_eq!(entry.transaction, tx);
    assert!(entry.chain_log.is_none());
}

#[tokio::test]
async fn create_validates_amount_membership_and_treasury() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let err = h
        .engine
        .create_transaction(
            treasury_id,
            "carol",
            CreateTransactionCmd::new(TransactionKind::Expense, amount("0")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = h
        .engine
        .create_transaction(
            treasury_id,
            "dave",
            CreateTransactionCmd::new(TransactionKind::Expense, amount("1")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h
        .engine
        .create_transaction(
            Uuid::new_v4(),
            "alice",
            CreateTransactionCmd::new(TransactionKind::Expense, amount("1")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn confirm_uses_confirmed_amount_and_opens_chain_log() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Income, "100.00")
        .await;

    let confirmed = h
        .engine
        .confirm_transaction(
            treasury_id,
            tx.id,
            "bob",
            ConfirmCmd::new(amount("95.00")).note("paid in cash"),
        )
        .await
        .unwrap();

    assert_eq!(confirmed.status, TransactionStatus::Confirmed);
    assert_eq!(confirmed.confirmed_amount, Some(amount("95.00")));
    assert_eq!(confirmed.confirmed_by.as_deref(), Some("bob"));
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(confirmed.note.as_deref(), Some("paid in cash"));
    assert_eq!(confirmed.amount, amount("100.00"));

    let balance = h.engine.balance(treasury_id, "carol").await.unwrap();
    assert_eq!(balance.total_income, amount("95"));
    assert_eq!(balance.balance, amount("95"));

    let log = h.engine.chain_log(treasury_id, tx.id, "carol").await.unwrap();
    assert!(matches!(log.status, ChainStatus::None | ChainStatus::Pending));
    assert_eq!(h.chain_log_count().await, 1);
}

#[tokio::test]
async fn confirm_requires_reviewer_role() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Income, "10")
        .await;

    let err = h
        .engine
        .confirm_transaction(treasury_id, tx.id, "carol", ConfirmCmd::new(amount("10")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h
        .engine
        .confirm_transaction(treasury_id, tx.id, "bob", ConfirmCmd::new(amount("-1")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // alice is admin and may confirm too
    h.engine
        .confirm_transaction(treasury_id, tx.id, "alice", ConfirmCmd::new(amount("10")))
        .await
        .unwrap();
}

#[tokio::test]
async fn confirm_on_non_pending_mutates_nothing() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let confirmed = h
        .create(treasury_id, "carol", TransactionKind::Income, "10")
        .await;
    let confirmed = h.confirm(treasury_id, confirmed.id, "9").await;

    let rejected = h
        .create(treasury_id, "carol", TransactionKind::Expense, "5")
        .await;
    h.engine
        .reject_transaction(treasury_id, rejected.id, "bob", RejectCmd::new("no receipt"))
        .await
        .unwrap();

    let deleted = h
        .create(treasury_id, "carol", TransactionKind::Expense, "7")
        .await;
    h.engine
        .delete_transaction(treasury_id, deleted.id, "carol")
        .await
        .unwrap();

    for id in [confirmed.id, rejected.id, deleted.id] {
        let before = h.engine.transaction(treasury_id, id, "alice").await.unwrap();
        let logs_before = h.chain_log_count().await;

        let err = h
            .engine
            .confirm_transaction(treasury_id, id, "bob", ConfirmCmd::new(amount("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));

        let after = h.engine.transaction(treasury_id, id, "alice").await.unwrap();
        assert_eq!(before, after);
        assert_eq!(logs_before, h.chain_log_count().await);
    }
}

#[tokio::test]
async fn reject_requires_reason_and_pending_status() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Expense, "20")
        .await;

    let err = h
        .engine
        .reject_transaction(treasury_id, tx.id, "bob", RejectCmd::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = h
        .engine
        .reject_transaction(treasury_id, tx.id, "carol", RejectCmd::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let rejected = h
        .engine
        .reject_transaction(treasury_id, tx.id, "bob", RejectCmd::new("duplicate"))
        .await
        .unwrap();
    assert_eq!(rejected.status, TransactionStatus::Rejected);
    assert_eq!(rejected.reject_reason.as_deref(), Some("duplicate"));

    let err = h
        .engine
        .reject_transaction(treasury_id, tx.id, "bob", RejectCmd::new("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn update_of_rejected_returns_to_pending() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Expense, "20")
        .await;
    h.engine
        .reject_transaction(treasury_id, tx.id, "bob", RejectCmd::new("wrong amount"))
        .await
        .unwrap();

    let err = h
        .engine
        .update_transaction(treasury_id, tx.id, "bob", UpdateTransactionCmd::new(amount("25")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let updated = h
        .engine
        .update_transaction(
            treasury_id,
            tx.id,
            "carol",
            UpdateTransactionCmd::new(amount("25")).note("taxi"),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, TransactionStatus::Pending);
    assert!(updated.reject_reason.is_none());
    assert_eq!(updated.amount, amount("25"));
    assert_eq!(updated.note.as_deref(), Some("taxi"));
    assert_eq!(updated.created_at, tx.created_at);
    assert_eq!(updated.kind, tx.kind);
}

#[tokio::test]
async fn update_of_confirmed_is_invalid_state() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Income, "20")
        .await;
    h.confirm(treasury_id, tx.id, "20").await;

    let err = h
        .engine
        .update_transaction(treasury_id, tx.id, "carol", UpdateTransactionCmd::new(amount("1")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn delete_is_soft_and_refused_once_confirmed() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let pending = h
        .create(treasury_id, "carol", TransactionKind::Expense, "3")
        .await;
    let rejected = h
        .create(treasury_id, "carol", TransactionKind::Expense, "4")
        .await;
    h.engine
        .reject_transaction(treasury_id, rejected.id, "bob", RejectCmd::new("dup"))
        .await
        .unwrap();
    let confirmed = h
        .create(treasury_id, "carol", TransactionKind::Income, "5")
        .await;
    h.confirm(treasury_id, confirmed.id, "5").await;

    // bob is neither creator nor admin
    let err = h
        .engine
        .delete_transaction(treasury_id, pending.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    h.engine
        .delete_transaction(treasury_id, pending.id, "carol")
        .await
        .unwrap();
    h.engine
        .delete_transaction(treasury_id, rejected.id, "alice")
        .await
        .unwrap();

    for id in [pending.id, rejected.id] {
        let entry = h.engine.transaction(treasury_id, id, "carol").await.unwrap();
        assert_eq!(entry.transaction.status, TransactionStatus::Deleted);
    }

    let err = h
        .engine
        .delete_transaction(treasury_id, confirmed.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = h
        .engine
        .delete_transaction(treasury_id, pending.id, "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn list_applies_status_filter_newest_first() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let first = h
        .create(treasury_id, "carol", TransactionKind::Income, "1")
        .await;
    let second = h
        .create(treasury_id, "carol", TransactionKind::Income, "2")
        .await;
    let third = h
        .create(treasury_id, "carol", TransactionKind::Expense, "3")
        .await;
    h.confirm(treasury_id, first.id, "1").await;
    h.engine
        .delete_transaction(treasury_id, third.id, "carol")
        .await
        .unwrap();

    let active = h
        .engine
        .list_transactions(treasury_id, "carol", &StatusFilter::Active)
        .await
        .unwrap();
    let ids: Vec<Uuid> = active.iter().map(|e| e.transaction.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(active[0].chain_log.is_none());
    assert!(active[1].chain_log.is_some());

    let all = h
        .engine
        .list_transactions(treasury_id, "carol", &StatusFilter::All)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].transaction.id, third.id);

    let only: StatusFilter = "deleted,confirmed".parse().unwrap();
    let only = h
        .engine
        .list_transactions(treasury_id, "carol", &only)
        .await
        .unwrap();
    let ids: Vec<Uuid> = only.iter().map(|e| e.transaction.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);

    let err = h
        .engine
        .list_transactions(treasury_id, "dave", &StatusFilter::All)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn list_of_empty_treasury_is_empty() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let entries = h
        .engine
        .list_transactions(treasury_id, "alice", &StatusFilter::Active)
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn transaction_of_other_treasury_is_not_found() {
    let h = harness().await;
    let treasury_id = h.treasury().await;
    let other = h
        .engine
        .create_treasury("alice", "Other", None)
        .await
        .unwrap();
    let tx = h
        .create(treasury_id, "carol", TransactionKind::Income, "1")
        .await;

    let err = h
        .engine
        .transaction(other.id, tx.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = h
        .engine
        .confirm_transaction(other.id, tx.id, "alice", ConfirmCmd::new(amount("1")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn balance_ignores_unconfirmed_and_chain_status() {
    let h = harness().await;
    let treasury_id = h.treasury().await;

    let income = h
        .create(treasury_id, "carol", TransactionKind::Income, "100")
        .await;
    let expense = h
        .create(treasury_id, "carol", TransactionKind::Expense, "30")
        .await;
    h.create(treasury_id, "carol", TransactionKind::Income, "1000")
        .await;

    h.confirm(treasury_id, income.id, "95").await;
    h.confirm(treasury_id, expense.id, "30.5").await;

    let before = h.engine.balance(treasury_id, "carol").await.unwrap();
    assert_eq!(before.total_income, amount("95"));
    assert_eq!(before.total_expense, amount("30.5"));
    assert_eq!(before.balance, amount("64.5"));

    // one notarization succeeds, the other fails
    let mut jobs = h.scheduler.take().into_iter();
    let notarizer = h.engine.notarizer();
    notarizer.run(jobs.next().unwrap()).await.unwrap();
    h.ledger.fail_with_network_error(true);
    notarizer.run(jobs.next().unwrap()).await.unwrap();

    let after = h.engine.balance(treasury_id, "carol").await.unwrap();
    assert_eq!(before, after);
}
