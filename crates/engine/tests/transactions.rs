mod common;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

use common::{balance, file_harness, harness, insert_user, open_account};
use engine::{
    AccountPatch, BalanceDrift, EngineError, MAX_AMOUNT_MINOR, NewAccount, NewTransaction,
    TransactionKind, TransactionPatch, TransactionStatus,
};

#[tokio::test]
async fn apply_moves_balance_by_signed_amount() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    h.engine
        .create_transaction(user, NewTransaction::income(account.id, 10_000))
        .await
        .unwrap();
    h.engine
        .create_transaction(
            user,
            NewTransaction::expense(account.id, 2_550).title("Groceries"),
        )
        .await
        .unwrap();

    assert_eq!(balance(&h.engine, account.id, user).await, 7_450);
}

#[tokio::test]
async fn apply_then_retract_restores_balance() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 5_000).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 100))
        .await
        .unwrap();
    assert_eq!(balance(&h.engine, account.id, user).await, 5_100);

    h.engine.delete_transaction(tx.id, user).await.unwrap();
    assert_eq!(balance(&h.engine, account.id, user).await, 5_000);
    assert!(matches!(
        h.engine.transaction(tx.id, user).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn reapply_amount_change_applies_difference() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 100))
        .await
        .unwrap();
    h.engine
        .update_transaction(tx.id, user, TransactionPatch::new().amount_minor(150))
        .await
        .unwrap();

    assert_eq!(balance(&h.engine, account.id, user).await, 150);
}

#[tokio::test]
async fn reapply_kind_flip_moves_twice_the_amount() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 1_000).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 300))
        .await
        .unwrap();
    assert_eq!(balance(&h.engine, account.id, user).await, 1_300);

    let updated = h
        .engine
        .update_transaction(
            tx.id,
            user,
            TransactionPatch::new().kind(TransactionKind::Expense),
        )
        .await
        .unwrap();
    assert_eq!(updated.kind, TransactionKind::Expense);
    assert_eq!(balance(&h.engine, account.id, user).await, 700);
}

#[tokio::test]
async fn reapply_without_amount_change_keeps_balance() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 40))
        .await
        .unwrap();
    let updated = h
        .engine
        .update_transaction(
            tx.id,
            user,
            TransactionPatch::new()
                .title("Coffee")
                .category("Food")
                .status(TransactionStatus::Pending),
        )
        .await
        .unwrap();

    assert_eq!(updated.title.as_deref(), Some("Coffee"));
    assert_eq!(updated.status, TransactionStatus::Pending);
    assert_eq!(balance(&h.engine, account.id, user).await, -40);
}

#[tokio::test]
async fn reapply_to_another_account_moves_the_effect() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let from = open_account(&h.engine, user, "001", 0).await;
    let to = open_account(&h.engine, user, "002", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(from.id, 500))
        .await
        .unwrap();
    h.engine
        .update_transaction(
            tx.id,
            user,
            TransactionPatch::new().account_id(to.id).amount_minor(200),
        )
        .await
        .unwrap();

    assert_eq!(balance(&h.engine, from.id, user).await, 0);
    assert_eq!(balance(&h.engine, to.id, user).await, 200);
}

#[tokio::test]
async fn reapply_to_unknown_account_fails_without_changes() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 500))
        .await
        .unwrap();
    let err = h
        .engine
        .update_transaction(
            tx.id,
            user,
            TransactionPatch::new().account_id(Uuid::new_v4()),
        )
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::KeyNotFound("account".to_string()));
    assert_eq!(balance(&h.engine, account.id, user).await, 500);
    assert_eq!(
        h.engine.transaction(tx.id, user).await.unwrap().account_id,
        account.id
    );
}

#[tokio::test]
async fn apply_requires_an_owned_account() {
    let h = harness().await;
    let alice = insert_user(&h.db, "alice@example.com").await;
    let bob = insert_user(&h.db, "bob@example.com").await;
    let bobs = open_account(&h.engine, bob, "001", 0).await;

    let err = h
        .engine
        .create_transaction(alice, NewTransaction::income(bobs.id, 100))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account".to_string()));

    let err = h
        .engine
        .create_transaction(alice, NewTransaction::income(Uuid::new_v4(), 100))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account".to_string()));

    assert_eq!(balance(&h.engine, bobs.id, bob).await, 0);
    assert!(h.engine.list_transactions(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    for amount in [0, -100] {
        let err = h
            .engine
            .create_transaction(user, NewTransaction::income(account.id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 100))
        .await
        .unwrap();
    let err = h
        .engine
        .update_transaction(tx.id, user, TransactionPatch::new().amount_minor(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(balance(&h.engine, account.id, user).await, 100);
}

#[tokio::test]
async fn balance_stays_within_bounds() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let err = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    h.engine
        .create_transaction(user, NewTransaction::income(account.id, MAX_AMOUNT_MINOR))
        .await
        .unwrap();
    let err = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // The rejected write rolled back and the account is still readable.
    assert_eq!(balance(&h.engine, account.id, user).await, MAX_AMOUNT_MINOR);
    assert_eq!(h.engine.list_accounts(user).await.unwrap().len(), 1);
    assert_eq!(h.engine.list_transactions(user).await.unwrap().len(), 1);
    let summary = h.engine.transaction_summary(user).await.unwrap();
    assert_eq!(summary.total_balance_minor, MAX_AMOUNT_MINOR);
    assert!(h.engine.reconcile_balances(user).await.unwrap().is_empty());

    h.engine
        .create_transaction(user, NewTransaction::expense(account.id, 10))
        .await
        .unwrap();
    assert_eq!(
        balance(&h.engine, account.id, user).await,
        MAX_AMOUNT_MINOR - 10
    );
}

#[tokio::test]
async fn account_balances_outside_bounds_are_rejected() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;

    let err = h
        .engine
        .create_account(
            user,
            NewAccount {
                account_type: "Savings".to_string(),
                branch_name: "MG Road".to_string(),
                account_number: "001".to_string(),
                bank_name: "Canara".to_string(),
                balance_minor: i64::MIN,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let account = open_account(&h.engine, user, "002", 100).await;
    let err = h
        .engine
        .update_account(
            account.id,
            user,
            AccountPatch {
                balance_minor: Some(MAX_AMOUNT_MINOR + 1),
                ..AccountPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(balance(&h.engine, account.id, user).await, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_applies_do_not_lose_updates() {
    let (h, _db_file) = file_harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;
    let account_id = account.id;
    let engine = Arc::new(h.engine);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..40 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .create_transaction(user, NewTransaction::income(account_id, 100))
                .await
        });
    }
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_err() {
            failed += 1;
        }
    }
    assert_eq!(failed, 0);

    let txs = engine.list_transactions(user).await.unwrap();
    assert_eq!(txs.len(), 40);
    let ledger: i64 = txs.iter().map(|t| t.signed_amount()).sum();
    assert_eq!(balance(&engine, account_id, user).await, ledger);
    assert_eq!(ledger, 4_000);
}

#[tokio::test]
async fn retract_with_deleted_account_still_removes_transaction() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 900))
        .await
        .unwrap();
    h.engine.delete_account(account.id, user).await.unwrap();

    // Orphaned transaction stays visible until retracted.
    assert_eq!(h.engine.list_transactions(user).await.unwrap().len(), 1);

    let removed = h.engine.delete_transaction(tx.id, user).await.unwrap();
    assert_eq!(removed.id, tx.id);
    assert!(h.engine.list_transactions(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn reapply_with_deleted_account_skips_adjustment() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 900))
        .await
        .unwrap();
    h.engine.delete_account(account.id, user).await.unwrap();

    let updated = h
        .engine
        .update_transaction(tx.id, user, TransactionPatch::new().amount_minor(1_000))
        .await
        .unwrap();
    assert_eq!(updated.amount_minor, 1_000);
}

#[tokio::test]
async fn balance_matches_ledger_after_mixed_sequence() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let salary = h
        .engine
        .create_transaction(user, NewTransaction::income(account.id, 50_000))
        .await
        .unwrap();
    let rent = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 20_000))
        .await
        .unwrap();
    let snack = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 150))
        .await
        .unwrap();
    h.engine
        .update_transaction(rent.id, user, TransactionPatch::new().amount_minor(22_000))
        .await
        .unwrap();
    h.engine.delete_transaction(snack.id, user).await.unwrap();
    h.engine
        .update_transaction(salary.id, user, TransactionPatch::new().amount_minor(55_000))
        .await
        .unwrap();

    let ledger: i64 = h
        .engine
        .list_transactions(user)
        .await
        .unwrap()
        .iter()
        .map(|t| t.signed_amount())
        .sum();
    assert_eq!(ledger, 33_000);
    assert_eq!(balance(&h.engine, account.id, user).await, ledger);
}

#[tokio::test]
async fn notifications_follow_committed_writes() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 0).await;

    let tx = h
        .engine
        .create_transaction(user, NewTransaction::expense(account.id, 1_250))
        .await
        .unwrap();
    let _ = h
        .engine
        .create_transaction(user, NewTransaction::expense(Uuid::new_v4(), 10))
        .await;
    h.engine.delete_transaction(tx.id, user).await.unwrap();

    let events = h.notifier.events();
    assert!(events.iter().all(|(event, _)| event == "notification"));
    assert_eq!(
        h.notifier.messages(),
        vec![
            "New account created: Canara (Savings)".to_string(),
            "New transaction created: expense - 12.50".to_string(),
            "Transaction deleted: expense - 12.50".to_string(),
        ]
    );
}

#[tokio::test]
async fn summary_totals_balances_and_flows() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let a = open_account(&h.engine, user, "001", 1_000).await;
    let b = open_account(&h.engine, user, "002", 2_000).await;

    h.engine
        .create_transaction(user, NewTransaction::income(a.id, 500))
        .await
        .unwrap();
    h.engine
        .create_transaction(user, NewTransaction::expense(b.id, 300))
        .await
        .unwrap();

    let summary = h.engine.transaction_summary(user).await.unwrap();
    assert_eq!(summary.total_balance_minor, 3_200);
    assert_eq!(summary.total_revenues_minor, 500);
    assert_eq!(summary.total_expenses_minor, 300);
}

#[tokio::test]
async fn reconcile_repairs_drift_once() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 1_000).await;
    h.engine
        .create_transaction(user, NewTransaction::income(account.id, 250))
        .await
        .unwrap();

    // Simulate an out-of-band write.
    let backend = h.db.get_database_backend();
    h.db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET balance_minor = ? WHERE id = ?",
        vec![9_999_i64.into(), account.id.to_string().into()],
    ))
    .await
    .unwrap();

    let drifts = h.engine.reconcile_balances(user).await.unwrap();
    assert_eq!(
        drifts,
        vec![BalanceDrift {
            account_id: account.id,
            stored_minor: 9_999,
            expected_minor: 1_250,
        }]
    );
    assert_eq!(balance(&h.engine, account.id, user).await, 1_250);
    assert!(h.engine.reconcile_balances(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_balance_edit_survives_reconcile() {
    let h = harness().await;
    let user = insert_user(&h.db, "alice@example.com").await;
    let account = open_account(&h.engine, user, "001", 1_000).await;
    h.engine
        .create_transaction(user, NewTransaction::expense(account.id, 400))
        .await
        .unwrap();

    let edited = h
        .engine
        .update_account(
            account.id,
            user,
            AccountPatch {
                balance_minor: Some(5_000),
                ..AccountPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.balance_minor, 5_000);
    assert_eq!(edited.opening_balance_minor, 5_400);

    assert!(h.engine.reconcile_balances(user).await.unwrap().is_empty());
    assert_eq!(balance(&h.engine, account.id, user).await, 5_000);
}
