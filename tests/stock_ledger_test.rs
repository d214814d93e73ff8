mod common;

use assert_matches::assert_matches;
use common::TestApp;
use proptest::prelude::*;
use sarpras_api::entities::stock_transaction::StockMovement;
use sarpras_api::errors::ServiceError;
use sarpras_api::services::stock_ledger::NewStockItem;
use uuid::Uuid;

fn paper_item() -> NewStockItem {
    NewStockItem {
        name: "Kertas A4".to_string(),
        unit: "rim".to_string(),
        min_stock: 5,
    }
}

#[tokio::test]
async fn movements_update_the_cached_quantity() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let item = svc.create_item(paper_item()).await.expect("create item");
    assert_eq!(item.quantity, 0);

    let (_, qty) = svc
        .apply_transaction(item.id, StockMovement::In, 20, Some("dropship".into()), actor)
        .await
        .expect("stock in");
    assert_eq!(qty, 20);

    let (row, qty) = svc
        .apply_transaction(item.id, StockMovement::Out, 5, None, actor)
        .await
        .expect("stock out");
    assert_eq!(qty, 15);
    assert_eq!(row.kind, "OUT");
    assert_eq!(row.quantity, 5);

    let stored = svc.get_item(item.id).await.expect("reload item");
    assert_eq!(stored.quantity, 15);

    let history = svc.history(item.id).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, "IN");
    assert_eq!(history[1].kind, "OUT");
}

#[tokio::test]
async fn overdraw_fails_and_changes_nothing() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let item = svc.create_item(paper_item()).await.expect("create item");
    svc.apply_transaction(item.id, StockMovement::In, 15, None, actor)
        .await
        .expect("seed stock");

    let err = svc
        .apply_transaction(item.id, StockMovement::Out, 100, None, actor)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Neither the cache nor the ledger moved.
    let stored = svc.get_item(item.id).await.expect("reload item");
    assert_eq!(stored.quantity, 15);
    assert_eq!(svc.history(item.id).await.expect("history").len(), 1);
}

#[tokio::test]
async fn non_positive_quantities_are_rejected_before_any_write() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let item = svc.create_item(paper_item()).await.expect("create item");

    for qty in [0, -3] {
        let err = svc
            .apply_transaction(item.id, StockMovement::In, qty, None, actor)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    assert!(svc.history(item.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;

    let err = svc
        .apply_transaction(Uuid::new_v4(), StockMovement::In, 1, None, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = svc.history(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn concurrent_withdrawals_never_oversell() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let item = svc.create_item(paper_item()).await.expect("create item");
    svc.apply_transaction(item.id, StockMovement::In, 10, None, actor)
        .await
        .expect("seed stock");

    // 20 concurrent withdrawals of 1 unit each against 10 on hand.
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let svc = svc.clone();
        let id = item.id;
        tasks.push(tokio::spawn(async move {
            svc.apply_transaction(id, StockMovement::Out, 1, None, actor)
                .await
                .is_ok()
        }));
    }

    let mut succeeded = 0;
    for task in tasks {
        if task.await.expect("task join") {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10, "exactly 10 withdrawals should succeed");
    let stored = svc.get_item(item.id).await.expect("reload item");
    assert_eq!(stored.quantity, 0);
    // 1 seed IN + 10 committed OUTs; the rejected ones left no rows.
    assert_eq!(svc.history(item.id).await.expect("history").len(), 11);
}

#[tokio::test]
async fn below_min_stock_lists_items_at_or_under_threshold() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let low = svc.create_item(paper_item()).await.expect("create item");
    svc.apply_transaction(low.id, StockMovement::In, 5, None, actor)
        .await
        .expect("seed low item");

    let healthy = svc
        .create_item(NewStockItem {
            name: "Spidol".to_string(),
            unit: "pcs".to_string(),
            min_stock: 2,
        })
        .await
        .expect("create item");
    svc.apply_transaction(healthy.id, StockMovement::In, 40, None, actor)
        .await
        .expect("seed healthy item");

    let flagged = svc.below_min_stock().await.expect("below_min_stock");
    let names: Vec<_> = flagged.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Kertas A4"]);
}

#[tokio::test]
async fn purging_an_item_removes_its_ledger() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_ledger;
    let actor = Uuid::new_v4();

    let item = svc.create_item(paper_item()).await.expect("create item");
    svc.apply_transaction(item.id, StockMovement::In, 8, None, actor)
        .await
        .expect("seed stock");

    svc.purge_item(item.id).await.expect("purge item");

    assert_matches!(svc.get_item(item.id).await.unwrap_err(), ServiceError::NotFound(_));
    assert_matches!(
        svc.purge_item(item.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The cached quantity always equals the signed sum of the committed
    /// history, whatever mix of movements (including rejected overdraws)
    /// was attempted.
    #[test]
    fn cached_quantity_equals_history_sum(
        ops in proptest::collection::vec((any::<bool>(), 1..25i32), 1..12)
    ) {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let app = TestApp::new().await;
            let svc = &app.state.stock_ledger;
            let actor = Uuid::new_v4();

            let item = svc.create_item(NewStockItem {
                name: "Tinta printer".to_string(),
                unit: "botol".to_string(),
                min_stock: 0,
            })
            .await
            .expect("create item");

            for (is_in, qty) in ops {
                let movement = if is_in { StockMovement::In } else { StockMovement::Out };
                // Overdraws are expected to fail; the invariant must hold
                // either way.
                let _ = svc.apply_transaction(item.id, movement, qty, None, actor).await;
            }

            let stored = svc.get_item(item.id).await.expect("reload item");
            let history = svc.history(item.id).await.expect("history");
            let sum: i32 = history
                .iter()
                .map(|row| row.movement().expect("known movement").sign() * row.quantity)
                .sum();

            assert_eq!(stored.quantity, sum);
            assert!(stored.quantity >= 0);
        });
    }
}
