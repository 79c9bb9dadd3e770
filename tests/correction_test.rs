use chrono::Utc;
use order_desk::clients::mock::MockOrderService;
use order_desk::correction::{CorrectionCoordinator, CorrectionError, StatusChange};
use order_desk::lifecycle::{OrderDesk, Settings};
use order_desk::model::{Item, Order, OrderId, OrderStatus, OrgId, StatusFilter};
use order_desk::search;
use order_desk::sync::RefreshMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn flour_order() -> Order {
    Order {
        customer_name: Some("Asha".into()),
        raw_text: Some("2kg flour pls".into()),
        items: vec![Item::canonical(2.0, Some("kg"), "flour")],
        ..Order::new("A", Utc::now())
    }
}

fn settings() -> Settings {
    Settings {
        poll_interval_secs: 3600,
        ..Settings::default()
    }
}

/// Full path: snapshot, human correction, server answer, soft resync.
#[tokio::test]
async fn test_correction_end_to_end() {
    let mock = MockOrderService::new();
    let original = flour_order();
    let corrected = Order {
        items: vec![
            Item::canonical(3.0, Some("kg"), "flour"),
            Item::canonical(1.0, None, "bread"),
        ],
        parse_reason: Some("human_fix".into()),
        ..original.clone()
    };
    mock.expect_list().return_ok(vec![original.clone()]);
    mock.expect_apply_correction().return_ok(corrected.clone());
    mock.expect_list().return_ok(vec![corrected.clone()]);

    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );
    let mut states = desk.sync.subscribe();
    timeout(Duration::from_secs(5), states.wait_for(|s| s.snapshot.version == 1))
        .await
        .expect("initial load never landed")
        .unwrap();
    assert_eq!(desk.sync.current().snapshot.get(&OrderId::from("A")), Some(&original));

    // the editor is prefilled from the current items
    assert_eq!(original.correction_draft(), "2 kg flour");

    let returned = desk
        .coordinator
        .submit(&OrderId::from("A"), "3 kg flour\n1 bread", None)
        .await
        .unwrap();
    assert_eq!(returned, corrected);

    let sent = mock.corrections();
    assert_eq!(
        sent[0].items,
        vec![
            Item::canonical(3.0, Some("kg"), "flour"),
            Item::canonical(1.0, None, "bread"),
        ]
    );

    // the soft resync brings the server's version into the snapshot
    timeout(Duration::from_secs(5), async {
        loop {
            if states.borrow_and_update().snapshot.get(&OrderId::from("A")) == Some(&corrected) {
                break;
            }
            states.changed().await.unwrap();
        }
    })
    .await
    .expect("corrected order never arrived");

    let state = desk.sync.current();
    assert_eq!(search::filter(&state.snapshot, "bread").len(), 1);
    assert_eq!(state.snapshot.orders()[0].items_display(), "3 kg flour · 1 bread");
    assert_eq!(mock.list_calls(), 2);
    mock.verify();

    desk.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_same_status_never_reaches_the_sink() {
    let mock = MockOrderService::new().with_orders(vec![Order {
        status: OrderStatus::Shipped,
        ..flour_order()
    }]);
    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );
    desk.sync.refresh(RefreshMode::Hard).await.unwrap();
    let version = desk.sync.current().snapshot.version;

    let change = desk
        .coordinator
        .set_status(&OrderId::from("A"), OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(change, StatusChange::Unchanged);
    assert!(mock.status_calls().is_empty());
    assert_eq!(desk.sync.current().snapshot.version, version);

    desk.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_empty_correction_is_rejected_before_any_call() {
    let mock = MockOrderService::new().with_orders(vec![flour_order()]);
    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );
    desk.sync.refresh(RefreshMode::Hard).await.unwrap();
    let lists = mock.list_calls();

    let err = desk
        .coordinator
        .submit(&OrderId::from("A"), "\n   \n", Some("typo"))
        .await
        .unwrap_err();
    assert_eq!(err, CorrectionError::ParseEmpty);
    assert!(mock.corrections().is_empty());
    assert_eq!(mock.list_calls(), lists);

    desk.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_coordinator_after_shutdown_still_commits() {
    let mock = MockOrderService::new().with_orders(vec![flour_order()]);
    mock.expect_apply_correction().return_ok(flour_order());
    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );
    let coordinator: CorrectionCoordinator = desk.coordinator.clone();
    desk.shutdown().await.unwrap();

    // the resync trigger fails quietly; the correction itself went through
    let order = coordinator
        .submit(&OrderId::from("A"), "2 kg flour", None)
        .await
        .unwrap();
    assert_eq!(order.id, OrderId::from("A"));
    assert_eq!(mock.corrections().len(), 1);
}

#[tokio::test]
async fn test_initial_load_waits_without_a_second_fetch() {
    let mock = MockOrderService::new().with_orders(vec![flour_order()]);
    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );

    let state = timeout(Duration::from_secs(5), desk.initial_load())
        .await
        .expect("initial load never landed")
        .unwrap();
    assert!(state.snapshot.fetched_at.is_some());
    assert_eq!(state.snapshot.len(), 1);
    assert_eq!(mock.list_calls(), 1);

    desk.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_initial_load_reports_a_failed_first_fetch() {
    let mock = MockOrderService::new();
    mock.expect_list()
        .return_err(order_desk::clients::TransportError::Unavailable("down".into()));
    let desk = OrderDesk::start(
        OrgId::from("org_1"),
        Arc::new(mock.clone()),
        StatusFilter::All,
        &settings(),
    );

    let state = timeout(Duration::from_secs(5), desk.initial_load())
        .await
        .expect("initial load never settled")
        .unwrap();
    assert!(state.snapshot.fetched_at.is_none());
    assert!(state.last_error.as_deref().unwrap().contains("down"));

    desk.shutdown().await.unwrap();
}
