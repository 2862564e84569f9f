use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use washline_core::events::RecordingEventSink;
use washline_core::identity::{Actor, ActorRole};
use washline_core::memory::InMemoryStore;
use washline_core::payment::MockPaymentGate;
use washline_core::repository::{JobRepository, OrderRepository};
use washline_domain::address::{CustomerAddress, Outlet};
use washline_domain::bypass::BypassStatus;
use washline_domain::job::{Job, JobStatus, JobType};
use washline_domain::order::{Order, OrderItem, OrderStatus, PaymentStatus};
use washline_domain::work::WorkerType;
use washline_order::machine::{CreatePickupOrder, OrderStateMachine, WorkflowRules};
use washline_order::stations::VerificationOutcome;
use washline_order::{StationError, WorkflowError};

struct Harness {
    store: Arc<InMemoryStore>,
    events: Arc<RecordingEventSink>,
    machine: OrderStateMachine,
    customer: Actor,
    driver: Actor,
    worker: Actor,
    outlet_admin: Actor,
    address_id: Uuid,
    outlet_id: Uuid,
}

/// Outlet in central Jakarta; addresses are offset north by latitude.
/// 0.04° ≈ 4.4 km (inside the 10 km radius), 0.108° ≈ 12 km (outside).
fn harness_with_address_offset(lat_offset: f64) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let events = Arc::new(RecordingEventSink::new());

    let customer = Actor::new(Uuid::new_v4(), ActorRole::Customer);
    let outlet_id = Uuid::new_v4();
    let address_id = Uuid::new_v4();

    store.seed_outlet(Outlet {
        id: outlet_id,
        name: "Washline Menteng".into(),
        lat: -6.2000,
        lng: 106.8166,
    });
    store.seed_address(CustomerAddress {
        id: address_id,
        customer_id: customer.id,
        line: "Jl. Kenanga 12".into(),
        district: "Menteng".into(),
        city: "Jakarta Pusat".into(),
        province: "DKI Jakarta".into(),
        postal_code: "10310".into(),
        lat: Some(-6.2000 + lat_offset),
        lng: Some(106.8166),
    });

    let machine = OrderStateMachine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(MockPaymentGate),
        events.clone(),
        WorkflowRules::default(),
    );

    Harness {
        store,
        events,
        machine,
        customer,
        driver: Actor::new(Uuid::new_v4(), ActorRole::Driver),
        worker: Actor::new(Uuid::new_v4(), ActorRole::Worker),
        outlet_admin: Actor::new(Uuid::new_v4(), ActorRole::OutletAdmin),
        address_id,
        outlet_id,
    }
}

fn harness() -> Harness {
    harness_with_address_offset(0.04)
}

fn catalogue() -> Vec<OrderItem> {
    vec![OrderItem::new("Shirt", 3), OrderItem::new("Pants", 2)]
}

async fn create_order(h: &Harness) -> (Order, Job) {
    h.machine
        .create_pickup_order(
            &h.customer,
            CreatePickupOrder {
                address_id: h.address_id,
                outlet_id: h.outlet_id,
                scheduled_pickup_at: Utc::now() + Duration::hours(2),
                scheduled_delivery_at: None,
                items: catalogue(),
            },
        )
        .await
        .unwrap()
}

/// Drive the pickup leg to `ArrivedAtOutlet`.
async fn run_pickup(h: &Harness, job_id: Uuid) -> Order {
    h.machine.claim_job(&h.driver, job_id).await.unwrap();
    h.machine.arrive_job(&h.driver, job_id).await.unwrap();
    h.machine.start_job(&h.driver, job_id).await.unwrap();
    let (_, order) = h
        .machine
        .complete_job(&h.driver, job_id, vec!["pickup.jpg".into()], None)
        .await
        .unwrap();
    order
}

/// Run one station start + complete with a clean count.
async fn run_station_clean(h: &Harness, order_id: Uuid, station: WorkerType) -> Order {
    let receipt = h
        .machine
        .start_station(&h.worker, order_id, station, catalogue(), None)
        .await
        .unwrap();
    assert_eq!(receipt.verification, VerificationOutcome::Verified);
    h.machine
        .complete_station(&h.worker, order_id, station, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_happy_path() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    assert_eq!(order.status, OrderStatus::WaitingForPickup);
    assert_eq!(pickup.job_type, JobType::Pickup);
    assert_eq!(pickup.status, JobStatus::Pending);

    let order = run_pickup(&h, pickup.id).await;
    assert_eq!(order.status, OrderStatus::ArrivedAtOutlet);
    assert!(order.actual_pickup_at.is_some());

    h.machine
        .record_measurement(&h.worker, order.id, 4.5)
        .await
        .unwrap();

    run_station_clean(&h, order.id, WorkerType::Washing).await;
    run_station_clean(&h, order.id, WorkerType::Ironing).await;
    let order = run_station_clean(&h, order.id, WorkerType::Packing).await;
    assert_eq!(order.status, OrderStatus::WaitingPayment);
    assert_eq!(order.payment_status, PaymentStatus::WaitingPayment);

    let order = h
        .machine
        .confirm_payment(&Actor::system(), order.id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::ReadyForDelivery);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert!(order.delivery_fee > 0);

    let delivery = h
        .store
        .list_jobs(JobStatus::Pending, Some(JobType::Delivery))
        .await
        .unwrap()
        .pop()
        .expect("delivery job created");

    h.machine.claim_job(&h.driver, delivery.id).await.unwrap();
    h.machine.start_job(&h.driver, delivery.id).await.unwrap();
    h.machine.arrive_job(&h.driver, delivery.id).await.unwrap();
    let (_, order) = h
        .machine
        .complete_job(&h.driver, delivery.id, vec!["door.jpg".into()], None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::DeliveredToCustomer);
    assert!(order.actual_delivery_at.is_some());

    let order = h
        .machine
        .confirm_delivery(&h.customer, order.id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let topics = h.events.topics_seen();
    assert!(topics.contains(&"order.created".to_string()));
    assert!(topics.contains(&"job.claimed".to_string()));
    assert!(topics.contains(&"order.status_changed".to_string()));
}

#[tokio::test]
async fn test_clean_station_needs_no_bypass() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;

    let receipt = h
        .machine
        .start_station(&h.worker, order.id, WorkerType::Washing, catalogue(), None)
        .await
        .unwrap();
    assert_eq!(receipt.verification, VerificationOutcome::Verified);

    let order = h
        .machine
        .complete_station(&h.worker, order.id, WorkerType::Washing, None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::BeingWashed);

    // Ironing is now startable — the sequence advanced.
    let receipt = h
        .machine
        .start_station(&h.worker, order.id, WorkerType::Ironing, catalogue(), None)
        .await
        .unwrap();
    assert_eq!(receipt.order.status, OrderStatus::BeingIroned);
    assert!(!h.events.topics_seen().contains(&"bypass.raised".to_string()));
}

#[tokio::test]
async fn test_mismatch_reject_then_clean_reverify() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;

    // Worker counts one shirt short.
    let short_count = vec![OrderItem::new("Shirt", 2), OrderItem::new("Pants", 2)];
    let receipt = h
        .machine
        .start_station(&h.worker, order.id, WorkerType::Washing, short_count, None)
        .await
        .unwrap();
    assert!(receipt.verification.is_mismatched());

    // Completion is blocked before any bypass exists...
    let err = h
        .machine
        .complete_station(&h.worker, order.id, WorkerType::Washing, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Station(StationError::BypassPending)
    ));

    // ...and while the request is pending.
    let bypass = h
        .machine
        .request_bypass(&h.worker, order.id, WorkerType::Washing, "one shirt missing".into())
        .await
        .unwrap();
    assert_eq!(bypass.status, BypassStatus::Pending);
    let err = h
        .machine
        .complete_station(&h.worker, order.id, WorkerType::Washing, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Station(StationError::BypassPending)
    ));

    // Rejection sends the worker back to re-verify.
    let bypass = h
        .machine
        .resolve_bypass(&h.outlet_admin, bypass.id, false, "recount needed".into())
        .await
        .unwrap();
    assert_eq!(bypass.status, BypassStatus::Rejected);

    // A still-wrong recount changes nothing.
    let err = h
        .machine
        .reverify_station(
            &h.worker,
            order.id,
            WorkerType::Washing,
            vec![OrderItem::new("Shirt", 2), OrderItem::new("Pants", 2)],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Station(StationError::VerificationStillMismatched)
    ));

    // The clean recount completes the station with no second admin trip.
    let receipt = h
        .machine
        .reverify_station(&h.worker, order.id, WorkerType::Washing, catalogue())
        .await
        .unwrap();
    assert_eq!(receipt.verification, VerificationOutcome::Verified);

    let order = h
        .machine
        .complete_station(&h.worker, order.id, WorkerType::Washing, None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::BeingWashed);
}

#[tokio::test]
async fn test_approved_bypass_completes_with_mismatched_items() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;

    let short_count = vec![OrderItem::new("Shirt", 2), OrderItem::new("Pants", 2)];
    h.machine
        .start_station(&h.worker, order.id, WorkerType::Washing, short_count, None)
        .await
        .unwrap();
    let bypass = h
        .machine
        .request_bypass(&h.worker, order.id, WorkerType::Washing, "customer miscounted".into())
        .await
        .unwrap();

    // A second request on the same process is refused.
    let err = h
        .machine
        .request_bypass(&h.worker, order.id, WorkerType::Washing, "again".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Bypass(washline_order::BypassError::AlreadyPending)
    ));

    h.machine
        .resolve_bypass(&h.outlet_admin, bypass.id, true, "confirmed with customer".into())
        .await
        .unwrap();

    let order = h
        .machine
        .complete_station(&h.worker, order.id, WorkerType::Washing, None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::BeingWashed);
}

#[tokio::test]
async fn test_station_out_of_order_is_refused() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;

    let err = h
        .machine
        .start_station(&h.worker, order.id, WorkerType::Ironing, catalogue(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Station(StationError::Transition(
            washline_order::TransitionError::StationOutOfOrder { .. }
        ))
    ));

    // The stored order did not move.
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::ArrivedAtOutlet);
}

#[tokio::test]
async fn test_out_of_radius_blocks_delivery_job() {
    let h = harness_with_address_offset(0.108); // ~12 km, radius is 10 km
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;
    run_station_clean(&h, order.id, WorkerType::Washing).await;
    run_station_clean(&h, order.id, WorkerType::Ironing).await;
    let order = run_station_clean(&h, order.id, WorkerType::Packing).await;
    assert_eq!(order.status, OrderStatus::WaitingPayment);

    let err = h
        .machine
        .confirm_payment(&Actor::system(), order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Fee(_)));

    // No partial mutation: still unpaid, still waiting, no delivery job.
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::WaitingPayment);
    assert_eq!(stored.payment_status, PaymentStatus::WaitingPayment);
    let deliveries = h
        .store
        .list_jobs(JobStatus::Pending, Some(JobType::Delivery))
        .await
        .unwrap();
    assert!(deliveries.is_empty());
}

#[tokio::test]
async fn test_early_payment_advances_on_packing_completion() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;
    run_station_clean(&h, order.id, WorkerType::Washing).await;

    // Customer pays while ironing is still ahead.
    let paid = h
        .machine
        .confirm_payment(&Actor::system(), order.id)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::BeingWashed);

    run_station_clean(&h, order.id, WorkerType::Ironing).await;
    let order = run_station_clean(&h, order.id, WorkerType::Packing).await;

    // Packing completion re-evaluated the gate and moved straight through.
    assert_eq!(order.status, OrderStatus::ReadyForDelivery);
    let deliveries = h
        .store
        .list_jobs(JobStatus::Pending, Some(JobType::Delivery))
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let h = harness();
    let (_, pickup) = create_order(&h).await;

    let driver_a = Actor::new(Uuid::new_v4(), ActorRole::Driver);
    let driver_b = Actor::new(Uuid::new_v4(), ActorRole::Driver);

    let machine = Arc::new(h.machine);
    let (m1, m2) = (machine.clone(), machine.clone());
    let (a, b) = tokio::join!(
        tokio::spawn(async move { m1.claim_job(&driver_a, pickup.id).await }),
        tokio::spawn(async move { m2.claim_job(&driver_b, pickup.id).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        WorkflowError::Claim(washline_dispatch::ClaimError::AlreadyClaimed)
    ));

    // Exactly one driver is bound to the job afterwards.
    let stored = h.store.get_job(pickup.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Assigned);
    assert!(stored.employee_id.is_some());
}

#[tokio::test]
async fn test_auto_confirm_sweep_is_idempotent() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;
    run_station_clean(&h, order.id, WorkerType::Washing).await;
    run_station_clean(&h, order.id, WorkerType::Ironing).await;
    run_station_clean(&h, order.id, WorkerType::Packing).await;
    h.machine
        .confirm_payment(&Actor::system(), order.id)
        .await
        .unwrap();
    let delivery = h
        .store
        .list_jobs(JobStatus::Pending, Some(JobType::Delivery))
        .await
        .unwrap()
        .pop()
        .unwrap();
    h.machine.claim_job(&h.driver, delivery.id).await.unwrap();
    h.machine.start_job(&h.driver, delivery.id).await.unwrap();
    h.machine
        .complete_job(&h.driver, delivery.id, vec![], None)
        .await
        .unwrap();

    // Backdate the delivery past the 2-day window.
    let mut stored = h.store.get_order(order.id).await.unwrap().unwrap();
    stored.actual_delivery_at = Some(Utc::now() - Duration::days(3));
    h.store.save_order(&stored).await.unwrap();

    let confirmed = h.machine.auto_confirm_due(Utc::now()).await.unwrap();
    assert_eq!(confirmed, 1);
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Completed);

    // Repeated sweeps find nothing to do.
    assert_eq!(h.machine.auto_confirm_due(Utc::now()).await.unwrap(), 0);
    assert!(h
        .events
        .topics_seen()
        .contains(&"order.auto_confirmed".to_string()));
}

#[tokio::test]
async fn test_sweep_ignores_fresh_deliveries() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;
    run_station_clean(&h, order.id, WorkerType::Washing).await;
    run_station_clean(&h, order.id, WorkerType::Ironing).await;
    run_station_clean(&h, order.id, WorkerType::Packing).await;
    h.machine
        .confirm_payment(&Actor::system(), order.id)
        .await
        .unwrap();
    let delivery = h
        .store
        .list_jobs(JobStatus::Pending, Some(JobType::Delivery))
        .await
        .unwrap()
        .pop()
        .unwrap();
    h.machine.claim_job(&h.driver, delivery.id).await.unwrap();
    h.machine.start_job(&h.driver, delivery.id).await.unwrap();
    h.machine
        .complete_job(&h.driver, delivery.id, vec![], None)
        .await
        .unwrap();

    // Delivered minutes ago: the sweep must leave it alone.
    assert_eq!(h.machine.auto_confirm_due(Utc::now()).await.unwrap(), 0);
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::DeliveredToCustomer);
}

#[tokio::test]
async fn test_stale_bypass_escalates_to_in_resolution() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;
    run_pickup(&h, pickup.id).await;

    let short_count = vec![OrderItem::new("Shirt", 2), OrderItem::new("Pants", 2)];
    h.machine
        .start_station(&h.worker, order.id, WorkerType::Washing, short_count, None)
        .await
        .unwrap();
    let bypass = h
        .machine
        .request_bypass(&h.worker, order.id, WorkerType::Washing, "shirt missing".into())
        .await
        .unwrap();

    // Within the grace window nothing happens.
    assert_eq!(
        h.machine.escalate_stale_bypasses(Utc::now()).await.unwrap(),
        0
    );

    // Past the grace window the order parks in InResolution.
    let later = Utc::now() + Duration::hours(13);
    assert_eq!(h.machine.escalate_stale_bypasses(later).await.unwrap(), 1);
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::InResolution);

    // Resolution returns the order to the station it left.
    h.machine
        .resolve_bypass(&h.outlet_admin, bypass.id, true, "written off".into())
        .await
        .unwrap();
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::BeingWashed);
}

#[tokio::test]
async fn test_create_order_validations() {
    let h = harness();

    // Too-soon pickup.
    let err = h
        .machine
        .create_pickup_order(
            &h.customer,
            CreatePickupOrder {
                address_id: h.address_id,
                outlet_id: h.outlet_id,
                scheduled_pickup_at: Utc::now() + Duration::minutes(10),
                scheduled_delivery_at: None,
                items: catalogue(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    // Somebody else's address.
    let stranger = Actor::new(Uuid::new_v4(), ActorRole::Customer);
    let err = h
        .machine
        .create_pickup_order(
            &stranger,
            CreatePickupOrder {
                address_id: h.address_id,
                outlet_id: h.outlet_id,
                scheduled_pickup_at: Utc::now() + Duration::hours(2),
                scheduled_delivery_at: None,
                items: catalogue(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotAuthorized(_)));

    // No items.
    let err = h
        .machine
        .create_pickup_order(
            &h.customer,
            CreatePickupOrder {
                address_id: h.address_id,
                outlet_id: h.outlet_id,
                scheduled_pickup_at: Utc::now() + Duration::hours(2),
                scheduled_delivery_at: None,
                items: vec![],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[tokio::test]
async fn test_measurement_prices_the_order() {
    let h = harness();
    let (order, pickup) = create_order(&h).await;

    // Weighing before the laundry reaches the outlet is refused.
    let err = h
        .machine
        .record_measurement(&h.worker, order.id, 4.5)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Transition(_)));

    run_pickup(&h, pickup.id).await;
    let order = h
        .machine
        .record_measurement(&h.worker, order.id, 4.5)
        .await
        .unwrap();
    // 4.5 kg at the default 8000/kg.
    assert_eq!(order.total_price, 36_000);
    assert_eq!(order.total_weight_kg, 4.5);
}
