use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use washline_core::events::{topics, EventSink};
use washline_core::identity::{Actor, ActorRole};
use washline_core::payment::PaymentGate;
use washline_core::repository::{
    AddressRepository, BypassRepository, JobRepository, OrderRepository, OutletRepository,
    WorkProcessRepository,
};
use washline_dispatch::claims::{ClaimError, JobClaimRegistry};
use washline_dispatch::fees::{delivery_fee, distance_km, DeliveryPricing, FeeError};
use washline_domain::bypass::BypassRequest;
use washline_domain::events::{OrderAutoConfirmedEvent, OrderCreatedEvent, OrderStatusChangedEvent};
use washline_domain::job::{Job, JobStatus, JobType};
use washline_domain::order::{Order, OrderItem, OrderStatus, PaymentStatus};
use washline_domain::work::WorkerType;

use crate::bypass::{BypassError, BypassWorkflow};
use crate::stations::{StationError, StationReceipt, WorkerStationProcessor};
use crate::transitions::{apply, OrderEvent, TransitionError};

/// Business rules the workflow runs under; loaded from configuration by the
/// embedding process.
#[derive(Debug, Clone)]
pub struct WorkflowRules {
    /// Earliest a pickup may be scheduled, relative to now.
    pub pickup_lead_hours: i64,
    /// Laundry price per kilogram, integer currency units.
    pub price_per_kg: i64,
    pub delivery_pricing: DeliveryPricing,
    /// Days after delivery before the sweep confirms on the customer's behalf.
    pub auto_confirm_days: i64,
    /// Hours a bypass may stay pending before escalation to InResolution.
    pub bypass_grace_hours: i64,
}

impl Default for WorkflowRules {
    fn default() -> Self {
        Self {
            pickup_lead_hours: 1,
            price_per_kg: 8000,
            delivery_pricing: DeliveryPricing {
                base_fee: 5000,
                per_km_fee: 1500,
                service_radius_km: 10.0,
            },
            auto_confirm_days: 2,
            bypass_grace_hours: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePickupOrder {
    pub address_id: Uuid,
    pub outlet_id: Uuid,
    pub scheduled_pickup_at: DateTime<Utc>,
    /// Optional customer-requested delivery slot.
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

/// Top-level orchestrator. Owns every Order mutation; composes the claim
/// registry, the station processor, the bypass workflow, the fee calculator
/// and the payment gate.
pub struct OrderStateMachine {
    orders: Arc<dyn OrderRepository>,
    jobs: Arc<dyn JobRepository>,
    addresses: Arc<dyn AddressRepository>,
    outlets: Arc<dyn OutletRepository>,
    registry: JobClaimRegistry,
    stations: WorkerStationProcessor,
    bypass_flow: BypassWorkflow,
    payment: Arc<dyn PaymentGate>,
    events: Arc<dyn EventSink>,
    rules: WorkflowRules,
}

impl OrderStateMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        jobs: Arc<dyn JobRepository>,
        processes: Arc<dyn WorkProcessRepository>,
        bypasses: Arc<dyn BypassRepository>,
        addresses: Arc<dyn AddressRepository>,
        outlets: Arc<dyn OutletRepository>,
        payment: Arc<dyn PaymentGate>,
        events: Arc<dyn EventSink>,
        rules: WorkflowRules,
    ) -> Self {
        Self {
            registry: JobClaimRegistry::new(jobs.clone(), events.clone()),
            stations: WorkerStationProcessor::new(
                orders.clone(),
                processes.clone(),
                bypasses.clone(),
                events.clone(),
            ),
            bypass_flow: BypassWorkflow::new(
                orders.clone(),
                processes.clone(),
                bypasses.clone(),
                events.clone(),
            ),
            orders,
            jobs,
            addresses,
            outlets,
            payment,
            events,
            rules,
        }
    }

    pub fn rules(&self) -> &WorkflowRules {
        &self.rules
    }

    /// Create an order in `WaitingForPickup` together with its pending pickup
    /// job. Validation happens before anything is written.
    pub async fn create_pickup_order(
        &self,
        actor: &Actor,
        request: CreatePickupOrder,
    ) -> Result<(Order, Job), WorkflowError> {
        if actor.role != ActorRole::Customer {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }
        if request.items.is_empty() {
            return Err(WorkflowError::Validation(
                "an order needs at least one item".into(),
            ));
        }
        if request.items.iter().any(|i| i.quantity == 0 || i.name.trim().is_empty()) {
            return Err(WorkflowError::Validation(
                "every item needs a name and a positive quantity".into(),
            ));
        }

        let earliest = Utc::now() + Duration::hours(self.rules.pickup_lead_hours);
        if request.scheduled_pickup_at < earliest {
            return Err(WorkflowError::Validation(format!(
                "pickup must be scheduled at least {}h ahead",
                self.rules.pickup_lead_hours
            )));
        }
        if let Some(delivery_at) = request.scheduled_delivery_at {
            if delivery_at <= request.scheduled_pickup_at {
                return Err(WorkflowError::Validation(
                    "delivery slot must come after the pickup".into(),
                ));
            }
        }

        let address = self
            .addresses
            .get_address(request.address_id)
            .await?
            .ok_or_else(|| WorkflowError::Validation("address not found".into()))?;
        if address.customer_id != actor.id {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }
        if self.outlets.get_outlet(request.outlet_id).await?.is_none() {
            return Err(WorkflowError::Validation("outlet not found".into()));
        }

        let order = Order::new(
            actor.id,
            request.outlet_id,
            address.to_delivery_address(),
            request.scheduled_pickup_at,
            request.scheduled_delivery_at,
            request.items,
        );
        let job = Job::new(order.id, JobType::Pickup);

        self.orders.insert_order(&order).await?;
        self.jobs.insert_job(&job).await?;

        tracing::info!(
            "Order {} created for customer {}, pickup job {}",
            order.order_number,
            actor.id,
            job.id
        );
        let event = OrderCreatedEvent {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            outlet_id: order.outlet_id,
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::ORDER_CREATED, &order.id.to_string(), &payload)
                .await;
        }

        Ok((order, job))
    }

    /// Claim a pending job; exactly one of any concurrent claimers wins.
    pub async fn claim_job(&self, actor: &Actor, job_id: Uuid) -> Result<(Job, Order), WorkflowError> {
        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(WorkflowError::Claim(ClaimError::NotFound(job_id)))?;
        if job.status != JobStatus::Pending {
            return Err(WorkflowError::Claim(ClaimError::AlreadyClaimed));
        }
        let mut order = self.load_order(job.order_id).await?;

        let event = match job.job_type {
            JobType::Pickup => OrderEvent::PickupClaimed,
            JobType::Delivery => OrderEvent::DeliveryClaimed,
        };
        // Validate the order-side transition before racing for the claim.
        let next = match apply(order.status, &event, actor.role) {
            Ok(next) => next,
            Err(err) => {
                // The order may have advanced because another driver won the
                // claim between our two reads; report that as the lost race
                // it is.
                return match self.jobs.get_job(job_id).await? {
                    Some(j) if j.status != JobStatus::Pending => {
                        Err(WorkflowError::Claim(ClaimError::AlreadyClaimed))
                    }
                    _ => Err(err.into()),
                };
            }
        };

        let job = self.registry.claim(actor, job_id).await?;

        let from = order.status;
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok((job, order))
    }

    /// Begin the transport leg of a claimed job. For pickups this is the
    /// moment the laundry leaves the customer, so the actual pickup time is
    /// stamped here.
    pub async fn start_job(&self, actor: &Actor, job_id: Uuid) -> Result<(Job, Order), WorkflowError> {
        let current = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(WorkflowError::Claim(ClaimError::NotFound(job_id)))?;
        let mut order = self.load_order(current.order_id).await?;

        let event = match current.job_type {
            JobType::Pickup => OrderEvent::PickupStarted,
            JobType::Delivery => OrderEvent::DeliveryStarted,
        };
        let next = apply(order.status, &event, actor.role)?;

        let job = self.registry.start(actor, job_id).await?;

        let from = order.status;
        if job.job_type == JobType::Pickup {
            order.actual_pickup_at = Some(Utc::now());
        }
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok((job, order))
    }

    /// Record the driver's arrival (at the customer for pickups, at the door
    /// for deliveries).
    pub async fn arrive_job(&self, actor: &Actor, job_id: Uuid) -> Result<(Job, Order), WorkflowError> {
        let job = self.registry.arrive(actor, job_id).await?;
        let mut order = self.load_order(job.order_id).await?;

        let event = match job.job_type {
            JobType::Pickup => OrderEvent::PickupArrived,
            JobType::Delivery => OrderEvent::DeliveryArrived,
        };
        let next = apply(order.status, &event, actor.role)?;

        let from = order.status;
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok((job, order))
    }

    /// Complete an in-progress job with proof photos; advances the order to
    /// `ArrivedAtOutlet` (pickup) or `DeliveredToCustomer` (delivery).
    pub async fn complete_job(
        &self,
        actor: &Actor,
        job_id: Uuid,
        photos: Vec<String>,
        notes: Option<String>,
    ) -> Result<(Job, Order), WorkflowError> {
        let current = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(WorkflowError::Claim(ClaimError::NotFound(job_id)))?;
        let mut order = self.load_order(current.order_id).await?;

        let event = match current.job_type {
            JobType::Pickup => OrderEvent::PickupCompleted,
            JobType::Delivery => OrderEvent::DeliveryCompleted,
        };
        let next = apply(order.status, &event, actor.role)?;

        let job = self.registry.complete(actor, job_id, photos, notes).await?;

        let from = order.status;
        if job.job_type == JobType::Delivery {
            order.actual_delivery_at = Some(Utc::now());
        }
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok((job, order))
    }

    /// Operational override; touches only the job.
    pub async fn cancel_job(&self, actor: &Actor, job_id: Uuid) -> Result<Job, WorkflowError> {
        Ok(self.registry.cancel(actor, job_id).await?)
    }

    pub async fn list_claimable_jobs(
        &self,
        actor: &Actor,
        job_type: Option<JobType>,
    ) -> Result<Vec<Job>, WorkflowError> {
        Ok(self.registry.list_claimable(actor, job_type).await?)
    }

    pub async fn start_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        declared_items: Vec<OrderItem>,
        notes: Option<String>,
    ) -> Result<StationReceipt, WorkflowError> {
        Ok(self
            .stations
            .start_station(actor, order_id, station, declared_items, notes)
            .await?)
    }

    /// Complete a station. When packing closes with the payment already
    /// settled, the order advances straight through the payment gate; an
    /// address outside the service radius leaves it parked in
    /// `WaitingPayment` for operators to resolve.
    pub async fn complete_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        notes: Option<String>,
    ) -> Result<Order, WorkflowError> {
        let (mut order, _process) = self
            .stations
            .complete_station(actor, order_id, station, notes)
            .await?;

        if order.status == OrderStatus::WaitingPayment
            && order.payment_status == PaymentStatus::Paid
        {
            match self.advance_to_delivery(&mut order, ActorRole::System).await {
                Ok(_) => {}
                Err(WorkflowError::Fee(err)) => {
                    tracing::warn!(
                        "Order {} stays in WaitingPayment: {}",
                        order.order_number,
                        err
                    );
                }
                Err(other) => return Err(other),
            }
        }

        Ok(order)
    }

    pub async fn reverify_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        declared_items: Vec<OrderItem>,
    ) -> Result<StationReceipt, WorkflowError> {
        Ok(self
            .stations
            .reverify_station(actor, order_id, station, declared_items)
            .await?)
    }

    pub async fn request_bypass(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        reason: String,
    ) -> Result<BypassRequest, WorkflowError> {
        Ok(self
            .bypass_flow
            .request_bypass(actor, order_id, station, reason)
            .await?)
    }

    pub async fn resolve_bypass(
        &self,
        actor: &Actor,
        bypass_id: Uuid,
        approve: bool,
        admin_note: String,
    ) -> Result<BypassRequest, WorkflowError> {
        Ok(self
            .bypass_flow
            .resolve_bypass(actor, bypass_id, approve, admin_note)
            .await?)
    }

    /// Outlet intake weighing; prices the order before the payment gate.
    pub async fn record_measurement(
        &self,
        actor: &Actor,
        order_id: Uuid,
        weight_kg: f64,
    ) -> Result<Order, WorkflowError> {
        if actor.role != ActorRole::Worker {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }
        if weight_kg <= 0.0 {
            return Err(WorkflowError::Validation("weight must be positive".into()));
        }
        let mut order = self.load_order(order_id).await?;
        if !matches!(order.status, OrderStatus::ArrivedAtOutlet)
            && !order.status.is_station()
        {
            return Err(WorkflowError::Transition(TransitionError::InvalidTransition {
                from: order.status,
                event: "RecordMeasurement",
            }));
        }

        order.total_weight_kg = weight_kg;
        order.total_price = (weight_kg * self.rules.price_per_kg as f64).round() as i64
            + order.delivery_fee;
        order.updated_at = Utc::now();
        self.orders.save_order(&order).await?;
        Ok(order)
    }

    /// Record settled payment and, when the order is waiting on it, advance
    /// through the fee gate into `ReadyForDelivery` with a pending delivery
    /// job. On `OutOfServiceRadius` nothing at all is mutated; re-invoking
    /// after the address or outlet data is corrected retries the advance.
    pub async fn confirm_payment(&self, actor: &Actor, order_id: Uuid) -> Result<Order, WorkflowError> {
        if !matches!(actor.role, ActorRole::System | ActorRole::Admin) {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }
        let mut order = self.load_order(order_id).await?;

        if order.payment_status == PaymentStatus::Paid
            && order.status != OrderStatus::WaitingPayment
        {
            return Ok(order); // nothing left to do
        }

        if !self.payment.verify_paid(order.id, order.total_price).await? {
            return Err(WorkflowError::Validation(
                "payment has not settled with the provider".into(),
            ));
        }

        if order.status == OrderStatus::WaitingPayment {
            self.advance_to_delivery(&mut order, actor.role).await?;
        } else {
            order.mark_paid();
            self.orders.save_order(&order).await?;
        }
        Ok(order)
    }

    /// Explicit customer confirmation, also the entry point the
    /// auto-confirmation sweep reuses.
    pub async fn confirm_delivery(&self, actor: &Actor, order_id: Uuid) -> Result<Order, WorkflowError> {
        let mut order = self.load_order(order_id).await?;
        if actor.role == ActorRole::Customer && order.customer_id != actor.id {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }

        let next = apply(order.status, &OrderEvent::CustomerConfirmed, actor.role)?;

        let from = order.status;
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok(order)
    }

    /// Confirm every delivery the customer has sat on for longer than the
    /// auto-confirm window. Goes through the same transition as an explicit
    /// confirmation, so it can never move an order that is not in
    /// `DeliveredToCustomer` — which also makes repeated sweeps idempotent.
    pub async fn auto_confirm_due(&self, now: DateTime<Utc>) -> Result<usize, WorkflowError> {
        let window = Duration::days(self.rules.auto_confirm_days);
        let due = self
            .orders
            .list_orders_by_status(OrderStatus::DeliveredToCustomer)
            .await?;

        let mut confirmed = 0;
        for order in due {
            let Some(delivered_at) = order.actual_delivery_at else {
                continue;
            };
            if delivered_at + window > now {
                continue;
            }
            match self.confirm_delivery(&Actor::system(), order.id).await {
                Ok(_) => {
                    confirmed += 1;
                    let event = OrderAutoConfirmedEvent {
                        order_id: order.id,
                        delivered_at: delivered_at.timestamp(),
                        timestamp: now.timestamp(),
                    };
                    if let Ok(payload) = serde_json::to_string(&event) {
                        let _ = self
                            .events
                            .publish(topics::ORDER_AUTO_CONFIRMED, &order.id.to_string(), &payload)
                            .await;
                    }
                }
                Err(err) => {
                    // Lost a race with an explicit confirmation; nothing to do.
                    tracing::warn!("Auto-confirm skipped order {}: {}", order.id, err);
                }
            }
        }
        Ok(confirmed)
    }

    /// Escalate orders whose bypass has sat pending past the grace window.
    pub async fn escalate_stale_bypasses(&self, now: DateTime<Utc>) -> Result<usize, WorkflowError> {
        let grace = Duration::hours(self.rules.bypass_grace_hours);
        let pending = self.bypass_flow_pending().await?;

        let mut escalated = 0;
        for bypass in pending {
            if bypass.created_at + grace > now {
                continue;
            }
            let mut order = self.load_order(bypass.order_id).await?;
            if !order.status.is_station() {
                continue; // already escalated or moved on
            }
            let next = apply(order.status, &OrderEvent::ResolutionEscalated, ActorRole::System)?;
            let from = order.status;
            order.update_status(next);
            self.orders.save_order(&order).await?;
            self.publish_status_change(&order, from, ActorRole::System).await;
            tracing::warn!(
                "Order {} escalated to InResolution; bypass {} pending since {}",
                order.order_number,
                bypass.id,
                bypass.created_at
            );
            escalated += 1;
        }
        Ok(escalated)
    }

    pub async fn get_order(&self, actor: &Actor, order_id: Uuid) -> Result<Order, WorkflowError> {
        let order = self.load_order(order_id).await?;
        if actor.role == ActorRole::Customer && order.customer_id != actor.id {
            return Err(WorkflowError::NotAuthorized(actor.role));
        }
        Ok(order)
    }

    pub async fn list_customer_orders(&self, actor: &Actor) -> Result<Vec<Order>, WorkflowError> {
        Ok(self.orders.list_orders_by_customer(actor.id).await?)
    }

    /// The one place the payment gate opens: fee-gate the address, mark paid,
    /// transition, create the delivery job. The fee check runs first so an
    /// out-of-radius address mutates nothing.
    async fn advance_to_delivery(
        &self,
        order: &mut Order,
        role: ActorRole,
    ) -> Result<Job, WorkflowError> {
        let outlet = self
            .outlets
            .get_outlet(order.outlet_id)
            .await?
            .ok_or_else(|| WorkflowError::Validation("outlet not found".into()))?;
        let destination = order.delivery_address.geo_point().ok_or_else(|| {
            WorkflowError::Validation("delivery address has no coordinates".into())
        })?;

        let distance = distance_km(outlet.geo_point(), destination);
        let fee = delivery_fee(distance, &self.rules.delivery_pricing)?;

        let next = apply(order.status, &OrderEvent::PaymentConfirmed, role)?;

        order.mark_paid();
        order.delivery_fee = fee;
        order.total_price += fee;
        let from = order.status;
        order.update_status(next);
        self.orders.save_order(order).await?;

        let job = Job::new(order.id, JobType::Delivery);
        self.jobs.insert_job(&job).await?;

        tracing::info!(
            "Order {} ready for delivery, {} km, fee {}, job {}",
            order.order_number,
            distance,
            fee,
            job.id
        );
        self.publish_status_change(order, from, role).await;

        Ok(job)
    }

    async fn bypass_flow_pending(&self) -> Result<Vec<BypassRequest>, WorkflowError> {
        Ok(self.bypass_flow.list_pending().await?)
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, WorkflowError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(WorkflowError::OrderNotFound(order_id))
    }

    async fn publish_status_change(&self, order: &Order, from: OrderStatus, role: ActorRole) {
        if from == order.status {
            return;
        }
        let event = OrderStatusChangedEvent {
            order_id: order.id,
            from: from.to_string(),
            to: order.status.to_string(),
            actor_role: role.to_string(),
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::ORDER_STATUS_CHANGED, &order.id.to_string(), &payload)
                .await;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Role {0} may not perform this operation")]
    NotAuthorized(washline_core::identity::ActorRole),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Station(#[from] StationError),

    #[error(transparent)]
    Bypass(#[from] BypassError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}
