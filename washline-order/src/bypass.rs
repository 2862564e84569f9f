use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use washline_core::events::{topics, EventSink};
use washline_core::identity::{Actor, ActorRole};
use washline_core::repository::{BypassRepository, OrderRepository, WorkProcessRepository};
use washline_domain::bypass::{BypassRequest, BypassStatus};
use washline_domain::events::{BypassRaisedEvent, BypassResolvedEvent};
use washline_domain::order::{Order, OrderStatus};
use washline_domain::work::{OrderWorkProcess, WorkerType};

use crate::transitions::{apply, BypassOutcome, OrderEvent, TransitionError};

/// Where one work process stands in the discrepancy-escalation loop.
/// Derived, never stored: only `Pending | Approved | Rejected` persist on the
/// request itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassFlowState {
    None,
    Pending,
    Approved,
    Rejected,
    /// Rejected and the worker is redoing verification on the same process.
    InProgress,
    /// The process was superseded by a clean re-verification.
    ReVerify,
    Completed,
}

/// Discrepancy escalation for a single OrderWorkProcess:
/// `None → Pending → {Approved | Rejected}`, with rejection feeding the
/// re-verification cycle handled by the station processor.
pub struct BypassWorkflow {
    orders: Arc<dyn OrderRepository>,
    processes: Arc<dyn WorkProcessRepository>,
    bypasses: Arc<dyn BypassRepository>,
    events: Arc<dyn EventSink>,
}

impl BypassWorkflow {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        processes: Arc<dyn WorkProcessRepository>,
        bypasses: Arc<dyn BypassRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            orders,
            processes,
            bypasses,
            events,
        }
    }

    /// Raise a bypass for the open, mismatched process at this station. One
    /// pending request per process.
    pub async fn request_bypass(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        reason: String,
    ) -> Result<BypassRequest, BypassError> {
        if actor.role != ActorRole::Worker {
            return Err(BypassError::NotAuthorized(actor.role));
        }
        if reason.trim().is_empty() {
            return Err(BypassError::Validation("a reason is required".into()));
        }

        let mut order = self.load_order(order_id).await?;
        let mut process = self
            .processes
            .open_process(order_id, station)
            .await?
            .ok_or(BypassError::NoOpenProcess(station))?;
        if !process.mismatched {
            return Err(BypassError::NoDiscrepancy);
        }
        if let Some(existing) = self.bypasses.latest_for_process(process.id).await? {
            if existing.status == BypassStatus::Pending {
                return Err(BypassError::AlreadyPending);
            }
        }

        // Validates both the station state and the worker role; the status
        // itself does not move.
        apply(order.status, &OrderEvent::BypassRaised, actor.role)?;

        let request = BypassRequest::new(process.id, order_id, station, reason);
        self.bypasses.insert_bypass(&request).await?;

        process.bypass_id = Some(request.id);
        self.processes.save_process(&process).await?;

        order.update_status(order.status);
        self.orders.save_order(&order).await?;

        tracing::info!(
            "Bypass {} raised for order {} at {}",
            request.id,
            order.order_number,
            station
        );
        let event = BypassRaisedEvent {
            bypass_id: request.id,
            order_id,
            worker_type: station,
            reason: request.reason.clone(),
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::BYPASS_RAISED, &order_id.to_string(), &payload)
                .await;
        }

        Ok(request)
    }

    /// Resolve a pending request. The admin note is mandatory either way;
    /// once resolved the request is immutable. Resolving an order that was
    /// escalated to `InResolution` returns it to the station the open work
    /// process records.
    pub async fn resolve_bypass(
        &self,
        actor: &Actor,
        bypass_id: Uuid,
        approve: bool,
        admin_note: String,
    ) -> Result<BypassRequest, BypassError> {
        if actor.role != ActorRole::OutletAdmin {
            return Err(BypassError::NotAuthorized(actor.role));
        }
        if admin_note.trim().is_empty() {
            return Err(BypassError::Validation("an admin note is required".into()));
        }

        let mut request = self
            .bypasses
            .get_bypass(bypass_id)
            .await?
            .ok_or(BypassError::BypassNotFound(bypass_id))?;
        if request.status != BypassStatus::Pending {
            return Err(BypassError::NotPending);
        }

        let mut order = self.load_order(request.order_id).await?;

        let outcome = if approve {
            BypassOutcome::Approved
        } else {
            BypassOutcome::Rejected
        };
        let event = if order.status == OrderStatus::InResolution {
            OrderEvent::ResolutionResumed(request.worker_type)
        } else {
            OrderEvent::BypassResolved(outcome)
        };
        let next = apply(order.status, &event, actor.role)?;

        request.resolve(approve, admin_note, actor.id);
        self.bypasses.save_bypass(&request).await?;

        order.update_status(next);
        self.orders.save_order(&order).await?;

        tracing::info!(
            "Bypass {} {} by {} for order {}",
            request.id,
            request.status,
            actor.id,
            order.order_number
        );
        let event = BypassResolvedEvent {
            bypass_id: request.id,
            order_id: request.order_id,
            approved: approve,
            resolved_by: actor.id,
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::BYPASS_RESOLVED, &request.order_id.to_string(), &payload)
                .await;
        }

        Ok(request)
    }

    /// Every request still awaiting resolution, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<BypassRequest>, BypassError> {
        Ok(self.bypasses.list_pending().await?)
    }

    /// Derived position of a work process in the escalation loop.
    pub async fn flow_state(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<BypassFlowState, BypassError> {
        if process.completed_at.is_some() {
            return Ok(BypassFlowState::Completed);
        }
        if process.superseded {
            return Ok(BypassFlowState::ReVerify);
        }
        let Some(bypass) = self.bypasses.latest_for_process(process.id).await? else {
            return Ok(BypassFlowState::None);
        };
        Ok(match bypass.status {
            BypassStatus::Pending => BypassFlowState::Pending,
            BypassStatus::Approved => BypassFlowState::Approved,
            BypassStatus::Rejected if process.is_open() => BypassFlowState::InProgress,
            BypassStatus::Rejected => BypassFlowState::Rejected,
        })
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, BypassError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(BypassError::OrderNotFound(order_id))
    }
}


#[derive(Debug, thiserror::Error)]
pub enum BypassError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Bypass request not found: {0}")]
    BypassNotFound(Uuid),

    #[error("Role {0} may not perform this bypass action")]
    NotAuthorized(ActorRole),

    #[error("Station {0} has no open work process")]
    NoOpenProcess(WorkerType),

    #[error("The open work process has no discrepancy to bypass")]
    NoDiscrepancy,

    #[error("A bypass request is already pending for this process")]
    AlreadyPending,

    #[error("The bypass request is no longer pending")]
    NotPending,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}
