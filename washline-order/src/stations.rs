use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use washline_core::events::{topics, EventSink};
use washline_core::identity::{Actor, ActorRole};
use washline_core::repository::{BypassRepository, OrderRepository, WorkProcessRepository};
use washline_domain::bypass::BypassStatus;
use washline_domain::events::OrderStatusChangedEvent;
use washline_domain::order::{Order, OrderItem};
use washline_domain::work::{OrderWorkProcess, WorkerType};

use crate::transitions::{apply, OrderEvent, TransitionError};

/// One quantity difference between the order's catalogue and a worker's
/// count. `verified == 0` means the item was missing entirely; `catalogued
/// == 0` means the worker found something the order never declared.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemDiscrepancy {
    pub name: String,
    pub catalogued: u32,
    pub verified: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VerificationOutcome {
    Verified,
    Mismatched(Vec<ItemDiscrepancy>),
}

impl VerificationOutcome {
    pub fn is_mismatched(&self) -> bool {
        matches!(self, VerificationOutcome::Mismatched(_))
    }
}

/// What a worker gets back from opening (or re-verifying) a station.
#[derive(Debug, Clone)]
pub struct StationReceipt {
    pub order: Order,
    pub process: OrderWorkProcess,
    pub verification: VerificationOutcome,
}

/// Per-station verification and completion. Stations run strictly in the
/// Washing → Ironing → Packing sequence; a mismatched count blocks completion
/// until a bypass is approved or a clean re-verification lands.
pub struct WorkerStationProcessor {
    orders: Arc<dyn OrderRepository>,
    processes: Arc<dyn WorkProcessRepository>,
    bypasses: Arc<dyn BypassRepository>,
    events: Arc<dyn EventSink>,
}

impl WorkerStationProcessor {
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

    /// Open a station: verify the declared items against the catalogue and
    /// record the work process. A mismatch still opens the process — flagged,
    /// with the discrepancies reported back — because the bypass workflow
    /// needs the record to attach to; it only blocks completion.
    pub async fn start_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        declared_items: Vec<OrderItem>,
        notes: Option<String>,
    ) -> Result<StationReceipt, StationError> {
        require_worker(actor)?;
        let mut order = self.load_order(order_id).await?;

        let next = apply(order.status, &OrderEvent::StationStarted(station), actor.role)?;

        // The status transition alone cannot see whether the predecessor's
        // process was actually closed (a pending bypass keeps it open).
        if let Some(prev) = station.previous() {
            match self.processes.latest_process(order_id, prev).await? {
                Some(p) if p.completed_at.is_some() => {}
                _ => {
                    return Err(StationError::Transition(TransitionError::StationOutOfOrder {
                        from: order.status,
                        station,
                    }))
                }
            }
        }
        if self.processes.open_process(order_id, station).await?.is_some() {
            return Err(StationError::AlreadyStarted(station));
        }

        let verification = compare_items(&order.items, &declared_items);
        let process = OrderWorkProcess::new(
            order_id,
            station,
            actor.id,
            declared_items,
            verification.is_mismatched(),
            notes,
        );
        self.processes.insert_process(&process).await?;

        let from = order.status;
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        if let VerificationOutcome::Mismatched(ref diffs) = verification {
            tracing::warn!(
                "Order {} {} verification mismatched on {} item(s)",
                order.order_number,
                station,
                diffs.len()
            );
        }

        Ok(StationReceipt {
            order,
            process,
            verification,
        })
    }

    /// Close a station. Refused while the process carries an unresolved
    /// mismatch: no bypass yet, a bypass still pending, or a rejected bypass
    /// whose re-verification has not come back clean.
    pub async fn complete_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        notes: Option<String>,
    ) -> Result<(Order, OrderWorkProcess), StationError> {
        require_worker(actor)?;
        let mut order = self.load_order(order_id).await?;

        let mut process = self
            .processes
            .open_process(order_id, station)
            .await?
            .ok_or(StationError::NoOpenProcess(station))?;

        if process.mismatched {
            let covered = match self.bypasses.latest_for_process(process.id).await? {
                Some(bypass) => bypass.status == BypassStatus::Approved,
                None => false,
            };
            if !covered {
                return Err(StationError::BypassPending);
            }
        }

        let next = apply(order.status, &OrderEvent::StationCompleted(station), actor.role)?;

        process.close(notes);
        self.processes.save_process(&process).await?;

        let from = order.status;
        order.update_status(next);
        self.orders.save_order(&order).await?;
        self.publish_status_change(&order, from, actor.role).await;

        Ok((order, process))
    }

    /// Re-verification after a rejected bypass. Only a clean match is
    /// accepted: it supersedes the mismatched process with a fresh verified
    /// one (never a new bypass request). A second mismatch changes nothing —
    /// the worker resolves the discrepancy physically and tries again.
    pub async fn reverify_station(
        &self,
        actor: &Actor,
        order_id: Uuid,
        station: WorkerType,
        declared_items: Vec<OrderItem>,
    ) -> Result<StationReceipt, StationError> {
        require_worker(actor)?;
        let order = self.load_order(order_id).await?;

        if order.status != crate::transitions::station_status(station) {
            return Err(StationError::Transition(TransitionError::InvalidTransition {
                from: order.status,
                event: "ReVerify",
            }));
        }

        let mut old = self
            .processes
            .open_process(order_id, station)
            .await?
            .ok_or(StationError::NoOpenProcess(station))?;
        if !old.mismatched {
            return Err(StationError::ReVerifyUnavailable);
        }
        match self.bypasses.latest_for_process(old.id).await? {
            Some(bypass) if bypass.status == BypassStatus::Rejected => {}
            Some(bypass) if bypass.status == BypassStatus::Pending => {
                return Err(StationError::BypassPending)
            }
            _ => return Err(StationError::ReVerifyUnavailable),
        }

        let verification = compare_items(&order.items, &declared_items);
        if let VerificationOutcome::Mismatched(_) = verification {
            return Err(StationError::VerificationStillMismatched);
        }

        old.superseded = true;
        self.processes.save_process(&old).await?;

        let process = OrderWorkProcess::new(order_id, station, actor.id, declared_items, false, None);
        self.processes.insert_process(&process).await?;

        tracing::info!(
            "Order {} {} re-verified clean, process {} supersedes {}",
            order.order_number,
            station,
            process.id,
            old.id
        );

        Ok(StationReceipt {
            order,
            process,
            verification,
        })
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, StationError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(StationError::OrderNotFound(order_id))
    }

    async fn publish_status_change(&self, order: &Order, from: washline_domain::order::OrderStatus, role: ActorRole) {
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

/// Multiset comparison of catalogued vs declared items, case-insensitive on
/// the item name. Returns every name whose totals differ.
pub fn compare_items(catalogued: &[OrderItem], declared: &[OrderItem]) -> VerificationOutcome {
    let mut totals: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for item in catalogued {
        totals.entry(item.name.to_lowercase()).or_default().0 += item.quantity;
    }
    for item in declared {
        totals.entry(item.name.to_lowercase()).or_default().1 += item.quantity;
    }

    let diffs: Vec<ItemDiscrepancy> = totals
        .into_iter()
        .filter(|(_, (catalogued, verified))| catalogued != verified)
        .map(|(name, (catalogued, verified))| ItemDiscrepancy {
            name,
            catalogued,
            verified,
        })
        .collect();

    if diffs.is_empty() {
        VerificationOutcome::Verified
    } else {
        VerificationOutcome::Mismatched(diffs)
    }
}

fn require_worker(actor: &Actor) -> Result<(), StationError> {
    if actor.role != ActorRole::Worker {
        return Err(StationError::NotAuthorized(actor.role));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Role {0} may not operate a station")]
    NotAuthorized(ActorRole),

    #[error("Station {0} already has an open work process")]
    AlreadyStarted(WorkerType),

    #[error("Station {0} has no open work process")]
    NoOpenProcess(WorkerType),

    #[error("A bypass must be approved before this station can complete")]
    BypassPending,

    #[error("Re-verification still mismatches the catalogued items")]
    VerificationStillMismatched,

    #[error("Re-verification is only available after a rejected bypass")]
    ReVerifyUnavailable,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(&str, u32)]) -> Vec<OrderItem> {
        pairs.iter().map(|(n, q)| OrderItem::new(*n, *q)).collect()
    }

    #[test]
    fn test_matching_counts_verify() {
        let outcome = compare_items(
            &items(&[("Shirt", 3), ("Pants", 2)]),
            &items(&[("shirt", 3), ("Pants", 2)]),
        );
        assert_eq!(outcome, VerificationOutcome::Verified);
    }

    #[test]
    fn test_quantity_mismatch_is_reported() {
        let outcome = compare_items(
            &items(&[("Shirt", 3), ("Pants", 2)]),
            &items(&[("Shirt", 2), ("Pants", 2)]),
        );
        let VerificationOutcome::Mismatched(diffs) = outcome else {
            panic!("expected mismatch");
        };
        assert_eq!(
            diffs,
            vec![ItemDiscrepancy {
                name: "shirt".into(),
                catalogued: 3,
                verified: 2
            }]
        );
    }

    #[test]
    fn test_undeclared_item_is_a_mismatch() {
        let outcome = compare_items(&items(&[("Shirt", 1)]), &items(&[("Shirt", 1), ("Towel", 1)]));
        let VerificationOutcome::Mismatched(diffs) = outcome else {
            panic!("expected mismatch");
        };
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].name, "towel");
        assert_eq!(diffs[0].catalogued, 0);
    }

    #[test]
    fn test_duplicate_lines_are_summed() {
        let outcome = compare_items(
            &items(&[("Shirt", 2), ("Shirt", 1)]),
            &items(&[("Shirt", 3)]),
        );
        assert_eq!(outcome, VerificationOutcome::Verified);
    }
}
