use washline_core::identity::ActorRole;
use washline_domain::order::OrderStatus;
use washline_domain::work::WorkerType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassOutcome {
    Approved,
    Rejected,
}

/// Everything that can happen to an order. Driver events are fired by the
/// job registry operations, station and bypass events by the station
/// processor and bypass workflow, the rest by the payment gate, the customer
/// and the scheduled sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    PickupClaimed,
    PickupArrived,
    PickupStarted,
    PickupCompleted,
    StationStarted(WorkerType),
    StationCompleted(WorkerType),
    BypassRaised,
    BypassResolved(BypassOutcome),
    ResolutionEscalated,
    ResolutionResumed(WorkerType),
    PaymentConfirmed,
    DeliveryClaimed,
    DeliveryStarted,
    DeliveryArrived,
    DeliveryCompleted,
    CustomerConfirmed,
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::PickupClaimed => "PickupClaimed",
            OrderEvent::PickupArrived => "PickupArrived",
            OrderEvent::PickupStarted => "PickupStarted",
            OrderEvent::PickupCompleted => "PickupCompleted",
            OrderEvent::StationStarted(_) => "StationStarted",
            OrderEvent::StationCompleted(_) => "StationCompleted",
            OrderEvent::BypassRaised => "BypassRaised",
            OrderEvent::BypassResolved(_) => "BypassResolved",
            OrderEvent::ResolutionEscalated => "ResolutionEscalated",
            OrderEvent::ResolutionResumed(_) => "ResolutionResumed",
            OrderEvent::PaymentConfirmed => "PaymentConfirmed",
            OrderEvent::DeliveryClaimed => "DeliveryClaimed",
            OrderEvent::DeliveryStarted => "DeliveryStarted",
            OrderEvent::DeliveryArrived => "DeliveryArrived",
            OrderEvent::DeliveryCompleted => "DeliveryCompleted",
            OrderEvent::CustomerConfirmed => "CustomerConfirmed",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransitionError {
    #[error("Invalid transition: {event} is not valid while {from}")]
    InvalidTransition {
        from: OrderStatus,
        event: &'static str,
    },

    #[error("Station {station} is out of order while {from}")]
    StationOutOfOrder {
        from: OrderStatus,
        station: WorkerType,
    },

    #[error("Role {role} may not emit {event}")]
    NotAuthorized {
        role: ActorRole,
        event: &'static str,
    },
}

/// The transition function. Pure and total: a valid (status, event, role)
/// triple yields the next status, anything else yields an error and implies
/// no mutation anywhere.
///
/// The role guard runs before the state lookup so an unauthorized caller
/// learns nothing about the order's position in the lifecycle.
pub fn apply(
    current: OrderStatus,
    event: &OrderEvent,
    actor: ActorRole,
) -> Result<OrderStatus, TransitionError> {
    authorize(event, actor)?;

    use OrderStatus::*;
    let next = match (current, event) {
        (WaitingForPickup, OrderEvent::PickupClaimed) => DriverOnWayToCustomer,
        (DriverOnWayToCustomer, OrderEvent::PickupArrived) => ArrivedAtCustomer,
        (ArrivedAtCustomer, OrderEvent::PickupStarted) => DriverOnWayToOutlet,
        (DriverOnWayToOutlet, OrderEvent::PickupCompleted) => ArrivedAtOutlet,

        (from, OrderEvent::StationStarted(station)) => return station_started(from, *station),
        (from, OrderEvent::StationCompleted(station)) => return station_completed(from, *station),

        (from, OrderEvent::BypassRaised) if from.is_station() => from,
        (from, OrderEvent::BypassResolved(_)) if from.is_station() => from,
        (from, OrderEvent::ResolutionEscalated) if from.is_station() => InResolution,
        (InResolution, OrderEvent::ResolutionResumed(station)) => station_status(*station),

        (WaitingPayment, OrderEvent::PaymentConfirmed) => ReadyForDelivery,

        (ReadyForDelivery, OrderEvent::DeliveryClaimed) => BeingDeliveredToCustomer,
        (BeingDeliveredToCustomer, OrderEvent::DeliveryStarted) => BeingDeliveredToCustomer,
        (BeingDeliveredToCustomer, OrderEvent::DeliveryArrived) => BeingDeliveredToCustomer,
        (BeingDeliveredToCustomer, OrderEvent::DeliveryCompleted) => DeliveredToCustomer,

        (DeliveredToCustomer, OrderEvent::CustomerConfirmed) => Completed,

        (from, event) => {
            return Err(TransitionError::InvalidTransition {
                from,
                event: event.name(),
            })
        }
    };
    Ok(next)
}

/// Status an order sits in while the given station runs.
pub fn station_status(station: WorkerType) -> OrderStatus {
    match station {
        WorkerType::Washing => OrderStatus::BeingWashed,
        WorkerType::Ironing => OrderStatus::BeingIroned,
        WorkerType::Packing => OrderStatus::BeingPacked,
    }
}

/// Status a station may be started from. Washing opens from outlet arrival;
/// each later station opens from its predecessor's running status.
fn station_entry(station: WorkerType) -> OrderStatus {
    match station.previous() {
        None => OrderStatus::ArrivedAtOutlet,
        Some(prev) => station_status(prev),
    }
}

fn station_started(from: OrderStatus, station: WorkerType) -> Result<OrderStatus, TransitionError> {
    if from == station_entry(station) {
        return Ok(station_status(station));
    }
    if from == OrderStatus::ArrivedAtOutlet || from.is_station() {
        return Err(TransitionError::StationOutOfOrder { from, station });
    }
    Err(TransitionError::InvalidTransition {
        from,
        event: "StationStarted",
    })
}

fn station_completed(
    from: OrderStatus,
    station: WorkerType,
) -> Result<OrderStatus, TransitionError> {
    if from == station_status(station) {
        // Packing is the last station; its completion opens the payment gate.
        return Ok(if station == WorkerType::Packing {
            OrderStatus::WaitingPayment
        } else {
            from
        });
    }
    if from == OrderStatus::ArrivedAtOutlet || from.is_station() {
        return Err(TransitionError::StationOutOfOrder { from, station });
    }
    Err(TransitionError::InvalidTransition {
        from,
        event: "StationCompleted",
    })
}

fn authorize(event: &OrderEvent, role: ActorRole) -> Result<(), TransitionError> {
    let allowed = match event {
        OrderEvent::PickupClaimed
        | OrderEvent::PickupArrived
        | OrderEvent::PickupStarted
        | OrderEvent::PickupCompleted
        | OrderEvent::DeliveryClaimed
        | OrderEvent::DeliveryStarted
        | OrderEvent::DeliveryArrived
        | OrderEvent::DeliveryCompleted => role == ActorRole::Driver,

        OrderEvent::StationStarted(_)
        | OrderEvent::StationCompleted(_)
        | OrderEvent::BypassRaised => role == ActorRole::Worker,

        OrderEvent::BypassResolved(_) => role == ActorRole::OutletAdmin,

        OrderEvent::ResolutionEscalated | OrderEvent::ResolutionResumed(_) => {
            matches!(role, ActorRole::OutletAdmin | ActorRole::System)
        }

        OrderEvent::PaymentConfirmed => matches!(role, ActorRole::System | ActorRole::Admin),

        OrderEvent::CustomerConfirmed => {
            matches!(role, ActorRole::Customer | ActorRole::System)
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(TransitionError::NotAuthorized {
            role,
            event: event.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL_STATUSES: [OrderStatus; 14] = [
        WaitingForPickup,
        DriverOnWayToCustomer,
        ArrivedAtCustomer,
        DriverOnWayToOutlet,
        ArrivedAtOutlet,
        BeingWashed,
        BeingIroned,
        BeingPacked,
        WaitingPayment,
        ReadyForDelivery,
        BeingDeliveredToCustomer,
        DeliveredToCustomer,
        Completed,
        InResolution,
    ];

    #[test]
    fn test_full_happy_path() {
        let chain = [
            (OrderEvent::PickupClaimed, ActorRole::Driver, DriverOnWayToCustomer),
            (OrderEvent::PickupArrived, ActorRole::Driver, ArrivedAtCustomer),
            (OrderEvent::PickupStarted, ActorRole::Driver, DriverOnWayToOutlet),
            (OrderEvent::PickupCompleted, ActorRole::Driver, ArrivedAtOutlet),
            (OrderEvent::StationStarted(WorkerType::Washing), ActorRole::Worker, BeingWashed),
            (OrderEvent::StationCompleted(WorkerType::Washing), ActorRole::Worker, BeingWashed),
            (OrderEvent::StationStarted(WorkerType::Ironing), ActorRole::Worker, BeingIroned),
            (OrderEvent::StationCompleted(WorkerType::Ironing), ActorRole::Worker, BeingIroned),
            (OrderEvent::StationStarted(WorkerType::Packing), ActorRole::Worker, BeingPacked),
            (OrderEvent::StationCompleted(WorkerType::Packing), ActorRole::Worker, WaitingPayment),
            (OrderEvent::PaymentConfirmed, ActorRole::System, ReadyForDelivery),
            (OrderEvent::DeliveryClaimed, ActorRole::Driver, BeingDeliveredToCustomer),
            (OrderEvent::DeliveryStarted, ActorRole::Driver, BeingDeliveredToCustomer),
            (OrderEvent::DeliveryArrived, ActorRole::Driver, BeingDeliveredToCustomer),
            (OrderEvent::DeliveryCompleted, ActorRole::Driver, DeliveredToCustomer),
            (OrderEvent::CustomerConfirmed, ActorRole::Customer, Completed),
        ];

        let mut status = WaitingForPickup;
        for (event, role, expected) in chain {
            status = apply(status, &event, role).unwrap();
            assert_eq!(status, expected, "after {}", event.name());
        }
    }

    #[test]
    fn test_invalid_events_leave_status_alone() {
        // Spot-check a representative invalid event in every status.
        for status in ALL_STATUSES {
            if status == DeliveredToCustomer {
                continue; // CustomerConfirmed is the one valid case
            }
            let err = apply(status, &OrderEvent::CustomerConfirmed, ActorRole::Customer)
                .unwrap_err();
            assert!(
                matches!(err, TransitionError::InvalidTransition { from, .. } if from == status)
            );
        }
    }

    #[test]
    fn test_completed_is_terminal() {
        let events = [
            OrderEvent::PickupClaimed,
            OrderEvent::PaymentConfirmed,
            OrderEvent::DeliveryCompleted,
            OrderEvent::CustomerConfirmed,
        ];
        for event in events {
            let roles = [ActorRole::Driver, ActorRole::System, ActorRole::Customer];
            for role in roles {
                assert!(apply(Completed, &event, role).is_err());
            }
        }
    }

    #[test]
    fn test_station_sequence_is_enforced() {
        let err = apply(
            ArrivedAtOutlet,
            &OrderEvent::StationStarted(WorkerType::Ironing),
            ActorRole::Worker,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::StationOutOfOrder { .. }));

        let err = apply(
            BeingWashed,
            &OrderEvent::StationStarted(WorkerType::Packing),
            ActorRole::Worker,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::StationOutOfOrder { .. }));

        // Completing a station the order is not in is out of order too.
        let err = apply(
            BeingIroned,
            &OrderEvent::StationCompleted(WorkerType::Washing),
            ActorRole::Worker,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::StationOutOfOrder { .. }));
    }

    #[test]
    fn test_resolution_only_from_station_states() {
        for status in ALL_STATUSES {
            let result = apply(status, &OrderEvent::ResolutionEscalated, ActorRole::System);
            if status.is_station() {
                assert_eq!(result.unwrap(), InResolution);
            } else {
                assert!(result.is_err(), "escalated from {}", status);
            }
        }

        let resumed = apply(
            InResolution,
            &OrderEvent::ResolutionResumed(WorkerType::Ironing),
            ActorRole::OutletAdmin,
        )
        .unwrap();
        assert_eq!(resumed, BeingIroned);
    }

    #[test]
    fn test_role_guard_fails_closed() {
        // A worker cannot claim pickups.
        let err = apply(WaitingForPickup, &OrderEvent::PickupClaimed, ActorRole::Worker)
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotAuthorized { .. }));

        // Only an outlet admin resolves bypasses; a platform admin does not.
        let err = apply(
            BeingWashed,
            &OrderEvent::BypassResolved(BypassOutcome::Approved),
            ActorRole::Admin,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotAuthorized { .. }));

        // The sweep confirms deliveries as the system.
        assert!(apply(DeliveredToCustomer, &OrderEvent::CustomerConfirmed, ActorRole::System).is_ok());
    }

    #[test]
    fn test_payment_gate_is_the_only_path_to_delivery() {
        assert!(apply(WaitingPayment, &OrderEvent::DeliveryClaimed, ActorRole::Driver).is_err());
        assert_eq!(
            apply(WaitingPayment, &OrderEvent::PaymentConfirmed, ActorRole::System).unwrap(),
            ReadyForDelivery
        );
    }
}
