use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::address::DeliveryAddress;

/// Order status over the full pickup → processing → delivery lifecycle.
///
/// Variant names are the persisted/wire literals — notification and
/// reporting collaborators key off them, so no serde renaming is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
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
}

impl OrderStatus {
    /// Terminal statuses accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Station statuses are the only ones a bypass can escalate from.
    pub fn is_station(&self) -> bool {
        matches!(
            self,
            OrderStatus::BeingWashed | OrderStatus::BeingIroned | OrderStatus::BeingPacked
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingForPickup => "WaitingForPickup",
            OrderStatus::DriverOnWayToCustomer => "DriverOnWayToCustomer",
            OrderStatus::ArrivedAtCustomer => "ArrivedAtCustomer",
            OrderStatus::DriverOnWayToOutlet => "DriverOnWayToOutlet",
            OrderStatus::ArrivedAtOutlet => "ArrivedAtOutlet",
            OrderStatus::BeingWashed => "BeingWashed",
            OrderStatus::BeingIroned => "BeingIroned",
            OrderStatus::BeingPacked => "BeingPacked",
            OrderStatus::WaitingPayment => "WaitingPayment",
            OrderStatus::ReadyForDelivery => "ReadyForDelivery",
            OrderStatus::BeingDeliveredToCustomer => "BeingDeliveredToCustomer",
            OrderStatus::DeliveredToCustomer => "DeliveredToCustomer",
            OrderStatus::Completed => "Completed",
            OrderStatus::InResolution => "InResolution",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitingForPickup" => Ok(OrderStatus::WaitingForPickup),
            "DriverOnWayToCustomer" => Ok(OrderStatus::DriverOnWayToCustomer),
            "ArrivedAtCustomer" => Ok(OrderStatus::ArrivedAtCustomer),
            "DriverOnWayToOutlet" => Ok(OrderStatus::DriverOnWayToOutlet),
            "ArrivedAtOutlet" => Ok(OrderStatus::ArrivedAtOutlet),
            "BeingWashed" => Ok(OrderStatus::BeingWashed),
            "BeingIroned" => Ok(OrderStatus::BeingIroned),
            "BeingPacked" => Ok(OrderStatus::BeingPacked),
            "WaitingPayment" => Ok(OrderStatus::WaitingPayment),
            "ReadyForDelivery" => Ok(OrderStatus::ReadyForDelivery),
            "BeingDeliveredToCustomer" => Ok(OrderStatus::BeingDeliveredToCustomer),
            "DeliveredToCustomer" => Ok(OrderStatus::DeliveredToCustomer),
            "Completed" => Ok(OrderStatus::Completed),
            "InResolution" => Ok(OrderStatus::InResolution),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Payment status tracked alongside the order status; the gateway itself
/// lives behind `PaymentGate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    WaitingPayment,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::WaitingPayment => "WaitingPayment",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitingPayment" => Ok(PaymentStatus::WaitingPayment),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// One catalogued garment line on an order. The customer declares these at
/// creation; every station re-verifies against them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// The single source of truth for a laundry order. Never deleted; mutated
/// only through state-machine transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub outlet_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
    pub total_weight_kg: f64,
    pub total_price: i64,
    pub delivery_fee: i64,
    pub delivery_address: DeliveryAddress,
    pub scheduled_pickup_at: DateTime<Utc>,
    pub actual_pickup_at: Option<DateTime<Utc>>,
    /// Customer-requested delivery slot, if any.
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: Uuid,
        outlet_id: Uuid,
        delivery_address: DeliveryAddress,
        scheduled_pickup_at: DateTime<Utc>,
        scheduled_delivery_at: Option<DateTime<Utc>>,
        items: Vec<OrderItem>,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            order_number: Self::generate_order_number(&id, now),
            customer_id,
            outlet_id,
            status: OrderStatus::WaitingForPickup,
            payment_status: PaymentStatus::WaitingPayment,
            items,
            total_weight_kg: 0.0,
            total_price: 0,
            delivery_fee: 0,
            delivery_address,
            scheduled_pickup_at,
            actual_pickup_at: None,
            scheduled_delivery_at,
            actual_delivery_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable order number: WL-{date}-{short id}
    fn generate_order_number(id: &Uuid, now: DateTime<Utc>) -> String {
        let short = id.simple().to_string()[..8].to_uppercase();
        format!("WL-{}-{}", now.format("%Y%m%d"), short)
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn mark_paid(&mut self) {
        self.payment_status = PaymentStatus::Paid;
        self.updated_at = Utc::now();
    }

    /// Declared quantity for a catalogued item, by case-insensitive name.
    pub fn catalogued_quantity(&self, name: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.name.eq_ignore_ascii_case(name))
            .map(|i| i.quantity)
            .sum()
    }
}
