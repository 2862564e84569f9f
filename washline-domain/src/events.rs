use uuid::Uuid;

use crate::job::JobType;
use crate::work::WorkerType;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub outlet_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub from: String,
    pub to: String,
    pub actor_role: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct JobClaimedEvent {
    pub job_id: Uuid,
    pub order_id: Uuid,
    pub job_type: JobType,
    pub employee_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct JobCompletedEvent {
    pub job_id: Uuid,
    pub order_id: Uuid,
    pub job_type: JobType,
    pub employee_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BypassRaisedEvent {
    pub bypass_id: Uuid,
    pub order_id: Uuid,
    pub worker_type: WorkerType,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BypassResolvedEvent {
    pub bypass_id: Uuid,
    pub order_id: Uuid,
    pub approved: bool,
    pub resolved_by: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderAutoConfirmedEvent {
    pub order_id: Uuid,
    pub delivered_at: i64,
    pub timestamp: i64,
}
