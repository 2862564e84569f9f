use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::work::WorkerType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BypassStatus {
    Pending,
    Approved,
    Rejected,
}

impl BypassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassStatus::Pending => "Pending",
            BypassStatus::Approved => "Approved",
            BypassStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for BypassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BypassStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BypassStatus::Pending),
            "Approved" => Ok(BypassStatus::Approved),
            "Rejected" => Ok(BypassStatus::Rejected),
            other => Err(format!("unknown bypass status: {}", other)),
        }
    }
}

/// Escalation raised when a station's verified count mismatches the order's
/// catalogued items. Immutable after resolution; a re-verification cycle
/// creates a new OrderWorkProcess, never a new request on the same process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BypassRequest {
    pub id: Uuid,
    pub work_process_id: Uuid,
    pub order_id: Uuid,
    pub worker_type: WorkerType,
    pub reason: String,
    /// Mandatory once resolved, None while pending.
    pub admin_note: Option<String>,
    pub status: BypassStatus,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl BypassRequest {
    pub fn new(
        work_process_id: Uuid,
        order_id: Uuid,
        worker_type: WorkerType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_process_id,
            order_id,
            worker_type,
            reason: reason.into(),
            admin_note: None,
            status: BypassStatus::Pending,
            resolved_by: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn resolve(&mut self, approved: bool, admin_note: String, resolved_by: Uuid) {
        self.status = if approved {
            BypassStatus::Approved
        } else {
            BypassStatus::Rejected
        };
        self.admin_note = Some(admin_note);
        self.resolved_by = Some(resolved_by);
        self.resolved_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_stamps_fields() {
        let mut request = BypassRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            WorkerType::Washing,
            "two shirts short",
        );
        assert_eq!(request.status, BypassStatus::Pending);

        let admin = Uuid::new_v4();
        request.resolve(false, "recount needed".into(), admin);
        assert_eq!(request.status, BypassStatus::Rejected);
        assert_eq!(request.resolved_by, Some(admin));
        assert!(request.resolved_at.is_some());
    }
}
