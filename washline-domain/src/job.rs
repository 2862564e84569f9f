use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Transport job lifecycle. `Pending → Assigned → InProgress → Completed`,
/// with `Cancelled` reachable from `Pending`/`Assigned` only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Assigned => "Assigned",
            JobStatus::InProgress => "InProgress",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(JobStatus::Pending),
            "Assigned" => Ok(JobStatus::Assigned),
            "InProgress" => Ok(JobStatus::InProgress),
            "Completed" => Ok(JobStatus::Completed),
            "Cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    Pickup,
    Delivery,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Pickup => "Pickup",
            JobType::Delivery => "Delivery",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pickup" => Ok(JobType::Pickup),
            "Delivery" => Ok(JobType::Delivery),
            other => Err(format!("unknown job type: {}", other)),
        }
    }
}

/// A pickup or delivery assignment claimed by exactly one driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub order_id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    /// None until a driver wins the claim.
    pub employee_id: Option<Uuid>,
    pub photos: Vec<String>,
    pub notes: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(order_id: Uuid, job_type: JobType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            job_type,
            status: JobStatus::Pending,
            employee_id: None,
            photos: Vec::new(),
            notes: None,
            claimed_at: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_assigned_to(&self, employee_id: Uuid) -> bool {
        self.employee_id == Some(employee_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_unassigned_pending() {
        let job = Job::new(Uuid::new_v4(), JobType::Pickup);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.employee_id.is_none());
        assert!(!job.is_assigned_to(Uuid::new_v4()));
    }

    #[test]
    fn test_job_status_literals() {
        assert_eq!(JobStatus::InProgress.as_str(), "InProgress");
        let parsed: JobStatus = "Cancelled".parse().unwrap();
        assert_eq!(parsed, JobStatus::Cancelled);
        assert!(parsed.is_terminal());
    }
}
