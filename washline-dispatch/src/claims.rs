use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use washline_core::events::{topics, EventSink};
use washline_core::identity::{Actor, ActorRole};
use washline_core::repository::{ClaimOutcome, JobRepository};
use washline_domain::events::{JobClaimedEvent, JobCompletedEvent};
use washline_domain::job::{Job, JobStatus, JobType};

/// Exclusive assignment of transport jobs to drivers.
///
/// Only the job records are touched here; the order-side transition for each
/// action is applied by the state machine that composes this registry.
pub struct JobClaimRegistry {
    jobs: Arc<dyn JobRepository>,
    events: Arc<dyn EventSink>,
}

impl JobClaimRegistry {
    pub fn new(jobs: Arc<dyn JobRepository>, events: Arc<dyn EventSink>) -> Self {
        Self { jobs, events }
    }

    /// Claim a `Pending` job for the calling driver. The status check and the
    /// driver binding are one compare-and-set in the repository, so of any
    /// number of concurrent claimers exactly one wins.
    pub async fn claim(&self, actor: &Actor, job_id: Uuid) -> Result<Job, ClaimError> {
        require_driver(actor)?;

        let job = match self.jobs.claim_job(job_id, actor.id).await? {
            ClaimOutcome::Claimed(job) => job,
            ClaimOutcome::AlreadyClaimed => return Err(ClaimError::AlreadyClaimed),
            ClaimOutcome::NotFound => return Err(ClaimError::NotFound(job_id)),
        };

        tracing::info!(
            "Driver {} claimed {} job {} for order {}",
            actor.id,
            job.job_type,
            job.id,
            job.order_id
        );
        let event = JobClaimedEvent {
            job_id: job.id,
            order_id: job.order_id,
            job_type: job.job_type,
            employee_id: actor.id,
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::JOB_CLAIMED, &job.order_id.to_string(), &payload)
                .await;
        }

        Ok(job)
    }

    /// Begin the transport leg. Requires the job to be `Assigned` to the
    /// caller.
    pub async fn start(&self, actor: &Actor, job_id: Uuid) -> Result<Job, ClaimError> {
        require_driver(actor)?;
        let mut job = self.owned_job(actor, job_id).await?;

        if job.status != JobStatus::Assigned {
            return Err(ClaimError::InvalidJobState {
                status: job.status,
                action: "start",
            });
        }
        job.status = JobStatus::InProgress;
        job.started_at = Some(Utc::now());
        job.updated_at = Utc::now();
        self.jobs.save_job(&job).await?;
        Ok(job)
    }

    /// Record the driver's arrival. Arrival does not move the job's own
    /// status; it exists so the order machine can mirror where the driver is.
    pub async fn arrive(&self, actor: &Actor, job_id: Uuid) -> Result<Job, ClaimError> {
        require_driver(actor)?;
        let job = self.owned_job(actor, job_id).await?;

        if !matches!(job.status, JobStatus::Assigned | JobStatus::InProgress) {
            return Err(ClaimError::InvalidJobState {
                status: job.status,
                action: "arrive",
            });
        }
        Ok(job)
    }

    /// Complete an `InProgress` job with proof photos and notes.
    pub async fn complete(
        &self,
        actor: &Actor,
        job_id: Uuid,
        photos: Vec<String>,
        notes: Option<String>,
    ) -> Result<Job, ClaimError> {
        require_driver(actor)?;
        let mut job = self.owned_job(actor, job_id).await?;

        if job.status != JobStatus::InProgress {
            return Err(ClaimError::InvalidJobState {
                status: job.status,
                action: "complete",
            });
        }
        job.status = JobStatus::Completed;
        job.photos = photos;
        job.notes = notes;
        job.completed_at = Some(Utc::now());
        job.updated_at = Utc::now();
        self.jobs.save_job(&job).await?;

        let event = JobCompletedEvent {
            job_id: job.id,
            order_id: job.order_id,
            job_type: job.job_type,
            employee_id: actor.id,
            timestamp: Utc::now().timestamp(),
        };
        if let Ok(payload) = serde_json::to_string(&event) {
            let _ = self
                .events
                .publish(topics::JOB_COMPLETED, &job.order_id.to_string(), &payload)
                .await;
        }

        Ok(job)
    }

    /// Operational override: drop a job that no driver should run. Only
    /// `Pending` and `Assigned` jobs can be cancelled; completed work is
    /// immutable.
    pub async fn cancel(&self, actor: &Actor, job_id: Uuid) -> Result<Job, ClaimError> {
        if !matches!(actor.role, ActorRole::OutletAdmin | ActorRole::Admin) {
            return Err(ClaimError::NotAuthorized(actor.role));
        }
        let mut job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(ClaimError::NotFound(job_id))?;

        if !matches!(job.status, JobStatus::Pending | JobStatus::Assigned) {
            return Err(ClaimError::InvalidJobState {
                status: job.status,
                action: "cancel",
            });
        }
        job.status = JobStatus::Cancelled;
        job.updated_at = Utc::now();
        self.jobs.save_job(&job).await?;
        tracing::warn!("Job {} cancelled by {}", job.id, actor.id);
        Ok(job)
    }

    /// Claimable jobs for the driver app's board.
    pub async fn list_claimable(
        &self,
        actor: &Actor,
        job_type: Option<JobType>,
    ) -> Result<Vec<Job>, ClaimError> {
        require_driver(actor)?;
        Ok(self.jobs.list_jobs(JobStatus::Pending, job_type).await?)
    }

    async fn owned_job(&self, actor: &Actor, job_id: Uuid) -> Result<Job, ClaimError> {
        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(ClaimError::NotFound(job_id))?;
        if !job.is_assigned_to(actor.id) {
            return Err(ClaimError::NotAssignedToCaller);
        }
        Ok(job)
    }
}

fn require_driver(actor: &Actor) -> Result<(), ClaimError> {
    if actor.role != ActorRole::Driver {
        return Err(ClaimError::NotAuthorized(actor.role));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job already claimed by another driver")]
    AlreadyClaimed,

    #[error("Job is not assigned to the caller")]
    NotAssignedToCaller,

    #[error("Role {0} may not perform this job action")]
    NotAuthorized(washline_core::identity::ActorRole),

    #[error("Job in status {status} cannot {action}")]
    InvalidJobState {
        status: JobStatus,
        action: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] Box<dyn std::error::Error + Send + Sync>),
}
