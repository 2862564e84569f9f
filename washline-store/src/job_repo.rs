use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use washline_core::repository::{ClaimOutcome, JobRepository};
use washline_domain::job::{Job, JobStatus, JobType};

pub struct StoreJobRepository {
    pool: PgPool,
}

impl StoreJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    order_id: Uuid,
    job_type: String,
    status: String,
    employee_id: Option<Uuid>,
    photos: Value,
    notes: Option<String>,
    claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobRow {
    fn into_job(self) -> Result<Job, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Job {
            id: self.id,
            order_id: self.order_id,
            job_type: self.job_type.parse::<JobType>()?,
            status: self.status.parse()?,
            employee_id: self.employee_id,
            photos: serde_json::from_value(self.photos)?,
            notes: self.notes,
            claimed_at: self.claimed_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, order_id, job_type, status, employee_id, photos, notes, \
    claimed_at, started_at, completed_at, created_at, updated_at";

#[async_trait]
impl JobRepository for StoreJobRepository {
    async fn insert_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, order_id, job_type, status, employee_id, photos, notes,
                claimed_at, started_at, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(job.id)
        .bind(job.order_id)
        .bind(job.job_type.as_str())
        .bind(job.status.as_str())
        .bind(job.employee_id)
        .bind(serde_json::to_value(&job.photos)?)
        .bind(&job.notes)
        .bind(job.claimed_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_job(
        &self,
        id: Uuid,
    ) -> Result<Option<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(JobRow::into_job).transpose()
    }

    /// The claim race is settled here, by one conditional UPDATE keyed on the
    /// expected previous status. Whichever driver's statement matches the
    /// `Pending` row first wins; everyone else affects zero rows and observes
    /// the job already assigned.
    async fn claim_job(
        &self,
        job_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'Assigned', employee_id = $2, claimed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'Pending'
            "#,
        )
        .bind(job_id)
        .bind(driver_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            let job = self
                .get_job(job_id)
                .await?
                .ok_or("claimed job vanished before readback")?;
            return Ok(ClaimOutcome::Claimed(job));
        }

        match self.get_job(job_id).await? {
            Some(_) => Ok(ClaimOutcome::AlreadyClaimed),
            None => Ok(ClaimOutcome::NotFound),
        }
    }

    async fn save_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE jobs SET status = $2, employee_id = $3, photos = $4, notes = $5,
                claimed_at = $6, started_at = $7, completed_at = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.employee_id)
        .bind(serde_json::to_value(&job.photos)?)
        .bind(&job.notes)
        .bind(job.claimed_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_jobs(
        &self,
        status: JobStatus,
        job_type: Option<JobType>,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<JobRow> = match job_type {
            Some(job_type) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM jobs WHERE status = $1 AND job_type = $2 ORDER BY created_at",
                    JOB_COLUMNS
                ))
                .bind(status.as_str())
                .bind(job_type.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM jobs WHERE status = $1 ORDER BY created_at",
                    JOB_COLUMNS
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn list_jobs_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {} FROM jobs WHERE order_id = $1 ORDER BY created_at",
            JOB_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobRow::into_job).collect()
    }
}
