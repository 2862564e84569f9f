use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use washline_core::repository::BypassRepository;
use washline_domain::bypass::{BypassRequest, BypassStatus};
use washline_domain::work::WorkerType;

pub struct StoreBypassRepository {
    pool: PgPool,
}

impl StoreBypassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BypassRow {
    id: Uuid,
    work_process_id: Uuid,
    order_id: Uuid,
    worker_type: String,
    reason: String,
    admin_note: Option<String>,
    status: String,
    resolved_by: Option<Uuid>,
    created_at: chrono::DateTime<chrono::Utc>,
    resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl BypassRow {
    fn into_request(self) -> Result<BypassRequest, Box<dyn std::error::Error + Send + Sync>> {
        Ok(BypassRequest {
            id: self.id,
            work_process_id: self.work_process_id,
            order_id: self.order_id,
            worker_type: self.worker_type.parse::<WorkerType>()?,
            reason: self.reason,
            admin_note: self.admin_note,
            status: self.status.parse::<BypassStatus>()?,
            resolved_by: self.resolved_by,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        })
    }
}

const BYPASS_COLUMNS: &str = "id, work_process_id, order_id, worker_type, reason, admin_note, \
    status, resolved_by, created_at, resolved_at";

#[async_trait]
impl BypassRepository for StoreBypassRepository {
    async fn insert_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO bypass_requests (id, work_process_id, order_id, worker_type, reason,
                admin_note, status, resolved_by, created_at, resolved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(request.work_process_id)
        .bind(request.order_id)
        .bind(request.worker_type.as_str())
        .bind(&request.reason)
        .bind(&request.admin_note)
        .bind(request.status.as_str())
        .bind(request.resolved_by)
        .bind(request.created_at)
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_bypass(
        &self,
        id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<BypassRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bypass_requests WHERE id = $1",
            BYPASS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BypassRow::into_request).transpose()
    }

    async fn save_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE bypass_requests SET admin_note = $2, status = $3, resolved_by = $4,
                resolved_at = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(&request.admin_note)
        .bind(request.status.as_str())
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_for_process(
        &self,
        work_process_id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<BypassRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bypass_requests \
             WHERE work_process_id = $1 ORDER BY created_at DESC LIMIT 1",
            BYPASS_COLUMNS
        ))
        .bind(work_process_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BypassRow::into_request).transpose()
    }

    async fn list_pending(
        &self,
    ) -> Result<Vec<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<BypassRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bypass_requests WHERE status = 'Pending' ORDER BY created_at",
            BYPASS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BypassRow::into_request).collect()
    }
}
