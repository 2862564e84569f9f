use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use washline_core::repository::WorkProcessRepository;
use washline_domain::work::{OrderWorkProcess, WorkerType};

pub struct StoreWorkProcessRepository {
    pool: PgPool,
}

impl StoreWorkProcessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProcessRow {
    id: Uuid,
    order_id: Uuid,
    worker_type: String,
    employee_id: Uuid,
    bypass_id: Option<Uuid>,
    verified_items: Value,
    mismatched: bool,
    superseded: bool,
    notes: Option<String>,
    started_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ProcessRow {
    fn into_process(self) -> Result<OrderWorkProcess, Box<dyn std::error::Error + Send + Sync>> {
        Ok(OrderWorkProcess {
            id: self.id,
            order_id: self.order_id,
            worker_type: self.worker_type.parse::<WorkerType>()?,
            employee_id: self.employee_id,
            bypass_id: self.bypass_id,
            verified_items: serde_json::from_value(self.verified_items)?,
            mismatched: self.mismatched,
            superseded: self.superseded,
            notes: self.notes,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

const PROCESS_COLUMNS: &str = "id, order_id, worker_type, employee_id, bypass_id, \
    verified_items, mismatched, superseded, notes, started_at, completed_at";

#[async_trait]
impl WorkProcessRepository for StoreWorkProcessRepository {
    async fn insert_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO work_processes (id, order_id, worker_type, employee_id, bypass_id,
                verified_items, mismatched, superseded, notes, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(process.id)
        .bind(process.order_id)
        .bind(process.worker_type.as_str())
        .bind(process.employee_id)
        .bind(process.bypass_id)
        .bind(serde_json::to_value(&process.verified_items)?)
        .bind(process.mismatched)
        .bind(process.superseded)
        .bind(&process.notes)
        .bind(process.started_at)
        .bind(process.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_process(
        &self,
        id: Uuid,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<ProcessRow> = sqlx::query_as(&format!(
            "SELECT {} FROM work_processes WHERE id = $1",
            PROCESS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProcessRow::into_process).transpose()
    }

    async fn save_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE work_processes SET bypass_id = $2, verified_items = $3, mismatched = $4,
                superseded = $5, notes = $6, completed_at = $7
            WHERE id = $1
            "#,
        )
        .bind(process.id)
        .bind(process.bypass_id)
        .bind(serde_json::to_value(&process.verified_items)?)
        .bind(process.mismatched)
        .bind(process.superseded)
        .bind(&process.notes)
        .bind(process.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn open_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<ProcessRow> = sqlx::query_as(&format!(
            "SELECT {} FROM work_processes \
             WHERE order_id = $1 AND worker_type = $2 AND completed_at IS NULL AND NOT superseded",
            PROCESS_COLUMNS
        ))
        .bind(order_id)
        .bind(worker_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProcessRow::into_process).transpose()
    }

    async fn latest_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<ProcessRow> = sqlx::query_as(&format!(
            "SELECT {} FROM work_processes \
             WHERE order_id = $1 AND worker_type = $2 ORDER BY started_at DESC LIMIT 1",
            PROCESS_COLUMNS
        ))
        .bind(order_id)
        .bind(worker_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProcessRow::into_process).transpose()
    }

    async fn list_processes_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<ProcessRow> = sqlx::query_as(&format!(
            "SELECT {} FROM work_processes WHERE order_id = $1 ORDER BY started_at",
            PROCESS_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProcessRow::into_process).collect()
    }
}
