use async_trait::async_trait;
use uuid::Uuid;

use washline_domain::address::{CustomerAddress, Outlet};
use washline_domain::bypass::BypassRequest;
use washline_domain::job::{Job, JobStatus, JobType};
use washline_domain::order::{Order, OrderStatus};
use washline_domain::work::{OrderWorkProcess, WorkerType};

/// Outcome of a claim attempt. A lost race must be distinguishable from a
/// missing row so the driver app can tell "taken" apart from "gone".
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// This caller won; the returned job is already bound to them.
    Claimed(Job),
    /// Another driver holds the job (or it is past claiming).
    AlreadyClaimed,
    NotFound,
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Full-row save; the engine owns the mutation, the store persists it.
    async fn save_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_orders_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for transport jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_job(
        &self,
        id: Uuid,
    ) -> Result<Option<Job>, Box<dyn std::error::Error + Send + Sync>>;

    /// The single correctness-critical primitive of job dispatch: one
    /// conditional update keyed on `status = Pending`. Implementations MUST
    /// make the status check and the driver binding one atomic step —
    /// concurrent claimers may both reach this call, and exactly one may win.
    async fn claim_job(
        &self,
        job_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn save_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_jobs(
        &self,
        status: JobStatus,
        job_type: Option<JobType>,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_jobs_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for station work processes.
#[async_trait]
pub trait WorkProcessRepository: Send + Sync {
    async fn insert_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_process(
        &self,
        id: Uuid,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>>;

    async fn save_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// The open (not completed, not superseded) process for one station, if
    /// any. The engine guarantees at most one exists.
    async fn open_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>>;

    /// Most recently started process for one station, open or not.
    async fn latest_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_processes_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for bypass requests.
#[async_trait]
pub trait BypassRepository: Send + Sync {
    async fn insert_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_bypass(
        &self,
        id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>>;

    async fn save_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Most recent request raised from one work process.
    async fn latest_for_process(
        &self,
        work_process_id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_pending(
        &self,
    ) -> Result<Vec<BypassRequest>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for saved customer addresses.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn get_address(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerAddress>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for outlet lookups.
#[async_trait]
pub trait OutletRepository: Send + Sync {
    async fn get_outlet(
        &self,
        id: Uuid,
    ) -> Result<Option<Outlet>, Box<dyn std::error::Error + Send + Sync>>;
}
