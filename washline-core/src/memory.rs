use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use washline_domain::address::{CustomerAddress, Outlet};
use washline_domain::bypass::BypassRequest;
use washline_domain::job::{Job, JobStatus, JobType};
use washline_domain::order::{Order, OrderStatus};
use washline_domain::work::{OrderWorkProcess, WorkerType};

use crate::repository::{
    AddressRepository, BypassRepository, ClaimOutcome, JobRepository, OrderRepository,
    OutletRepository, WorkProcessRepository,
};

/// Reference implementation of every repository trait over mutex-guarded
/// maps. Backs the engine's tests and embedders that need no database; the
/// claim compare-and-set happens inside a single lock acquisition, giving the
/// same exactly-one-winner guarantee the SQL repository gets from its
/// conditional UPDATE.
#[derive(Default)]
pub struct InMemoryStore {
    orders: Mutex<HashMap<Uuid, Order>>,
    jobs: Mutex<HashMap<Uuid, Job>>,
    processes: Mutex<HashMap<Uuid, OrderWorkProcess>>,
    bypasses: Mutex<HashMap<Uuid, BypassRequest>>,
    addresses: Mutex<HashMap<Uuid, CustomerAddress>>,
    outlets: Mutex<HashMap<Uuid, Outlet>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_address(&self, address: CustomerAddress) {
        lock(&self.addresses).insert(address.id, address);
    }

    pub fn seed_outlet(&self, outlet: Outlet) {
        lock(&self.outlets).insert(outlet.id, outlet);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned map is still structurally sound; keep serving.
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.orders).insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.orders).get(&id).cloned())
    }

    async fn save_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.orders).insert(order.id, order.clone());
        Ok(())
    }

    async fn list_orders_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let mut orders: Vec<Order> = lock(&self.orders)
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let mut orders: Vec<Order> = lock(&self.orders)
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn insert_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.jobs).insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(
        &self,
        id: Uuid,
    ) -> Result<Option<Job>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.jobs).get(&id).cloned())
    }

    async fn claim_job(
        &self,
        job_id: Uuid,
        driver_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut jobs = lock(&self.jobs);
        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if job.status != JobStatus::Pending {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        job.status = JobStatus::Assigned;
        job.employee_id = Some(driver_id);
        job.claimed_at = Some(Utc::now());
        job.updated_at = Utc::now();
        Ok(ClaimOutcome::Claimed(job.clone()))
    }

    async fn save_job(
        &self,
        job: &Job,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.jobs).insert(job.id, job.clone());
        Ok(())
    }

    async fn list_jobs(
        &self,
        status: JobStatus,
        job_type: Option<JobType>,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let mut jobs: Vec<Job> = lock(&self.jobs)
            .values()
            .filter(|j| j.status == status && job_type.map_or(true, |t| j.job_type == t))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn list_jobs_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Job>, Box<dyn std::error::Error + Send + Sync>> {
        let mut jobs: Vec<Job> = lock(&self.jobs)
            .values()
            .filter(|j| j.order_id == order_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }
}

#[async_trait]
impl WorkProcessRepository for InMemoryStore {
    async fn insert_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.processes).insert(process.id, process.clone());
        Ok(())
    }

    async fn get_process(
        &self,
        id: Uuid,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.processes).get(&id).cloned())
    }

    async fn save_process(
        &self,
        process: &OrderWorkProcess,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.processes).insert(process.id, process.clone());
        Ok(())
    }

    async fn open_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.processes)
            .values()
            .find(|p| p.order_id == order_id && p.worker_type == worker_type && p.is_open())
            .cloned())
    }

    async fn latest_process(
        &self,
        order_id: Uuid,
        worker_type: WorkerType,
    ) -> Result<Option<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.processes)
            .values()
            .filter(|p| p.order_id == order_id && p.worker_type == worker_type)
            .max_by_key(|p| p.started_at)
            .cloned())
    }

    async fn list_processes_by_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderWorkProcess>, Box<dyn std::error::Error + Send + Sync>> {
        let mut processes: Vec<OrderWorkProcess> = lock(&self.processes)
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        processes.sort_by_key(|p| p.started_at);
        Ok(processes)
    }
}

#[async_trait]
impl BypassRepository for InMemoryStore {
    async fn insert_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.bypasses).insert(request.id, request.clone());
        Ok(())
    }

    async fn get_bypass(
        &self,
        id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.bypasses).get(&id).cloned())
    }

    async fn save_bypass(
        &self,
        request: &BypassRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        lock(&self.bypasses).insert(request.id, request.clone());
        Ok(())
    }

    async fn latest_for_process(
        &self,
        work_process_id: Uuid,
    ) -> Result<Option<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.bypasses)
            .values()
            .filter(|b| b.work_process_id == work_process_id)
            .max_by_key(|b| b.created_at)
            .cloned())
    }

    async fn list_pending(
        &self,
    ) -> Result<Vec<BypassRequest>, Box<dyn std::error::Error + Send + Sync>> {
        let mut pending: Vec<BypassRequest> = lock(&self.bypasses)
            .values()
            .filter(|b| b.status == washline_domain::bypass::BypassStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|b| b.created_at);
        Ok(pending)
    }
}

#[async_trait]
impl AddressRepository for InMemoryStore {
    async fn get_address(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerAddress>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.addresses).get(&id).cloned())
    }
}

#[async_trait]
impl OutletRepository for InMemoryStore {
    async fn get_outlet(
        &self,
        id: Uuid,
    ) -> Result<Option<Outlet>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(lock(&self.outlets).get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use washline_domain::job::JobType;

    #[tokio::test]
    async fn test_claim_is_first_wins() {
        let store = InMemoryStore::new();
        let job = Job::new(Uuid::new_v4(), JobType::Pickup);
        store.insert_job(&job).await.unwrap();

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        match store.claim_job(job.id, first).await.unwrap() {
            ClaimOutcome::Claimed(j) => assert_eq!(j.employee_id, Some(first)),
            other => panic!("expected first claim to win, got {:?}", other),
        }
        assert!(matches!(
            store.claim_job(job.id, second).await.unwrap(),
            ClaimOutcome::AlreadyClaimed
        ));
        assert!(matches!(
            store.claim_job(Uuid::new_v4(), second).await.unwrap(),
            ClaimOutcome::NotFound
        ));
    }
}
