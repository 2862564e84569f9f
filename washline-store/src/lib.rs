pub mod address_repo;
pub mod app_config;
pub mod bypass_repo;
pub mod database;
pub mod events;
pub mod job_repo;
pub mod order_repo;
pub mod work_repo;

pub use address_repo::{StoreAddressRepository, StoreOutletRepository};
pub use bypass_repo::StoreBypassRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use job_repo::StoreJobRepository;
pub use order_repo::StoreOrderRepository;
pub use work_repo::StoreWorkProcessRepository;
