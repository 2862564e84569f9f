pub mod address;
pub mod bypass;
pub mod employee;
pub mod events;
pub mod job;
pub mod order;
pub mod work;

pub use address::{CustomerAddress, DeliveryAddress, GeoPoint, Outlet};
pub use bypass::{BypassRequest, BypassStatus};
pub use employee::{Employee, Role};
pub use job::{Job, JobStatus, JobType};
pub use order::{Order, OrderItem, OrderStatus, PaymentStatus};
pub use work::{OrderWorkProcess, WorkerType};
