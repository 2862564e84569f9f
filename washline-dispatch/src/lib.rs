pub mod claims;
pub mod fees;

pub use claims::{ClaimError, JobClaimRegistry};
pub use fees::{delivery_fee, distance_km, DeliveryPricing, FeeError};
