use async_trait::async_trait;
use uuid::Uuid;

/// Seam to the payment provider. The engine only tracks a payment status and
/// gates delivery on it; charging, capture and refunds belong to the
/// provider integration behind this trait.
#[async_trait]
pub trait PaymentGate: Send + Sync {
    /// Whether the provider has settled the full amount for this order.
    async fn verify_paid(
        &self,
        order_id: Uuid,
        amount: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Gate that treats every order as settled. Used by tests and local runs.
pub struct MockPaymentGate;

#[async_trait]
impl PaymentGate for MockPaymentGate {
    async fn verify_paid(
        &self,
        order_id: Uuid,
        amount: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("Mock payment gate settling order {} for {}", order_id, amount);
        Ok(true)
    }
}

/// Gate that refuses everything; exercises the payment-required path.
pub struct DecliningPaymentGate;

#[async_trait]
impl PaymentGate for DecliningPaymentGate {
    async fn verify_paid(
        &self,
        _order_id: Uuid,
        _amount: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(false)
    }
}
