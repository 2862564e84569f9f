use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use washline_core::repository::OrderRepository;
use washline_domain::address::DeliveryAddress;
use washline_domain::order::{Order, OrderStatus};

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_id: Uuid,
    outlet_id: Uuid,
    status: String,
    payment_status: String,
    items: Value,
    total_weight_kg: f64,
    total_price: i64,
    delivery_fee: i64,
    address_line: String,
    address_district: String,
    address_city: String,
    address_province: String,
    address_postal_code: String,
    address_lat: Option<f64>,
    address_lng: Option<f64>,
    scheduled_pickup_at: chrono::DateTime<chrono::Utc>,
    actual_pickup_at: Option<chrono::DateTime<chrono::Utc>>,
    scheduled_delivery_at: Option<chrono::DateTime<chrono::Utc>>,
    actual_delivery_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            outlet_id: self.outlet_id,
            status: self.status.parse::<OrderStatus>()?,
            payment_status: self.payment_status.parse()?,
            items: serde_json::from_value(self.items)?,
            total_weight_kg: self.total_weight_kg,
            total_price: self.total_price,
            delivery_fee: self.delivery_fee,
            delivery_address: DeliveryAddress {
                line: self.address_line,
                district: self.address_district,
                city: self.address_city,
                province: self.address_province,
                postal_code: self.address_postal_code,
                lat: self.address_lat,
                lng: self.address_lng,
            },
            scheduled_pickup_at: self.scheduled_pickup_at,
            actual_pickup_at: self.actual_pickup_at,
            scheduled_delivery_at: self.scheduled_delivery_at,
            actual_delivery_at: self.actual_delivery_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, order_number, customer_id, outlet_id, status, payment_status, \
    items, total_weight_kg, total_price, delivery_fee, address_line, address_district, \
    address_city, address_province, address_postal_code, address_lat, address_lng, \
    scheduled_pickup_at, actual_pickup_at, scheduled_delivery_at, actual_delivery_at, \
    created_at, updated_at";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn insert_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, outlet_id, status, payment_status,
                items, total_weight_kg, total_price, delivery_fee, address_line, address_district,
                address_city, address_province, address_postal_code, address_lat, address_lng,
                scheduled_pickup_at, actual_pickup_at, scheduled_delivery_at, actual_delivery_at,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.outlet_id)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.total_weight_kg)
        .bind(order.total_price)
        .bind(order.delivery_fee)
        .bind(&order.delivery_address.line)
        .bind(&order.delivery_address.district)
        .bind(&order.delivery_address.city)
        .bind(&order.delivery_address.province)
        .bind(&order.delivery_address.postal_code)
        .bind(order.delivery_address.lat)
        .bind(order.delivery_address.lng)
        .bind(order.scheduled_pickup_at)
        .bind(order.actual_pickup_at)
        .bind(order.scheduled_delivery_at)
        .bind(order.actual_delivery_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn save_order(
        &self,
        order: &Order,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE orders SET status = $2, payment_status = $3, items = $4, total_weight_kg = $5,
                total_price = $6, delivery_fee = $7, actual_pickup_at = $8,
                scheduled_delivery_at = $9, actual_delivery_at = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(serde_json::to_value(&order.items)?)
        .bind(order.total_weight_kg)
        .bind(order.total_price)
        .bind(order.delivery_fee)
        .bind(order.actual_pickup_at)
        .bind(order.scheduled_delivery_at)
        .bind(order.actual_delivery_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_orders_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY created_at",
            ORDER_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE status = $1 ORDER BY created_at",
            ORDER_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
