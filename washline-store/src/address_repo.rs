use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use washline_core::repository::{AddressRepository, OutletRepository};
use washline_domain::address::{CustomerAddress, Outlet};

pub struct StoreAddressRepository {
    pool: PgPool,
}

impl StoreAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    customer_id: Uuid,
    line: String,
    district: String,
    city: String,
    province: String,
    postal_code: String,
    lat: Option<f64>,
    lng: Option<f64>,
}

#[async_trait]
impl AddressRepository for StoreAddressRepository {
    async fn get_address(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerAddress>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<AddressRow> = sqlx::query_as(
            "SELECT id, customer_id, line, district, city, province, postal_code, lat, lng \
             FROM customer_addresses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CustomerAddress {
            id: r.id,
            customer_id: r.customer_id,
            line: r.line,
            district: r.district,
            city: r.city,
            province: r.province,
            postal_code: r.postal_code,
            lat: r.lat,
            lng: r.lng,
        }))
    }
}

pub struct StoreOutletRepository {
    pool: PgPool,
}

impl StoreOutletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OutletRow {
    id: Uuid,
    name: String,
    lat: f64,
    lng: f64,
}

#[async_trait]
impl OutletRepository for StoreOutletRepository {
    async fn get_outlet(
        &self,
        id: Uuid,
    ) -> Result<Option<Outlet>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<OutletRow> =
            sqlx::query_as("SELECT id, name, lat, lng FROM outlets WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| Outlet {
            id: r.id,
            name: r.name,
            lat: r.lat,
            lng: r.lng,
        }))
    }
}
