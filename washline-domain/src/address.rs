use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Address snapshot embedded on the order at creation time, so later address
/// edits never rewrite delivery history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub line: String,
    pub district: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl DeliveryAddress {
    pub fn geo_point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

/// Saved customer address; ownership is checked when an order is created
/// against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub line: String,
    pub district: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl CustomerAddress {
    pub fn to_delivery_address(&self) -> DeliveryAddress {
        DeliveryAddress {
            line: self.line.clone(),
            district: self.district.clone(),
            city: self.city.clone(),
            province: self.province.clone(),
            postal_code: self.postal_code.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// The laundry outlet an order is processed by; its coordinates anchor the
/// delivery-fee distance calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlet {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Outlet {
    pub fn geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}
