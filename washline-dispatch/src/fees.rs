use serde::{Deserialize, Serialize};

use washline_domain::address::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Delivery pricing knobs, sourced from the outlet's business rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPricing {
    /// Flat component, integer currency units.
    pub base_fee: i64,
    /// Per-kilometer component, integer currency units.
    pub per_km_fee: i64,
    /// Maximum distance the outlet delivers to, in kilometers.
    pub service_radius_km: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FeeError {
    #[error("Address is {distance_km} km away, outside the {service_radius_km} km service radius")]
    OutOfServiceRadius {
        distance_km: f64,
        service_radius_km: f64,
    },
}

/// Great-circle (haversine) distance in kilometers, rounded to 2 decimals.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let d = 2.0 * EARTH_RADIUS_KM * h.sqrt().asin();

    (d * 100.0).round() / 100.0
}

/// Delivery fee for a distance already computed by [`distance_km`].
///
/// Outside the service radius no fee exists and no delivery job may be
/// created; the caller must surface the error instead of inventing a job it
/// cannot fulfill.
pub fn delivery_fee(distance_km: f64, pricing: &DeliveryPricing) -> Result<i64, FeeError> {
    if distance_km > pricing.service_radius_km {
        return Err(FeeError::OutOfServiceRadius {
            distance_km,
            service_radius_km: pricing.service_radius_km,
        });
    }
    let fee = pricing.base_fee as f64 + distance_km * pricing.per_km_fee as f64;
    Ok(fee.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing() -> DeliveryPricing {
        DeliveryPricing {
            base_fee: 5000,
            per_km_fee: 1500,
            service_radius_km: 10.0,
        }
    }

    #[test]
    fn test_distance_of_identical_points_is_zero() {
        let p = GeoPoint::new(-6.2001, 106.8166);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(-6.2001, 106.8166);
        let b = GeoPoint::new(-6.1214, 106.7741);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn test_known_distance() {
        // Jakarta Monas to Kota Tua, roughly 4.6 km by great circle.
        let monas = GeoPoint::new(-6.1754, 106.8272);
        let kota_tua = GeoPoint::new(-6.1352, 106.8133);
        let d = distance_km(monas, kota_tua);
        assert!((4.0..5.5).contains(&d), "got {}", d);
    }

    #[test]
    fn test_fee_is_monotonic_in_distance() {
        let pricing = pricing();
        let mut last = 0;
        for tenth_km in 0..=100 {
            let d = tenth_km as f64 / 10.0;
            let fee = delivery_fee(d, &pricing).unwrap();
            assert!(fee >= last, "fee decreased at {} km", d);
            last = fee;
        }
    }

    #[test]
    fn test_fee_rounds_to_nearest_unit() {
        let pricing = pricing();
        // 5000 + 3.33 * 1500 = 9995
        assert_eq!(delivery_fee(3.33, &pricing).unwrap(), 9995);
        // 5000 + 0.03 * 1500 = 5045
        assert_eq!(delivery_fee(0.03, &pricing).unwrap(), 5045);
    }

    #[test]
    fn test_outside_radius_never_produces_fee() {
        let pricing = pricing();
        let err = delivery_fee(12.0, &pricing).unwrap_err();
        assert_eq!(
            err,
            FeeError::OutOfServiceRadius {
                distance_km: 12.0,
                service_radius_km: 10.0
            }
        );
        // Boundary itself is still serviceable.
        assert!(delivery_fee(10.0, &pricing).is_ok());
    }
}
