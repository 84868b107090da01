//! Home-base geofencing: great-circle distance plus a closed-disk check.

use crate::domain::model::{GeofenceStatus, GeofenceZone, LocationPoint, ZoneStatus};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two lat/lon pairs (decimal degrees).
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn distance(a: &LocationPoint, b: &LocationPoint) -> f64 {
    haversine_meters(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

pub fn distance_to_center(point: &LocationPoint, zone: &GeofenceZone) -> f64 {
    haversine_meters(
        point.latitude(),
        point.longitude(),
        zone.center_latitude(),
        zone.center_longitude(),
    )
}

/// Boundary counts as inside.
pub fn is_inside(point: &LocationPoint, zone: &GeofenceZone) -> bool {
    distance_to_center(point, zone) <= zone.radius_meters()
}

pub fn has_left_zone(point: &LocationPoint, zone: &GeofenceZone) -> bool {
    !is_inside(point, zone)
}

/// Classifies on the unrounded distance; only the reported distance is rounded.
pub fn evaluate(point: &LocationPoint, zone: &GeofenceZone) -> GeofenceStatus {
    let distance = distance_to_center(point, zone);
    // both inputs are validated on construction, so the distance is finite
    debug_assert!(distance.is_finite(), "non-finite geofence distance");
    let is_inside = distance <= zone.radius_meters();

    GeofenceStatus {
        distance_meters: distance.round() as i64,
        is_inside,
        has_left: !is_inside,
        status: if is_inside {
            ZoneStatus::AtBase
        } else {
            ZoneStatus::InField
        },
    }
}
