use geo::Point;
use std::fmt;

/// Mean earth radius used by the great-circle computation, kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// Latitude or longitude outside the valid range, or not a finite number
    OutOfRange { lat: f64, lng: f64 },
    /// A result limit that must be positive was zero
    ZeroLimit,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::OutOfRange { lat, lng } => write!(
                f,
                "coordinate out of range: lat {} must be in [-90, 90], lng {} must be in [-180, 180]",
                lat, lng
            ),
            GeoError::ZeroLimit => write!(f, "result limit must be a positive integer"),
        }
    }
}

impl std::error::Error for GeoError {}

/// Checks a point is finite and within lat [-90, 90], lng [-180, 180].
/// The loader runs this before a hub enters the dataset so the distance
/// math never sees a bad coordinate.
pub fn validate(point: Point<f64>) -> Result<(), GeoError> {
    let (lng, lat) = (point.x(), point.y());
    if lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(GeoError::OutOfRange { lat, lng })
    }
}

/// Great-circle distance between two points in kilometres, haversine on a
/// sphere of radius `EARTH_RADIUS_KM`. Symmetric, and zero for identical
/// points. Out-of-range input is an error rather than a nonsense distance.
pub fn distance_km(a: Point<f64>, b: Point<f64>) -> Result<f64, GeoError> {
    validate(a)?;
    validate(b)?;
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.y().to_radians().cos() * b.y().to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Ok(EARTH_RADIUS_KM * c)
}
