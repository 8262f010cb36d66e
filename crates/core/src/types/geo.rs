//! Geographic point type.

use core::fmt;

use serde::Serialize;

/// Errors that can occur when parsing a [`GeoPoint`] from request text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    /// The value is not a finite number.
    #[error("{axis} must be a number (got {value:?})")]
    NotANumber {
        /// Which coordinate failed (`lng` or `lat`).
        axis: &'static str,
        /// The raw input.
        value: String,
    },
    /// The value is a number but outside the valid range for its axis.
    #[error("{axis} must be between -{max} and {max} (got {value})")]
    OutOfRange {
        /// Which coordinate failed (`lng` or `lat`).
        axis: &'static str,
        /// Maximum absolute value allowed.
        max: u8,
        /// The raw input.
        value: String,
    },
}

/// A WGS84 point, longitude first.
///
/// ## Examples
///
/// ```
/// use store_directory_core::GeoPoint;
///
/// let point = GeoPoint::parse("-79.38", "43.65").unwrap();
/// assert!((point.lng() + 79.38).abs() < f64::EPSILON);
///
/// assert!(GeoPoint::parse("abc", "43.65").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

impl GeoPoint {
    /// Maximum absolute longitude.
    pub const MAX_LNG: u8 = 180;
    /// Maximum absolute latitude.
    pub const MAX_LAT: u8 = 90;

    /// Create a point from already-validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is not finite or out of range.
    pub fn new(lng: f64, lat: f64) -> Result<Self, CoordinateError> {
        let lng = check_axis("lng", lng, Self::MAX_LNG, &lng.to_string())?;
        let lat = check_axis("lat", lat, Self::MAX_LAT, &lat.to_string())?;
        Ok(Self { lng, lat })
    }

    /// Parse a point from `lng`/`lat` text, as received from query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::NotANumber`] if either value fails to parse as
    /// a finite float, and [`CoordinateError::OutOfRange`] if it is outside the
    /// valid range for its axis.
    pub fn parse(lng: &str, lat: &str) -> Result<Self, CoordinateError> {
        Ok(Self {
            lng: parse_axis("lng", lng, Self::MAX_LNG)?,
            lat: parse_axis("lat", lat, Self::MAX_LAT)?,
        })
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

fn parse_axis(axis: &'static str, raw: &str, max: u8) -> Result<f64, CoordinateError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CoordinateError::NotANumber {
            axis,
            value: raw.to_owned(),
        })?;
    check_axis(axis, value, max, raw)
}

fn check_axis(axis: &'static str, value: f64, max: u8, raw: &str) -> Result<f64, CoordinateError> {
    if !value.is_finite() {
        return Err(CoordinateError::NotANumber {
            axis,
            value: raw.to_owned(),
        });
    }
    if value.abs() > f64::from(max) {
        return Err(CoordinateError::OutOfRange {
            axis,
            max,
            value: raw.to_owned(),
        });
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let p = GeoPoint::parse("-73.9857", "40.7484").unwrap();
        assert!((p.lng() - -73.9857).abs() < 1e-9);
        assert!((p.lat() - 40.7484).abs() < 1e-9);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(GeoPoint::parse(" 10.5 ", "\t20").is_ok());
    }

    #[test]
    fn test_parse_non_numeric_lng() {
        let err = GeoPoint::parse("abc", "40").unwrap_err();
        assert!(matches!(err, CoordinateError::NotANumber { axis: "lng", .. }));
    }

    #[test]
    fn test_parse_non_numeric_lat() {
        let err = GeoPoint::parse("10", "").unwrap_err();
        assert!(matches!(err, CoordinateError::NotANumber { axis: "lat", .. }));
    }

    #[test]
    fn test_parse_rejects_nan_and_infinity() {
        assert!(GeoPoint::parse("NaN", "0").is_err());
        assert!(GeoPoint::parse("0", "inf").is_err());
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(matches!(
            GeoPoint::parse("181", "0"),
            Err(CoordinateError::OutOfRange { axis: "lng", .. })
        ));
        assert!(matches!(
            GeoPoint::parse("0", "-90.5"),
            Err(CoordinateError::OutOfRange { axis: "lat", .. })
        ));
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GeoPoint::new(180.0, -90.0).is_ok());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }
}
