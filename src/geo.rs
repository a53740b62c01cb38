/// Coordinates and the geolocation provider contract.
///
/// The device location call lives outside this crate. The core only sees a
/// [`GeolocationProvider`] that answers with a [`Fix`]: either a coordinate or
/// `Unavailable`. There is no retry or timeout logic here; callers that want a
/// bounded wait with a manual fallback chain providers with
/// [`FallbackProvider`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;

/// Environment variable read by [`EnvProvider`] for the latitude
pub const LAT_ENV_VAR: &str = "CUSTOMER_MAP_LAT";
/// Environment variable read by [`EnvProvider`] for the longitude
pub const LON_ENV_VAR: &str = "CUSTOMER_MAP_LON";

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting anything outside the valid ranges.
    /// NaN and infinities are out of range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        let coordinate = Self { lat, lon };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ValidationError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(ValidationError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Outcome of a single capture attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fix {
    Coordinate(Coordinate),
    Unavailable,
}

impl Fix {
    pub fn coordinate(self) -> Option<Coordinate> {
        match self {
            Fix::Coordinate(c) => Some(c),
            Fix::Unavailable => None,
        }
    }
}

/// Anything that can answer "where is the device right now?".
pub trait GeolocationProvider {
    fn attempt_capture(&self) -> Fix;
}

/// Coordinates typed in by the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualEntry {
    lat: Option<f64>,
    lon: Option<f64>,
}

impl ManualEntry {
    pub fn new(lat: Option<f64>, lon: Option<f64>) -> Self {
        Self { lat, lon }
    }

    /// Both halves of the coordinate were typed in
    pub fn is_complete(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

impl GeolocationProvider for ManualEntry {
    fn attempt_capture(&self) -> Fix {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
                Ok(c) => Fix::Coordinate(c),
                Err(err) => {
                    debug!("Manual coordinate rejected: {}", err);
                    Fix::Unavailable
                }
            },
            _ => Fix::Unavailable,
        }
    }
}

/// Reads a fix exported into the environment by a device bridge.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProvider;

impl GeolocationProvider for EnvProvider {
    fn attempt_capture(&self) -> Fix {
        let read = |key: &str| std::env::var(key).ok().and_then(|v| v.trim().parse::<f64>().ok());
        ManualEntry::new(read(LAT_ENV_VAR), read(LON_ENV_VAR)).attempt_capture()
    }
}

/// Asks `primary` first and only falls back when it has no reading.
pub struct FallbackProvider<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackProvider<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: GeolocationProvider, F: GeolocationProvider> GeolocationProvider for FallbackProvider<P, F> {
    fn attempt_capture(&self) -> Fix {
        match self.primary.attempt_capture() {
            Fix::Coordinate(c) => Fix::Coordinate(c),
            Fix::Unavailable => {
                debug!("Primary geolocation unavailable, trying fallback");
                self.fallback.attempt_capture()
            }
        }
    }
}

/// Provider chain for an interactive capture. Coordinates the operator typed
/// win over the environment; an incomplete manual entry only fills in when
/// the environment has no reading.
pub fn capture_provider(manual: ManualEntry) -> Box<dyn GeolocationProvider> {
    if manual.is_complete() {
        debug!("Using manually entered coordinate");
        Box::new(FallbackProvider::new(manual, EnvProvider))
    } else {
        Box::new(FallbackProvider::new(EnvProvider, manual))
    }
}
