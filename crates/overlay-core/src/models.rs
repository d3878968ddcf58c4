//! Core data models for the overlay pipeline.

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// Latitudes closer to a pole than this make the longitude scale collapse.
pub const MAX_ORIGIN_LATITUDE_DEG: f64 = 89.0;

/// Fixed geographic reference point of the local scene coordinate system.
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Origin {
    lat: f64,
    lon: f64,
}

impl Origin {
    /// Create a validated origin.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        check_lat_lon(lat, lon)?;
        if lat.abs() >= MAX_ORIGIN_LATITUDE_DEG {
            return Err(GeoError::OriginTooCloseToPole { lat });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// The origin at ground level, as handed to the host's coordinate transformer.
    pub fn at_ground(&self) -> LatLngAltitude {
        LatLngAltitude {
            lat: self.lat,
            lng: self.lon,
            altitude: 0.0,
        }
    }
}

/// A geographic point with altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngAltitude {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

/// One decoded position report for a tracked entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Compass heading in degrees (0 = North, clockwise).
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

impl Observation {
    pub fn new(entity_id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            lat,
            lon,
            heading_deg: None,
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }

    /// Heading with the missing case resolved to North.
    pub fn heading_or_north(&self) -> f64 {
        self.heading_deg.unwrap_or(0.0)
    }
}

/// Position and orientation of the tracked entity in local scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// East offset from the origin, meters.
    pub x: f64,
    /// North offset from the origin, meters.
    pub y: f64,
    /// Always ground level.
    pub z: f64,
    /// Rotation about the scene's vertical axis, radians.
    pub orientation_z: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, orientation_z: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            orientation_z,
        }
    }
}

/// Column-major 4x4 projection matrix supplied by the host for one frame.
pub type ViewTransform = cgmath::Matrix4<f64>;

pub(crate) fn check_lat_lon(lat: f64, lon: f64) -> Result<(), GeoError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(GeoError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::LatitudeOutOfRange(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::LongitudeOutOfRange(lon));
    }
    Ok(())
}
