//! Error types for geographic validation and projection.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("coordinate is not a finite number")]
    NonFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("origin latitude {lat} is too close to a pole for a planar projection")]
    OriginTooCloseToPole { lat: f64 },
    #[error("point is {distance_m:.1} m from the origin, beyond the {max_m:.1} m projection bound")]
    BeyondValidRange { distance_m: f64, max_m: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view command '{0}'")]
pub struct UnknownViewCommand(pub String);
