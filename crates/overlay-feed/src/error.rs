//! Reasons an inbound feed message is rejected.

use overlay_core::GeoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' is not a finite number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("observation rejected: {0}")]
    Geo(#[from] GeoError),
}
