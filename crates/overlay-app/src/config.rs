//! Process configuration from environment.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use overlay_core::{ModelSpec, Origin, DEFAULT_MAX_RANGE_M};

#[derive(Debug, Clone)]
pub struct Config {
    pub map_id: String,
    pub feed_url: String,
    pub feed_room: String,
    pub feed_token: Option<String>,
    pub target_entity_id: String,
    pub origin: Origin,
    pub model_source: String,
    pub max_range_m: f64,
    pub frame_rate_hz: f64,
    pub initial_tilt: f64,
    pub initial_heading: f64,
    pub initial_zoom: f64,
    pub log_json: bool,
}

/// Initial view of the host map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub map_id: String,
    pub center: Origin,
    pub zoom: f64,
    pub tilt: f64,
    pub heading: f64,
    pub map_type: &'static str,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: f64| -> Result<f64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
                None => Ok(default),
            }
        };

        let origin = Origin::new(
            number("ORIGIN_LAT", 42.3012213)?,
            number("ORIGIN_LON", -83.6967968)?,
        )
        .context("Invalid ORIGIN_LAT/ORIGIN_LON")?;

        let frame_rate_hz = number("FRAME_RATE_HZ", 30.0)?;
        if !(frame_rate_hz > 0.0 && frame_rate_hz <= 240.0) {
            anyhow::bail!("FRAME_RATE_HZ must be in (0, 240], got {}", frame_rate_hz);
        }
        let max_range_m = number("MAX_RANGE_M", DEFAULT_MAX_RANGE_M)?;
        if !(max_range_m > 0.0) {
            anyhow::bail!("MAX_RANGE_M must be positive, got {}", max_range_m);
        }

        Ok(Self {
            map_id: lookup("MAP_ID").unwrap_or_default(),
            feed_url: lookup("FEED_URL")
                .unwrap_or_else(|| "wss://atrium.um.city/ros-topics".to_string()),
            feed_room: lookup("FEED_ROOM").unwrap_or_else(|| "behaviorstate".to_string()),
            feed_token: lookup("SOCKET_IO_API_KEY").filter(|s| !s.trim().is_empty()),
            target_entity_id: lookup("TARGET_ENTITY_ID").unwrap_or_else(|| "543DF7".to_string()),
            origin,
            model_source: lookup("MODEL_SOURCE").unwrap_or_else(|| "car.gltf".to_string()),
            max_range_m,
            frame_rate_hz,
            initial_tilt: number("INITIAL_TILT", 45.0)?,
            initial_heading: number("INITIAL_HEADING", 0.0)?,
            initial_zoom: number("INITIAL_ZOOM", 17.0)?,
            log_json: lookup("OVERLAY_LOG_JSON")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate_hz)
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            map_id: self.map_id.clone(),
            center: self.origin,
            zoom: self.initial_zoom,
            tilt: self.initial_tilt,
            heading: self.initial_heading,
            map_type: "satellite",
        }
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            source: self.model_source.clone(),
            ..ModelSpec::default()
        }
    }
}
