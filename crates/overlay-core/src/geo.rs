//! Geographic to scene-space conversion.
//!
//! Uses an equirectangular tangent-plane approximation centred on the
//! origin. Within a few kilometres the error stays below a meter; it grows
//! with distance and towards the poles, so checked projection refuses points
//! beyond a configured range.

use std::f64::consts::PI;

use crate::error::GeoError;
use crate::models::{check_lat_lon, Observation, Origin, Pose};

/// WGS-84 equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Default validity bound for the planar approximation.
pub const DEFAULT_MAX_RANGE_M: f64 = 5_000.0;

/// Planar (east, north) offset of `(lat, lon)` from `origin`, in meters.
pub fn project(origin: &Origin, lat: f64, lon: f64) -> (f64, f64) {
    let d_lat = (lat - origin.lat()).to_radians();
    let d_lon = wrap_longitude_delta(lon - origin.lon()).to_radians();

    let x = d_lon * EARTH_RADIUS_M * origin.lat().to_radians().cos();
    let y = d_lat * EARTH_RADIUS_M;
    (x, y)
}

/// Convert a compass heading (0 = North, clockwise) into the renderer's
/// rotation about Z.
///
/// The model's forward axis and the renderer's rotation sign both run
/// opposite to compass bearing, hence `PI - heading`.
pub fn to_scene_heading(heading_deg: f64) -> f64 {
    PI - normalize_heading(heading_deg).to_radians()
}

/// Fold a heading into `[0, 360)`.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    let h = heading_deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

fn wrap_longitude_delta(d_lon: f64) -> f64 {
    if d_lon > 180.0 {
        d_lon - 360.0
    } else if d_lon <= -180.0 {
        d_lon + 360.0
    } else {
        d_lon
    }
}

/// Projector bound to a fixed origin and validity range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoProjector {
    origin: Origin,
    max_range_m: f64,
}

impl GeoProjector {
    pub fn new(origin: Origin) -> Self {
        Self::with_max_range(origin, DEFAULT_MAX_RANGE_M)
    }

    pub fn with_max_range(origin: Origin, max_range_m: f64) -> Self {
        Self {
            origin,
            max_range_m,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn max_range_m(&self) -> f64 {
        self.max_range_m
    }

    /// Unchecked projection.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        project(&self.origin, lat, lon)
    }

    /// Projection that validates the input and enforces the range bound.
    pub fn project_checked(&self, lat: f64, lon: f64) -> Result<(f64, f64), GeoError> {
        check_lat_lon(lat, lon)?;
        let (x, y) = self.project(lat, lon);
        let distance_m = x.hypot(y);
        if distance_m > self.max_range_m {
            return Err(GeoError::BeyondValidRange {
                distance_m,
                max_m: self.max_range_m,
            });
        }
        Ok((x, y))
    }

    /// Derive the scene pose for an observation.
    ///
    /// Deterministic: the same observation always yields a bit-identical pose.
    pub fn pose_for(&self, observation: &Observation) -> Result<Pose, GeoError> {
        let heading_deg = observation.heading_or_north();
        if !heading_deg.is_finite() {
            return Err(GeoError::NonFinite);
        }
        let (x, y) = self.project_checked(observation.lat, observation.lon)?;
        Ok(Pose::new(x, y, to_scene_heading(heading_deg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ann_arbor() -> Origin {
        Origin::new(42.3012213, -83.6967968).unwrap()
    }

    #[test]
    fn origin_projects_to_zero() {
        for (lat, lon) in [
            (42.3012213, -83.6967968),
            (0.0, 0.0),
            (-33.86, 151.21),
            (60.0, -179.9),
        ] {
            let origin = Origin::new(lat, lon).unwrap();
            assert_eq!(project(&origin, lat, lon), (0.0, 0.0));
        }
    }

    #[test]
    fn north_offset_uses_earth_radius() {
        let origin = Origin::new(0.0, 0.0).unwrap();
        let (x, y) = project(&origin, 0.001, 0.0);
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.001_f64.to_radians() * EARTH_RADIUS_M, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 111.319, epsilon = 1e-3);
    }

    #[test]
    fn east_offset_shrinks_with_latitude() {
        let origin = ann_arbor();
        let (x, y) = project(&origin, origin.lat(), origin.lon() + 0.001);
        let expected = 0.001_f64.to_radians() * EARTH_RADIUS_M * 42.3012213_f64.to_radians().cos();
        assert_abs_diff_eq!(x, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 0.0);
        assert!(x > 0.0);
    }

    #[test]
    fn projection_is_close_to_haversine_within_a_kilometre() {
        let origin = ann_arbor();
        let (lat, lon) = (origin.lat() + 0.005, origin.lon() - 0.007);
        let (x, y) = project(&origin, lat, lon);

        let a = ((lat - origin.lat()).to_radians() / 2.0).sin().powi(2)
            + origin.lat().to_radians().cos()
                * lat.to_radians().cos()
                * ((lon - origin.lon()).to_radians() / 2.0).sin().powi(2);
        let great_circle = 2.0 * EARTH_RADIUS_M * a.sqrt().asin();

        assert!((x.hypot(y) - great_circle).abs() < 1.0);
    }

    #[test]
    fn longitude_delta_wraps_across_antimeridian() {
        let origin = Origin::new(10.0, 179.99).unwrap();
        let (x, _) = project(&origin, 10.0, -179.99);
        assert!(x > 0.0);
        assert!(x < 3_000.0);
    }

    #[test]
    fn north_heading_faces_pi() {
        assert_eq!(to_scene_heading(0.0), PI);
        assert_abs_diff_eq!(to_scene_heading(90.0), PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(to_scene_heading(180.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn heading_is_periodic_in_360_degrees() {
        for h in [0.0, 45.0, 90.0, 180.0, 270.0, 359.0] {
            assert_eq!(to_scene_heading(h), to_scene_heading(h + 360.0));
            assert_eq!(to_scene_heading(h), to_scene_heading(h - 360.0));
        }
        for h in [12.345, 200.75, -17.5] {
            assert_abs_diff_eq!(
                to_scene_heading(h),
                to_scene_heading(h + 360.0),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn tiny_negative_headings_fold_to_north() {
        assert_eq!(normalize_heading(-1e-14), 0.0);
        assert_eq!(normalize_heading(-0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(to_scene_heading(-1e-14), PI);
        assert_eq!(to_scene_heading(-1e-14), to_scene_heading(-1e-14 + 360.0));
    }

    #[test]
    fn checked_projection_enforces_range() {
        let projector = GeoProjector::with_max_range(ann_arbor(), 1_000.0);
        assert!(projector.project_checked(42.3012213, -83.6967968).is_ok());
        assert!(projector.project_checked(42.305, -83.6967968).is_ok());
        assert!(matches!(
            projector.project_checked(42.4, -83.6967968),
            Err(GeoError::BeyondValidRange { .. })
        ));
        assert!(matches!(
            projector.project_checked(f64::INFINITY, 0.0),
            Err(GeoError::NonFinite)
        ));
        assert!(matches!(
            projector.project_checked(42.3, -190.0),
            Err(GeoError::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn pose_for_is_deterministic() {
        let projector = GeoProjector::new(ann_arbor());
        let obs = Observation::new("543DF7", 42.3021, -83.6951).with_heading(37.5);
        let first = projector.pose_for(&obs).unwrap();
        let second = projector.pose_for(&obs).unwrap();
        assert_eq!(first.x.to_bits(), second.x.to_bits());
        assert_eq!(first.y.to_bits(), second.y.to_bits());
        assert_eq!(first.orientation_z.to_bits(), second.orientation_z.to_bits());
        assert_eq!(first.z, 0.0);
    }

    #[test]
    fn pose_for_rejects_non_finite_heading() {
        let projector = GeoProjector::new(ann_arbor());
        let obs = Observation::new("543DF7", 42.3012213, -83.6967968).with_heading(f64::NAN);
        assert_eq!(projector.pose_for(&obs), Err(GeoError::NonFinite));
    }
}
