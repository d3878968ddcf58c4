//! Synthetic ground tracks.

use std::f64::consts::PI;

use overlay_core::EARTH_RADIUS_M;

/// A track an entity follows over time.
pub trait TrackPath: Send + Sync {
    /// (lat, lon) at time t seconds from start.
    fn position(&self, t: f64) -> (f64, f64);

    /// Compass heading at time t (degrees, 0 = North, clockwise).
    fn heading(&self, t: f64) -> f64 {
        // Finite difference over a short step.
        let dt = 0.1;
        let (lat1, lon1) = self.position(t);
        let (lat2, lon2) = self.position(t + dt);

        let north = lat2 - lat1;
        let east = (lon2 - lon1) * lat1.to_radians().cos();
        if north.abs() < 1e-12 && east.abs() < 1e-12 {
            return 0.0;
        }
        east.atan2(north).to_degrees().rem_euclid(360.0)
    }
}

/// Circular track around a center point.
pub struct CircularPath {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub speed_mps: f64,
    pub clockwise: bool,
    period: f64,
}

impl CircularPath {
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        radius_m: f64,
        speed_mps: f64,
        clockwise: bool,
    ) -> Self {
        let circumference = 2.0 * PI * radius_m;
        let period = if speed_mps > 0.0 {
            circumference / speed_mps
        } else {
            f64::INFINITY
        };

        Self {
            center_lat,
            center_lon,
            radius_m,
            speed_mps,
            clockwise,
            period,
        }
    }

    /// Seconds per lap.
    pub fn period(&self) -> f64 {
        self.period
    }
}

impl TrackPath for CircularPath {
    fn position(&self, t: f64) -> (f64, f64) {
        // Angle measured from North; clockwise matches compass bearing.
        let mut angle = 2.0 * PI * t / self.period;
        if !self.clockwise {
            angle = -angle;
        }

        let north_m = self.radius_m * angle.cos();
        let east_m = self.radius_m * angle.sin();

        let lat = self.center_lat + (north_m / EARTH_RADIUS_M).to_degrees();
        let lon = self.center_lon
            + (east_m / (EARTH_RADIUS_M * self.center_lat.to_radians().cos())).to_degrees();
        (lat, lon)
    }

    fn heading(&self, t: f64) -> f64 {
        let angle = (2.0 * PI * t / self.period).to_degrees();
        if self.clockwise {
            (angle + 90.0).rem_euclid(360.0)
        } else {
            (270.0 - angle).rem_euclid(360.0)
        }
    }
}
