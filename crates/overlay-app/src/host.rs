//! Headless stand-in for the host map widget.
//!
//! Owns the frame timer's redraw flag, the view parameters, and produces a
//! perspective projection the way a tilted, rotated map camera would.

use std::cell::Cell;
use std::path::PathBuf;

use cgmath::{Deg, Matrix4, Rad, Vector3, Vector4};
use overlay_core::{
    project, AssetLoader, Camera, CoordinateTransformer, Host, LatLngAltitude, MapView,
    ModelAsset, Renderer, Scene, ViewTransform,
};
use tokio::sync::mpsc;

use crate::config::MapOptions;

/// Meters per pixel at zoom 0 on the equator (Web Mercator).
const METERS_PER_PIXEL_Z0: f64 = 156_543.033_92;
const FIELD_OF_VIEW_DEG: f64 = 45.0;
const MAX_TILT_DEG: f64 = 90.0;

pub struct HeadlessMap {
    options: MapOptions,
    viewport: (u32, u32),
    redraw_requested: Cell<bool>,
}

impl HeadlessMap {
    pub fn new(options: MapOptions) -> Self {
        Self {
            options,
            viewport: (1280, 720),
            redraw_requested: Cell::new(false),
        }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Consume a pending redraw request.
    pub fn take_redraw(&self) -> bool {
        self.redraw_requested.replace(false)
    }

    fn meters_per_pixel(&self) -> f64 {
        let lat_scale = self.options.center.lat().to_radians().cos();
        METERS_PER_PIXEL_Z0 * lat_scale / 2f64.powf(self.options.zoom)
    }
}

impl Host for HeadlessMap {
    fn request_redraw(&self) {
        self.redraw_requested.set(true);
    }
}

impl MapView for HeadlessMap {
    fn tilt(&self) -> f64 {
        self.options.tilt
    }

    fn heading(&self) -> f64 {
        self.options.heading
    }

    fn set_tilt(&mut self, degrees: f64) {
        self.options.tilt = degrees.clamp(0.0, MAX_TILT_DEG);
        self.request_redraw();
    }

    fn set_heading(&mut self, degrees: f64) {
        self.options.heading = degrees.rem_euclid(360.0);
        self.request_redraw();
    }
}

impl CoordinateTransformer for HeadlessMap {
    fn from_lat_lng_altitude(&self, point: LatLngAltitude) -> ViewTransform {
        let (width, height) = self.viewport;
        let aspect = width as f64 / height as f64;
        let fov = Deg(FIELD_OF_VIEW_DEG);
        let distance = (height as f64 / 2.0) * self.meters_per_pixel()
            / (Rad::from(fov).0 / 2.0).tan();

        let projection = cgmath::perspective(fov, aspect, distance * 0.01, distance * 10.0);
        let view = Matrix4::from_translation(Vector3::new(0.0, 0.0, -distance))
            * Matrix4::from_angle_x(Deg(-self.options.tilt))
            * Matrix4::from_angle_z(Deg(self.options.heading));

        let (x, y) = project(&self.options.center, point.lat, point.lng);
        let anchor = Matrix4::from_translation(Vector3::new(x, y, point.altitude));

        projection * view * anchor
    }
}

/// Where the model landed on the last rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    pub index: u64,
    /// Normalized device coordinates of the model origin, if in front of
    /// the camera.
    pub ndc: Option<[f64; 3]>,
}

/// Renderer that projects the model through the camera instead of drawing.
pub struct HeadlessRenderer {
    auto_clear: bool,
    frames: u64,
    state_dirty: bool,
    log_every: u64,
    last: Option<RenderedFrame>,
}

impl HeadlessRenderer {
    pub fn new(log_every: u64) -> Self {
        Self {
            auto_clear: true,
            frames: 0,
            state_dirty: false,
            log_every: log_every.max(1),
            last: None,
        }
    }

    pub fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<RenderedFrame> {
        self.last
    }

    pub fn state_dirty(&self) -> bool {
        self.state_dirty
    }
}

impl Renderer for HeadlessRenderer {
    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.state_dirty = true;
        self.frames += 1;

        let ndc = scene.model.as_ref().and_then(|model| {
            let anchor = Vector4::new(0.0, 0.0, 0.0, 1.0);
            let clip = camera.projection * model.transform.to_matrix() * anchor;
            (clip.w > 0.0).then(|| [clip.x / clip.w, clip.y / clip.w, clip.z / clip.w])
        });
        let frame = RenderedFrame {
            index: self.frames,
            ndc,
        };
        self.last = Some(frame);

        if self.frames % self.log_every == 0 {
            match ndc {
                Some([x, y, z]) => tracing::debug!(
                    "Frame {}: model at ndc ({:.3}, {:.3}, {:.3})",
                    frame.index,
                    x,
                    y,
                    z
                ),
                None => tracing::debug!("Frame {}: model behind camera", frame.index),
            }
        }
    }

    fn reset_state(&mut self) {
        self.state_dirty = false;
    }
}

/// Reads the model file in the background and reports it when done.
pub struct FileAssetLoader {
    base_dir: PathBuf,
    loaded: mpsc::UnboundedSender<ModelAsset>,
}

impl FileAssetLoader {
    pub fn new(base_dir: impl Into<PathBuf>, loaded: mpsc::UnboundedSender<ModelAsset>) -> Self {
        Self {
            base_dir: base_dir.into(),
            loaded,
        }
    }
}

impl AssetLoader for FileAssetLoader {
    fn load(&mut self, source: &str) {
        let path = self.base_dir.join(source);
        let source = source.to_string();
        let loaded = self.loaded.clone();
        tokio::spawn(async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let asset = ModelAsset {
                        source,
                        byte_len: bytes.len(),
                    };
                    if loaded.send(asset).is_err() {
                        tracing::debug!(
                            "Scene gone before model {} finished loading",
                            path.display()
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to load model {}: {}", path.display(), e);
                }
            }
        });
    }
}
