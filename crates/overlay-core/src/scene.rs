//! Scene graph ownership and per-frame camera synchronization.
//!
//! The host map drives everything: it calls [`SceneSync::on_add`] when the
//! overlay is attached, [`SceneSync::on_context_restored`] once its drawing
//! surface exists, and [`SceneSync::on_draw`] on every frame. The core never
//! runs its own frame timer.

use std::f64::consts::PI;
use std::sync::Arc;

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};

use crate::models::{Origin, Pose, ViewTransform};
use crate::pose_store::PoseSource;

/// Produces the host's projection for a geographic anchor on the current frame.
pub trait CoordinateTransformer {
    fn from_lat_lng_altitude(&self, point: crate::models::LatLngAltitude) -> ViewTransform;
}

/// Callbacks into the host map.
pub trait Host {
    fn request_redraw(&self);
}

/// Starts loading the model asset; completion is reported through
/// [`SceneSync::on_asset_loaded`].
pub trait AssetLoader {
    fn load(&mut self, source: &str);
}

/// Draws the overlay into the host's shared drawing surface.
pub trait Renderer {
    /// Whether the renderer clears the surface before each frame. The
    /// overlay draws on top of the host's content, so it turns this off.
    fn set_auto_clear(&mut self, _enabled: bool) {}

    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Restore any surface state the overlay touched so the host's own
    /// drawing is unaffected.
    fn reset_state(&mut self);
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFF_FF_FF);
    pub const RED: Color = Color(0xFF_00_00);

    pub fn rgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xFF) as f32 / 255.0,
            ((self.0 >> 8) & 0xFF) as f32 / 255.0,
            (self.0 & 0xFF) as f32 / 255.0,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        position: Vector3<f64>,
    },
}

/// Loaded 3D asset as handed over by the asset source.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub source: String,
    pub byte_len: usize,
}

/// Euler rotation in radians, applied X then Y then Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: Rotation,
    pub scale: Vector3<f64>,
}

impl Transform {
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// How the model is placed and colored once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub source: String,
    pub scale: f64,
    /// Initial rotation about Z; `PI` faces North.
    pub initial_heading: f64,
    /// Solid color applied to every mesh.
    pub tint: Color,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            source: "car.gltf".to_string(),
            scale: 0.01,
            initial_heading: PI,
            tint: Color::RED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub asset: ModelAsset,
    pub transform: Transform,
    pub tint: Color,
}

impl Model {
    fn from_asset(asset: ModelAsset, spec: &ModelSpec) -> Self {
        Self {
            asset,
            transform: Transform {
                position: Vector3::new(0.0, 0.0, 0.0),
                rotation: Rotation {
                    x: 0.0,
                    y: 0.0,
                    z: spec.initial_heading,
                },
                scale: Vector3::new(spec.scale, spec.scale, spec.scale),
            },
            tint: spec.tint,
        }
    }

    fn apply_pose(&mut self, pose: &Pose) {
        self.transform.position = Vector3::new(pose.x, pose.y, pose.z);
        self.transform.rotation.z = pose.orientation_z;
    }
}

/// Lights plus the (eventually loaded) model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub lights: Vec<Light>,
    pub model: Option<Model>,
}

impl Scene {
    fn lit() -> Self {
        Self {
            lights: vec![
                Light::Ambient {
                    color: Color::WHITE,
                    intensity: 0.75,
                },
                Light::Directional {
                    color: Color::WHITE,
                    intensity: 0.25,
                    position: Vector3::new(0.5, -1.0, 0.5),
                },
            ],
            model: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub projection: Matrix4<f64>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Matrix4::identity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Not attached to the host yet.
    Unloaded,
    /// Attached; waiting for the asset and/or the renderer.
    Loading,
    /// Model present and renderer initialized.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOutcome {
    Skipped(SceneState),
    Rendered { pose: Option<Pose> },
}

/// Owns the scene, camera and renderer, and keeps them in step with the
/// host view and the pose store.
pub struct SceneSync<R: Renderer> {
    origin: Origin,
    spec: ModelSpec,
    poses: Arc<dyn PoseSource>,
    scene: Option<Scene>,
    camera: Camera,
    renderer: Option<R>,
}

impl<R: Renderer> SceneSync<R> {
    pub fn new(origin: Origin, spec: ModelSpec, poses: Arc<dyn PoseSource>) -> Self {
        Self {
            origin,
            spec,
            poses,
            scene: None,
            camera: Camera::default(),
            renderer: None,
        }
    }

    pub fn state(&self) -> SceneState {
        match &self.scene {
            None => SceneState::Unloaded,
            Some(scene) if scene.model.is_some() && self.renderer.is_some() => SceneState::Ready,
            Some(_) => SceneState::Loading,
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    /// Host attached the overlay: build the scene and request the asset.
    pub fn on_add(&mut self, loader: &mut dyn AssetLoader) {
        if self.scene.is_some() {
            tracing::warn!("Overlay already attached; ignoring repeated attach");
            return;
        }
        self.scene = Some(Scene::lit());
        loader.load(&self.spec.source);
        tracing::info!("Scene created, loading model {}", self.spec.source);
    }

    /// Host drawing surface is available.
    pub fn on_context_restored(&mut self, mut renderer: R, host: &dyn Host) {
        renderer.set_auto_clear(false);
        self.renderer = Some(renderer);
        tracing::debug!("Renderer bound to host context");
        self.redraw_if_ready(host);
    }

    /// Asset source finished loading the model.
    pub fn on_asset_loaded(&mut self, asset: ModelAsset, host: &dyn Host) {
        let Some(scene) = self.scene.as_mut() else {
            tracing::warn!("Model {} loaded before overlay was attached; dropping", asset.source);
            return;
        };
        tracing::info!("Model {} loaded ({} bytes)", asset.source, asset.byte_len);
        scene.model = Some(Model::from_asset(asset, &self.spec));
        self.redraw_if_ready(host);
    }

    /// One host frame.
    pub fn on_draw(
        &mut self,
        transformer: &dyn CoordinateTransformer,
        host: &dyn Host,
    ) -> DrawOutcome {
        let state = self.state();
        let (Some(scene), Some(renderer)) = (self.scene.as_mut(), self.renderer.as_mut()) else {
            return DrawOutcome::Skipped(state);
        };
        let Some(model) = scene.model.as_mut() else {
            return DrawOutcome::Skipped(state);
        };

        self.camera.projection = transformer.from_lat_lng_altitude(self.origin.at_ground());

        let pose = self.poses.current();
        if let Some(pose) = &pose {
            model.apply_pose(pose);
        }

        host.request_redraw();
        renderer.render(scene, &self.camera);
        renderer.reset_state();

        DrawOutcome::Rendered { pose }
    }

    fn redraw_if_ready(&self, host: &dyn Host) {
        if self.state() == SceneState::Ready {
            tracing::info!("Scene ready");
            host.request_redraw();
        }
    }
}
