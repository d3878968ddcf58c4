//! Overlay core: geographic projection, pose storage and scene sync for a
//! 3D model anchored on an interactive map.

pub mod error;
pub mod geo;
pub mod models;
pub mod pose_store;
pub mod scene;
pub mod view_control;

pub use error::{GeoError, UnknownViewCommand};
pub use geo::{
    normalize_heading, project, to_scene_heading, GeoProjector, DEFAULT_MAX_RANGE_M,
    EARTH_RADIUS_M,
};
pub use models::{LatLngAltitude, Observation, Origin, Pose, ViewTransform};
pub use pose_store::{PoseSnapshot, PoseSource, PoseStore};
pub use scene::{
    AssetLoader, Camera, Color, CoordinateTransformer, DrawOutcome, Host, Light, Model, ModelAsset,
    ModelSpec, Renderer, Rotation, Scene, SceneState, SceneSync, Transform,
};
pub use view_control::{MapView, ViewCommand, ViewControlAdapter, ViewRequest};
