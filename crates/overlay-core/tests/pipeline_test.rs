//! Observation -> pose -> scene, without any transport.

use std::f64::consts::PI;
use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use overlay_core::{
    to_scene_heading, AssetLoader, Camera, CoordinateTransformer, DrawOutcome, GeoProjector, Host,
    LatLngAltitude, ModelAsset, ModelSpec, Observation, Origin, Pose, PoseStore, Renderer, Scene,
    SceneSync, ViewTransform,
};

struct Noop;

impl Host for Noop {
    fn request_redraw(&self) {}
}

impl AssetLoader for Noop {
    fn load(&mut self, _source: &str) {}
}

impl CoordinateTransformer for Noop {
    fn from_lat_lng_altitude(&self, _point: LatLngAltitude) -> ViewTransform {
        ViewTransform::from_scale(1.0)
    }
}

#[derive(Default)]
struct LastTransform(Option<Pose>);

impl Renderer for LastTransform {
    fn render(&mut self, scene: &Scene, _camera: &Camera) {
        self.0 = scene.model.as_ref().map(|m| {
            Pose::new(m.transform.position.x, m.transform.position.y, m.transform.rotation.z)
        });
    }

    fn reset_state(&mut self) {}
}

fn projector() -> GeoProjector {
    GeoProjector::new(Origin::new(42.3012213, -83.6967968).unwrap())
}

#[test]
fn observation_at_origin_with_north_heading() {
    let pose = projector()
        .pose_for(&Observation::new("543DF7", 42.3012213, -83.6967968).with_heading(0.0))
        .unwrap();
    assert_eq!(pose, Pose::new(0.0, 0.0, PI));
}

#[test]
fn observation_without_heading_faces_north() {
    let pose = projector()
        .pose_for(&Observation::new("543DF7", 42.3012213, -83.6967968))
        .unwrap();
    assert_eq!(pose.orientation_z, PI);
}

#[test]
fn heading_sweep_is_periodic() {
    let mut h = -720.0;
    while h <= 720.0 {
        assert_abs_diff_eq!(to_scene_heading(h), to_scene_heading(h + 360.0), epsilon = 1e-9);
        h += 7.25;
    }
}

#[test]
fn rendered_transform_matches_latest_pose() {
    let store = Arc::new(PoseStore::new());
    let projector = projector();
    let mut sync = SceneSync::new(*projector.origin(), ModelSpec::default(), store.clone());
    sync.on_add(&mut Noop);
    sync.on_context_restored(LastTransform::default(), &Noop);
    sync.on_asset_loaded(
        ModelAsset {
            source: "car.gltf".into(),
            byte_len: 0,
        },
        &Noop,
    );

    let observations = [
        Observation::new("543DF7", 42.3013, -83.6968).with_heading(10.0),
        Observation::new("543DF7", 42.3014, -83.6966).with_heading(20.0),
        Observation::new("543DF7", 42.3016, -83.6964),
    ];
    for obs in &observations {
        store.update(projector.pose_for(obs).unwrap());
        let outcome = sync.on_draw(&Noop, &Noop);
        assert_eq!(outcome, DrawOutcome::Rendered { pose: store.current() });
        assert_eq!(sync.renderer().unwrap().0, store.current());
    }
    assert_eq!(sync.renderer().unwrap().0.unwrap().orientation_z, PI);
}

#[test]
fn draws_never_see_half_applied_poses() {
    let store = Arc::new(PoseStore::new());
    let projector = projector();
    let poses: Vec<Pose> = (0..64)
        .map(|i| {
            let obs = Observation::new("543DF7", 42.3012213 + i as f64 * 1e-5, -83.6967968)
                .with_heading(i as f64 * 5.0);
            projector.pose_for(&obs).unwrap()
        })
        .collect();

    let writer = {
        let store = store.clone();
        let poses = poses.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                for pose in &poses {
                    store.update(*pose);
                }
            }
        })
    };

    let mut sync = SceneSync::new(*projector.origin(), ModelSpec::default(), store.clone());
    sync.on_add(&mut Noop);
    sync.on_context_restored(LastTransform::default(), &Noop);
    sync.on_asset_loaded(
        ModelAsset {
            source: "car.gltf".into(),
            byte_len: 0,
        },
        &Noop,
    );
    for _ in 0..5_000 {
        if let DrawOutcome::Rendered { pose: Some(pose) } = sync.on_draw(&Noop, &Noop) {
            assert!(poses.contains(&pose), "torn pose {:?}", pose);
        }
    }
    writer.join().unwrap();
}
