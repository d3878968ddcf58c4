//! Process-level coordinator.
//!
//! Owns the pose store, scene and host for the lifetime of the process and
//! multiplexes every event source onto one task: feed session, asset
//! completion, host frames, UI commands and shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use overlay_core::{
    DrawOutcome, GeoProjector, ModelAsset, PoseStore, SceneState, SceneSync, ViewCommand,
    ViewControlAdapter,
};
use overlay_feed::{listen, FeedClient, FeedListener};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::host::{FileAssetLoader, HeadlessMap, HeadlessRenderer};

pub struct Overlay {
    config: Config,
    store: Arc<PoseStore>,
    scene: SceneSync<HeadlessRenderer>,
    map: HeadlessMap,
    assets: mpsc::UnboundedReceiver<ModelAsset>,
}

impl Overlay {
    /// Attach the overlay to the headless host: build the scene, start the
    /// asset load and bind the renderer.
    pub fn attach(config: Config, asset_dir: impl Into<PathBuf>) -> Self {
        let store = Arc::new(PoseStore::new());
        let mut scene = SceneSync::new(config.origin, config.model_spec(), store.clone());
        let map = HeadlessMap::new(config.map_options());

        let (asset_tx, assets) = mpsc::unbounded_channel();
        let mut loader = FileAssetLoader::new(asset_dir, asset_tx);
        scene.on_add(&mut loader);

        let log_every = config.frame_rate_hz.round().max(1.0) as u64;
        scene.on_context_restored(HeadlessRenderer::new(log_every), &map);

        Self {
            config,
            store,
            scene,
            map,
            assets,
        }
    }

    pub fn store(&self) -> &Arc<PoseStore> {
        &self.store
    }

    pub fn scene(&self) -> &SceneSync<HeadlessRenderer> {
        &self.scene
    }

    pub fn map(&self) -> &HeadlessMap {
        &self.map
    }

    pub fn feed_listener(&self) -> FeedListener {
        let projector = GeoProjector::with_max_range(self.config.origin, self.config.max_range_m);
        FeedListener::new(
            self.config.feed_room.clone(),
            self.config.target_entity_id.clone(),
            projector,
            self.store.clone(),
        )
    }

    pub fn feed_client(&self) -> FeedClient {
        FeedClient::new(self.config.feed_url.clone(), self.config.feed_room.clone())
            .with_token(self.config.feed_token.clone())
    }

    /// One host frame; draws only when a redraw is pending.
    pub fn frame(&mut self) -> Option<DrawOutcome> {
        if !self.map.take_redraw() {
            return None;
        }
        let outcome = self.scene.on_draw(&self.map, &self.map);
        if let DrawOutcome::Skipped(state) = outcome {
            tracing::trace!("Draw skipped in {:?} state", state);
        }
        Some(outcome)
    }

    pub fn asset_loaded(&mut self, asset: ModelAsset) {
        self.scene.on_asset_loaded(asset, &self.map);
    }

    /// Wait for the asset loader to report completion.
    pub async fn next_asset(&mut self) -> Option<ModelAsset> {
        self.assets.recv().await
    }

    /// Apply one UI command line.
    pub fn command(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match line.parse::<ViewCommand>() {
            Ok(command) => {
                ViewControlAdapter::apply(command, &mut self.map);
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    pub fn state(&self) -> SceneState {
        self.scene.state()
    }

    /// Report how old the pose the model is frozen at has become.
    pub fn log_pose_age(&self) {
        match self.store.staleness() {
            Some(age) => tracing::info!(
                "Last pose is {:.1}s old",
                age.num_milliseconds() as f64 / 1000.0
            ),
            None => tracing::info!("No pose received yet"),
        }
    }

    /// Drive the overlay until ctrl-c.
    pub async fn run(mut self) -> Result<()> {
        let client = self.feed_client();
        let listener = self.feed_listener();
        let mut feed = tokio::spawn(async move { listen(&client, &listener).await });
        let mut feed_done = false;

        let mut frames = interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = frames.tick() => {
                    self.frame();
                }
                Some(asset) = self.assets.recv() => {
                    self.asset_loaded(asset);
                }
                result = &mut feed, if !feed_done => {
                    feed_done = true;
                    match result {
                        Ok(Some(stats)) => tracing::warn!(
                            "Feed ended after {} applied updates; model stays at its last pose",
                            stats.applied
                        ),
                        Ok(None) => tracing::warn!("Feed unavailable; running without updates"),
                        Err(e) => tracing::error!("Feed task failed: {}", e),
                    }
                    self.log_pose_age();
                }
                line = lines.next_line(), if stdin_open => {
                    match line {
                        Ok(Some(line)) => self.command(&line),
                        Ok(None) => stdin_open = false,
                        Err(e) => {
                            tracing::warn!("Stopped reading view commands: {}", e);
                            stdin_open = false;
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
            }
        }

        feed.abort();
        Ok(())
    }
}
