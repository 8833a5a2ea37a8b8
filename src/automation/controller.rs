// Owns config loading and the engine built from it
use super::click::ClickSink;
use super::engine::AutomationEngine;
use crate::capture::ScreenGrabber;
use crate::config::{AppConfig, ConfigLoader};
use crate::error::AutomationResult;
use std::path::PathBuf;
use std::sync::Arc;

enum Backends {
    /// Build command backends from each loaded config
    FromConfig,
    Fixed {
        grabber: Arc<dyn ScreenGrabber>,
        sink: Arc<dyn ClickSink>,
    },
}

pub struct AutomationController {
    loader: ConfigLoader,
    backends: Backends,
    engine: AutomationEngine,
}

impl AutomationController {
    /// Load the config at `path` and build an engine with the command backends.
    pub fn load(path: impl Into<PathBuf>) -> AutomationResult<Self> {
        Self::build(ConfigLoader::new(path), Backends::FromConfig)
    }

    /// Like [`load`](Self::load) but with caller-supplied capture and click backends.
    pub fn with_backends(
        path: impl Into<PathBuf>,
        grabber: Arc<dyn ScreenGrabber>,
        sink: Arc<dyn ClickSink>,
    ) -> AutomationResult<Self> {
        Self::build(ConfigLoader::new(path), Backends::Fixed { grabber, sink })
    }

    fn build(loader: ConfigLoader, backends: Backends) -> AutomationResult<Self> {
        let engine = Self::engine_for(&loader, &backends)?;
        Ok(Self {
            loader,
            backends,
            engine,
        })
    }

    /// Load config, build the engine and decode its templates up front so a
    /// bad template path fails here instead of inside the loop.
    fn engine_for(loader: &ConfigLoader, backends: &Backends) -> AutomationResult<AutomationEngine> {
        log::info!("Loading configuration from {:?}", loader.path());
        let config = Arc::new(loader.load()?);
        let engine = match backends {
            Backends::FromConfig => AutomationEngine::from_config(config),
            Backends::Fixed { grabber, sink } => {
                AutomationEngine::new(config, grabber.clone(), sink.clone())
            }
        };
        let loaded = engine.preload_templates()?;
        log::info!(
            "✅ Configuration ready: {} trades, {} templates",
            engine.config().trades.len(),
            loaded
        );
        Ok(engine)
    }

    pub fn config(&self) -> &AppConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &AutomationEngine {
        &self.engine
    }

    pub async fn start(&mut self) {
        self.engine.start().await;
    }

    pub fn toggle_pause(&self) -> bool {
        let paused = self.engine.toggle_pause();
        log::info!("Toggled pause; paused={paused}");
        paused
    }

    /// Replace the engine with one built from a fresh read of the config file.
    ///
    /// If loading fails the current engine keeps running untouched. A running
    /// engine is stopped and its replacement started.
    pub async fn reload_config(&mut self) -> AutomationResult<()> {
        let engine = Self::engine_for(&self.loader, &self.backends)?;
        let was_running = self.engine.is_running();
        self.engine.stop().await;
        self.engine = engine;
        if was_running {
            self.engine.start().await;
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        self.engine.stop().await;
    }
}
