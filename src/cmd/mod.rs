mod check;
mod generate;
mod import;
mod prepare;
mod run;
mod select;

use std::path::PathBuf;

use anyhow::{Context, Result};

use storyreel::batch::Orchestrator;
use storyreel::config::Config;
use storyreel::generate::Engines;
use storyreel::publish::CommandPublisher;
use storyreel::store::JsonStore;
use storyreel::video::Ffmpeg;

pub use check::cmd_check;
pub use generate::cmd_generate;
pub use import::cmd_import;
pub use prepare::cmd_prepare;
pub use run::{cmd_process_item, cmd_run, cmd_schedule};
pub use select::cmd_select;

/// Loaded configuration plus where it came from.
pub struct App {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl App {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Config::load(config_path.as_deref()).with_context(|| match config_path {
            Some(ref p) => format!("loading config from {}", p.display()),
            None => "loading default config".to_string(),
        })?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub async fn open_store(&self) -> Result<JsonStore> {
        let path = &self.config.paths.store;
        JsonStore::open(path)
            .await
            .with_context(|| format!("opening store {}", path.display()))
    }

    /// Everything a batch needs, built from the config.
    pub async fn runtime(&self) -> Result<Runtime> {
        Ok(Runtime {
            store: self.open_store().await?,
            engines: Engines::from_config(&self.config),
            toolkit: Ffmpeg::new(&self.config.encoder),
            publisher: CommandPublisher::new(&self.config.publish),
        })
    }
}

/// Owned collaborators for an [`Orchestrator`].
pub struct Runtime {
    pub store: JsonStore,
    pub engines: Engines,
    pub toolkit: Ffmpeg,
    pub publisher: CommandPublisher,
}

impl Runtime {
    pub fn orchestrator<'a>(&'a self, app: &'a App) -> Orchestrator<'a> {
        Orchestrator::new(
            &app.config,
            &self.store,
            &self.engines,
            &self.toolkit,
            &self.publisher,
        )
        .with_config_path(app.config_path.clone())
    }
}
