//! Wiring of configuration, logging, store, projector and journal.
//!
//! # Responsibility
//! - Build a ready-to-use core from a [`CoreConfig`].
//! - Restore graph state from the durable journal before new events arrive.
//!
//! # Invariants
//! - With a journal, the restored store and the dedup set describe the same
//!   event history.

use crate::config::{ConfigError, CoreConfig};
use crate::projection::{
    InMemoryProcessedEvents, ProcessedEventLog, ProcessedLogError, ProjectionError,
    RouteNetworkEventProjector, SqliteEventJournal,
};
use crate::service::walk_service::WalkOfInterestService;
use crate::store::GraphStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Projector type used by the bootstrapped core.
pub type CoreProjector = RouteNetworkEventProjector<Box<dyn ProcessedEventLog + Send>>;

/// Bootstrap failures.
#[derive(Debug)]
pub enum CoreError {
    Config(ConfigError),
    Logging(String),
    Journal(ProcessedLogError),
    Projection(ProjectionError),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "failed to initialize logging: {message}"),
            Self::Journal(err) => write!(f, "{err}"),
            Self::Projection(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(_) => None,
            Self::Journal(err) => Some(err),
            Self::Projection(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ProcessedLogError> for CoreError {
    fn from(value: ProcessedLogError) -> Self {
        Self::Journal(value)
    }
}

impl From<ProjectionError> for CoreError {
    fn from(value: ProjectionError) -> Self {
        Self::Projection(value)
    }
}

/// Assembled route network core.
pub struct RouteNetworkCore {
    store: Arc<GraphStore>,
    projector: CoreProjector,
}

impl RouteNetworkCore {
    /// Builds the core described by `config`.
    ///
    /// # Side effects
    /// - Starts file logging when `log_dir` is set.
    /// - Opens (and migrates) the journal when `journal_path` is set, then
    ///   replays it into the fresh store.
    pub fn open(config: &CoreConfig) -> Result<Self, CoreError> {
        config.validate()?;

        if let Some(log_dir) = &config.log_dir {
            crate::logging::init_logging(&config.log_level, log_dir)
                .map_err(CoreError::Logging)?;
        }

        let processed: Box<dyn ProcessedEventLog + Send> = match &config.journal_path {
            Some(path) => Box::new(SqliteEventJournal::open(path)?),
            None => Box::new(InMemoryProcessedEvents::new()),
        };

        let store = Arc::new(GraphStore::new());
        let mut projector = RouteNetworkEventProjector::new(Arc::clone(&store), processed);
        let restored = projector.restore()?;

        info!(
            "event=core_open module=bootstrap status=ok durable={} restored_events={} version={}",
            config.journal_path.is_some(),
            restored.applied,
            restored.committed_version
        );
        Ok(Self { store, projector })
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn projector_mut(&mut self) -> &mut CoreProjector {
        &mut self.projector
    }

    pub fn walk_service(&self) -> WalkOfInterestService {
        WalkOfInterestService::new(Arc::clone(&self.store))
    }
}
