use fanout_core::clock::{Clock, SystemClock, TimeFormat};
use fanout_core::config::Config;
use fanout_core::Orchestrator;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Orchestrator,
    pub clock: Arc<dyn Clock>,
    /// Format used by the current-time endpoint.
    pub time_format: TimeFormat,
}

impl AppState {
    pub fn new(config: Config) -> fanout_core::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> fanout_core::Result<Self> {
        config.validate()?;
        let orchestrator = Orchestrator::from_config(&config)?;
        let time_format = config.time.standard()?;
        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            clock,
            time_format,
        })
    }
}
