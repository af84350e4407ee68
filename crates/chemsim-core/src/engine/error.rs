use super::config::ConfigError;
use crate::core::system::SystemError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Chemical system error: {source}")]
    System {
        #[from]
        source: SystemError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("The {scheduler} scheduler must be initialized before running")]
    NotInitialized { scheduler: &'static str },

    #[error("Cannot initialize a network without reactions")]
    EmptyNetwork,

    #[error("Scheduler can only be selected before the simulation starts")]
    SchedulerLocked,

    #[error("Time horizon {until} lies before the current time {now}")]
    InvalidHorizon { until: f64, now: f64 },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
