use super::scheduler::SchedulerKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// When a simulation run stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunLimit {
    /// Fire at most this many reactions.
    Steps(u64),
    /// Advance simulated time up to this horizon.
    Until(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub scheduler: SchedulerKind,
    /// `None` seeds the network from system entropy.
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::NextReaction,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub network: NetworkConfig,
    pub limit: RunLimit,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    scheduler: Option<SchedulerKind>,
    seed: Option<u64>,
    steps: Option<u64>,
    until: Option<f64>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(mut self, kind: SchedulerKind) -> Self {
        self.scheduler = Some(kind);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn until(mut self, time: f64) -> Self {
        self.until = Some(time);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let network = NetworkConfig {
            scheduler: self
                .scheduler
                .ok_or(ConfigError::MissingParameter("scheduler"))?,
            seed: self.seed,
        };

        let limit = match (self.steps, self.until) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidParameter {
                    name: "limit",
                    reason: "specify either a step budget or a time horizon, not both".to_string(),
                });
            }
            (Some(steps), None) => RunLimit::Steps(steps),
            (None, Some(until)) => {
                if !until.is_finite() || until < 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "until",
                        reason: format!("time horizon must be finite and non-negative, got {}", until),
                    });
                }
                RunLimit::Until(until)
            }
            (None, None) => return Err(ConfigError::MissingParameter("steps or until")),
        };

        Ok(SimulationConfig { network, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_step_limited_config() {
        let config = SimulationConfigBuilder::new()
            .scheduler(SchedulerKind::Direct)
            .seed(7)
            .steps(100)
            .build()
            .unwrap();

        assert_eq!(config.network.scheduler, SchedulerKind::Direct);
        assert_eq!(config.network.seed, Some(7));
        assert_eq!(config.limit, RunLimit::Steps(100));
    }

    #[test]
    fn builder_requires_scheduler_and_limit() {
        assert_eq!(
            SimulationConfigBuilder::new().steps(1).build(),
            Err(ConfigError::MissingParameter("scheduler"))
        );
        assert_eq!(
            SimulationConfigBuilder::new()
                .scheduler(SchedulerKind::NextReaction)
                .build(),
            Err(ConfigError::MissingParameter("steps or until"))
        );
    }

    #[test]
    fn builder_rejects_conflicting_or_invalid_limits() {
        let both = SimulationConfigBuilder::new()
            .scheduler(SchedulerKind::NextReaction)
            .steps(10)
            .until(1.0)
            .build();
        assert!(matches!(both, Err(ConfigError::InvalidParameter { name: "limit", .. })));

        let negative = SimulationConfigBuilder::new()
            .scheduler(SchedulerKind::NextReaction)
            .until(-1.0)
            .build();
        assert!(matches!(negative, Err(ConfigError::InvalidParameter { name: "until", .. })));
    }

    #[test]
    fn default_network_config_uses_next_reaction_method() {
        let config = NetworkConfig::default();
        assert_eq!(config.scheduler, SchedulerKind::NextReaction);
        assert!(config.seed.is_none());
    }
}
