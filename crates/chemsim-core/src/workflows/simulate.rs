use crate::core::ids::ReactionId;
use crate::core::species::CopyNumber;
use crate::engine::config::{RunLimit, SimulationConfig};
use crate::engine::error::EngineError;
use crate::engine::network::{ReactionNetwork, SchedulerState};
use crate::engine::scheduler::SchedulerKind;
use slotmap::SecondaryMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesCount {
    pub name: String,
    pub copy_number: CopyNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionCount {
    pub reaction: ReactionId,
    /// Label if one was given, otherwise the rendered reaction.
    pub description: String,
    pub firings: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub scheduler: SchedulerKind,
    pub limit: RunLimit,
    /// `false` if the network ran dry before the step budget or horizon was reached.
    pub completed: bool,
    pub exhausted: bool,
    pub start_time: f64,
    pub end_time: f64,
    /// Firings during this run only.
    pub steps: u64,
    pub species: Vec<SpeciesCount>,
    pub reactions: Vec<ReactionCount>,
}

/// Runs `network` until `limit` is reached or nothing can fire any more.
///
/// A network that has never been initialized is initialized first, which
/// resets its clock to zero. An already running network continues from its
/// current time and state.
#[instrument(skip_all, name = "simulation_workflow", fields(limit = ?limit))]
pub fn run(network: &mut ReactionNetwork, limit: RunLimit) -> Result<SimulationSummary, EngineError> {
    if network.state() == SchedulerState::Uninitialized {
        network.initialize()?;
    }

    let start_time = network.time();
    let start_steps = network.steps_fired();
    info!(
        scheduler = %network.scheduler_kind(),
        start_time,
        "Starting simulation run."
    );

    let counts: Arc<Mutex<SecondaryMap<ReactionId, u64>>> = Arc::new(Mutex::new(SecondaryMap::new()));
    let sink = Arc::clone(&counts);
    let subscription = network.subscribe_all(move |event| {
        if let Ok(mut counts) = sink.lock() {
            match counts.get_mut(event.reaction) {
                Some(n) => *n += 1,
                None => {
                    counts.insert(event.reaction, 1);
                }
            }
        }
    });

    let outcome = network.run(limit);
    network.unsubscribe(subscription);
    let completed = outcome?;

    let counts = counts
        .lock()
        .map_err(|_| EngineError::Internal("firing counter lock poisoned".to_string()))?;

    let species = network
        .species()
        .map(|(_, s)| SpeciesCount {
            name: s.name.clone(),
            copy_number: s.copy_number(),
        })
        .collect();

    let reactions = network
        .reactions()
        .map(|(id, reaction)| ReactionCount {
            reaction: id,
            description: match reaction.label() {
                Some(label) => label.to_string(),
                None => network
                    .display_reaction(id)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            },
            firings: counts.get(id).copied().unwrap_or(0),
        })
        .collect();

    let summary = SimulationSummary {
        scheduler: network.scheduler_kind(),
        limit,
        completed,
        exhausted: network.state() == SchedulerState::Exhausted,
        start_time,
        end_time: network.time(),
        steps: network.steps_fired() - start_steps,
        species,
        reactions,
    };

    info!(
        steps = summary.steps,
        end_time = summary.end_time,
        exhausted = summary.exhausted,
        "Simulation run finished."
    );
    Ok(summary)
}

/// Applies the scheduler choice of `config` to a populated network, then runs it.
///
/// # Errors
///
/// [`EngineError::SchedulerLocked`] if the configured scheduler differs from
/// the network's and the network has already started.
pub fn run_with_config(network: &mut ReactionNetwork, config: &SimulationConfig) -> Result<SimulationSummary, EngineError> {
    if network.scheduler_kind() != config.network.scheduler {
        network.set_scheduler(config.network.scheduler)?;
    }
    run(network, config.limit)
}
