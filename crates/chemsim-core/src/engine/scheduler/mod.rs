use super::config::ConfigError;
use super::error::EngineError;
use crate::core::ids::ReactionId;
use crate::core::system::ChemicalSystem;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::Exp1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod direct;
pub mod nrm;

pub use direct::DirectScheduler;
pub use nrm::NextReactionScheduler;

/// Propensity sums below this are treated as an exhausted network.
pub const EXHAUSTION_THRESHOLD: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulerKind {
    /// Gillespie's direct method: one linear scan over all propensities per step.
    #[serde(alias = "gillespie")]
    Direct,
    /// Gibson and Bruck's next reaction method over an indexed priority queue.
    #[serde(alias = "nrm")]
    NextReaction,
}

impl SchedulerKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerKind::Direct => "direct",
            SchedulerKind::NextReaction => "next-reaction",
        }
    }

    pub fn create(self) -> Box<dyn Scheduler> {
        match self {
            SchedulerKind::Direct => Box::new(DirectScheduler::new()),
            SchedulerKind::NextReaction => Box::new(NextReactionScheduler::new()),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "gillespie" => Ok(SchedulerKind::Direct),
            "next-reaction" | "nrm" => Ok(SchedulerKind::NextReaction),
            other => Err(ConfigError::InvalidParameter {
                name: "scheduler",
                reason: format!(
                    "unknown scheduler '{}', expected 'direct' or 'next-reaction'",
                    other
                ),
            }),
        }
    }
}

/// What a scheduler needs to see of the network on each call.
pub struct SchedulerContext<'a> {
    pub system: &'a ChemicalSystem,
    pub time: f64,
    pub rng: &'a mut StdRng,
}

impl<'a> SchedulerContext<'a> {
    pub fn new(system: &'a ChemicalSystem, time: f64, rng: &'a mut StdRng) -> Self {
        Self { system, time, rng }
    }
}

/// The scheduler's proposal for the next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextEvent {
    /// `reaction` should fire at absolute simulated time `time`.
    Fire { reaction: ReactionId, time: f64 },
    /// No reaction has positive propensity.
    Exhausted,
}

/// A strategy choosing which reaction fires next and when.
///
/// The network owns the chemical system and the clock; a scheduler only keeps
/// its own index over reaction handles. `next_event` must not fire anything:
/// the network fires the proposed reaction and then calls `reschedule` with the
/// fired reaction and every reaction whose propensity may have changed.
pub trait Scheduler: Send + fmt::Debug {
    fn kind(&self) -> SchedulerKind;

    /// Whether `next_event` may be called.
    fn is_ready(&self) -> bool;

    /// Rebuilds the scheduler's index from scratch at `ctx.time`.
    fn initialize(&mut self, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError>;

    fn register(&mut self, id: ReactionId, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError>;

    fn unregister(&mut self, id: ReactionId);

    fn next_event(&mut self, ctx: &mut SchedulerContext<'_>) -> Result<NextEvent, EngineError>;

    /// Brings `touched` (and `fired`, if any) up to date with their current propensities.
    fn reschedule(
        &mut self,
        fired: Option<ReactionId>,
        touched: &[ReactionId],
        ctx: &mut SchedulerContext<'_>,
    ) -> Result<(), EngineError>;

    /// Absolute time at which `id` is scheduled to fire, for schedulers that keep one.
    fn scheduled_time(&self, _id: ReactionId) -> Option<f64> {
        None
    }

    /// Moves the time origin by `offset`, keeping every pending waiting time.
    fn shift_time(&mut self, _offset: f64) {}

    /// Number of reactions the scheduler currently tracks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws an absolute firing time `now + Exp(propensity)`.
///
/// A non-positive propensity never fires and yields `+inf`.
pub fn draw_firing_time(rng: &mut StdRng, propensity: f64, now: f64) -> f64 {
    if propensity > 0.0 {
        let e: f64 = rng.sample(Exp1);
        now + e / propensity
    } else {
        f64::INFINITY
    }
}

/// Reuses a pending firing time after a propensity change.
///
/// Computes `(a_old / a_new) * (tau_old - t) + t`. A zero `a_new` yields `+inf`.
/// The caller must handle `a_old == 0`, where the old time carries no
/// information and a fresh draw is required.
pub fn rescale_tau(a_old: f64, a_new: f64, tau_old: f64, t: f64) -> f64 {
    if a_new <= 0.0 {
        return f64::INFINITY;
    }
    (a_old / a_new) * (tau_old - t) + t
}
