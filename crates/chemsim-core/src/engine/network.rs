use super::config::{NetworkConfig, RunLimit};
use super::error::EngineError;
use super::scheduler::{NextEvent, Scheduler, SchedulerContext, SchedulerKind};
use super::signals::{ReactionEvent, SignalHub, SpeciesEvent, SubscriptionId};
use crate::core::ids::{ReactionId, SpeciesId};
use crate::core::reaction::Reaction;
use crate::core::species::{CopyNumber, Species};
use crate::core::system::{ChemicalSystem, ReactionDisplay, SystemError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing has run yet; the scheduler may still be swapped.
    Uninitialized,
    /// Idle between runs.
    Ready,
    Running,
    /// The last attempted step found no reaction with positive propensity.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Fired,
    Horizon,
    Exhausted,
}

/// A well-mixed reaction network driven by a stochastic scheduler.
///
/// Owns the species and reactions, the scheduler, the observers, the random
/// number generator and the simulated clock. Every structural or copy-number
/// change made through the network is pushed to the scheduler before the call
/// returns, so the schedule never lags behind the state.
#[derive(Debug)]
pub struct ReactionNetwork {
    system: ChemicalSystem,
    scheduler: Box<dyn Scheduler>,
    signals: SignalHub,
    rng: StdRng,
    time: f64,
    steps_fired: u64,
    state: SchedulerState,
    touched: Vec<ReactionId>,
}

impl Default for ReactionNetwork {
    fn default() -> Self {
        Self::new(&NetworkConfig::default())
    }
}

impl ReactionNetwork {
    pub fn new(config: &NetworkConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            system: ChemicalSystem::new(),
            scheduler: config.scheduler.create(),
            signals: SignalHub::new(),
            rng,
            time: 0.0,
            steps_fired: 0,
            state: SchedulerState::Uninitialized,
            touched: Vec::new(),
        }
    }

    pub fn system(&self) -> &ChemicalSystem {
        &self.system
    }

    pub fn scheduler_kind(&self) -> SchedulerKind {
        self.scheduler.kind()
    }

    /// Replaces the scheduler and hands it every registered reaction.
    ///
    /// # Errors
    ///
    /// [`EngineError::SchedulerLocked`] once the network has been initialized
    /// or has taken a step.
    pub fn set_scheduler(&mut self, kind: SchedulerKind) -> Result<(), EngineError> {
        if self.state != SchedulerState::Uninitialized {
            return Err(EngineError::SchedulerLocked);
        }
        if kind == self.scheduler.kind() {
            return Ok(());
        }
        let mut scheduler = kind.create();
        let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
        for &id in self.system.reaction_ids() {
            scheduler.register(id, &mut ctx)?;
        }
        self.scheduler = scheduler;
        debug!(scheduler = %kind, "Scheduler replaced");
        Ok(())
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Moves the time origin to the current time.
    ///
    /// Pending firing times are shifted by the same amount, so every reaction
    /// keeps its remaining waiting time.
    pub fn reset_time(&mut self) {
        let offset = self.time;
        self.scheduler.shift_time(offset);
        self.time = 0.0;
        debug!(offset, "Simulation clock reset");
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Reactions fired since the last `initialize`.
    pub fn steps_fired(&self) -> u64 {
        self.steps_fired
    }

    pub fn add_species(&mut self, name: &str, copy_number: CopyNumber) -> SpeciesId {
        let id = self.system.add_species(name, copy_number);
        debug!(species = name, copy_number, "Species added");
        id
    }

    pub fn add_species_with_limit(&mut self, name: &str, copy_number: CopyNumber, upper_limit: CopyNumber) -> SpeciesId {
        let id = self.system.add_species_with_limit(name, copy_number, upper_limit);
        debug!(species = name, copy_number, upper_limit, "Species added");
        id
    }

    /// Removes an unreferenced species and drops its observers.
    pub fn remove_species(&mut self, id: SpeciesId) -> Result<Species, EngineError> {
        let species = self.system.remove_species(id)?;
        let dropped = self.signals.drop_species(id);
        debug!(species = %species.name, dropped_subscriptions = dropped, "Species removed");
        Ok(species)
    }

    pub fn species(&self) -> impl Iterator<Item = (SpeciesId, &Species)> {
        self.system.species_iter()
    }

    pub fn find_species(&self, name: &str) -> Option<SpeciesId> {
        self.system.find_species_by_name(name)
    }

    pub fn copy_number(&self, id: SpeciesId) -> Result<CopyNumber, EngineError> {
        Ok(self.system.copy_number(id)?)
    }

    /// Overwrites a copy number and reschedules every reaction reading or producing it.
    ///
    /// Subscribers of the species are notified after rescheduling, unless the
    /// copy number did not change.
    pub fn set_copy_number(&mut self, id: SpeciesId, copy_number: CopyNumber) -> Result<(), EngineError> {
        let old = self.system.copy_number(id)?;
        let touched = self.system.set_copy_number(id, copy_number)?;
        self.reschedule(&touched)?;
        if old != copy_number {
            self.notify_species(id, copy_number as i64 - old as i64, copy_number);
        }
        Ok(())
    }

    pub fn increment(&mut self, id: SpeciesId) -> Result<CopyNumber, EngineError> {
        let touched = self.system.reactions_touching(id)?;
        let n = self.system.increment(id)?;
        self.reschedule(&touched)?;
        self.notify_species(id, 1, n);
        Ok(n)
    }

    pub fn decrement(&mut self, id: SpeciesId) -> Result<CopyNumber, EngineError> {
        let touched = self.system.reactions_touching(id)?;
        let n = self.system.decrement(id)?;
        self.reschedule(&touched)?;
        self.notify_species(id, -1, n);
        Ok(n)
    }

    fn notify_species(&mut self, species: SpeciesId, delta: i64, copy_number: CopyNumber) {
        self.signals.emit_species(&SpeciesEvent {
            species,
            delta,
            copy_number,
            time: self.time,
        });
    }

    pub fn set_upper_limit(&mut self, id: SpeciesId, upper_limit: Option<CopyNumber>) -> Result<(), EngineError> {
        let touched = self.system.set_upper_limit(id, upper_limit)?;
        self.reschedule(&touched)
    }

    /// Registers a reaction with the system and the scheduler.
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<ReactionId, EngineError> {
        let id = self.system.add_reaction(reaction)?;
        let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
        self.scheduler.register(id, &mut ctx)?;
        debug!(reaction = ?id, total = self.system.num_reactions(), "Reaction added");
        Ok(id)
    }

    /// Unregisters a reaction and drops every observer targeting it.
    pub fn remove_reaction(&mut self, id: ReactionId) -> Result<Reaction, EngineError> {
        let reaction = self.system.remove_reaction(id)?;
        self.scheduler.unregister(id);
        let dropped = self.signals.drop_reaction(id);
        debug!(reaction = ?id, dropped_subscriptions = dropped, "Reaction removed");
        Ok(reaction)
    }

    pub fn reactions(&self) -> impl Iterator<Item = (ReactionId, &Reaction)> {
        self.system.reactions_iter()
    }

    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.system.reaction(id)
    }

    pub fn display_reaction(&self, id: ReactionId) -> Option<ReactionDisplay<'_>> {
        self.system.display_reaction(id)
    }

    pub fn propensity(&self, id: ReactionId) -> Result<f64, EngineError> {
        Ok(self.system.propensity(id)?)
    }

    /// The reactions whose propensity may change when `id` fires.
    pub fn dependents(&mut self, id: ReactionId) -> Result<Vec<ReactionId>, EngineError> {
        Ok(self.system.dependents(id)?.to_vec())
    }

    /// Absolute time at which `id` is scheduled to fire, if the scheduler keeps one.
    pub fn scheduled_time(&self, id: ReactionId) -> Option<f64> {
        self.scheduler.scheduled_time(id)
    }

    pub fn set_rate(&mut self, id: ReactionId, rate: f64) -> Result<(), EngineError> {
        self.system.set_rate(id, rate)?;
        self.reschedule(&[id])
    }

    pub fn passivate(&mut self, id: ReactionId) -> Result<(), EngineError> {
        self.system.passivate(id)?;
        self.reschedule(&[id])
    }

    pub fn activate(&mut self, id: ReactionId) -> Result<(), EngineError> {
        self.system.activate(id)?;
        self.reschedule(&[id])
    }

    pub fn subscribe_reaction<F>(&mut self, id: ReactionId, callback: F) -> Result<SubscriptionId, EngineError>
    where
        F: FnMut(&ReactionEvent) + Send + 'static,
    {
        if self.system.reaction(id).is_none() {
            return Err(SystemError::ReactionNotFound(id).into());
        }
        Ok(self.signals.subscribe_reaction(id, Box::new(callback)))
    }

    /// Observes every firing in the network.
    pub fn subscribe_all<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ReactionEvent) + Send + 'static,
    {
        self.signals.subscribe_all(Box::new(callback))
    }

    pub fn subscribe_species<F>(&mut self, id: SpeciesId, callback: F) -> Result<SubscriptionId, EngineError>
    where
        F: FnMut(&SpeciesEvent) + Send + 'static,
    {
        if self.system.species(id).is_none() {
            return Err(SystemError::SpeciesNotFound(id).into());
        }
        Ok(self.signals.subscribe_species(id, Box::new(callback)))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.signals.unsubscribe(id)
    }

    pub fn is_signaling(&self, id: ReactionId) -> bool {
        self.signals.is_signaling(id)
    }

    /// Resets the clock to zero and rebuilds the schedule from the current state.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyNetwork`] if no reaction is registered.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.system.num_reactions() == 0 {
            return Err(EngineError::EmptyNetwork);
        }
        self.time = 0.0;
        self.steps_fired = 0;
        let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
        self.scheduler.initialize(&mut ctx)?;
        self.state = SchedulerState::Ready;
        info!(
            scheduler = %self.scheduler.kind(),
            species = self.system.num_species(),
            reactions = self.system.num_reactions(),
            "Network initialized"
        );
        Ok(())
    }

    /// Fires a single reaction. Returns `false` if the network is exhausted.
    pub fn step(&mut self) -> Result<bool, EngineError> {
        let fired = self.advance(f64::INFINITY)? == StepOutcome::Fired;
        self.settle();
        Ok(fired)
    }

    /// Fires up to `steps` reactions.
    ///
    /// Returns `true` if the whole budget was spent and `false` if the network
    /// ran out of reactions with positive propensity first.
    pub fn run_steps(&mut self, steps: u64) -> Result<bool, EngineError> {
        let mut completed = true;
        for _ in 0..steps {
            if self.advance(f64::INFINITY)? == StepOutcome::Exhausted {
                completed = false;
                break;
            }
        }
        self.settle();
        trace!(steps, completed, time = self.time, "Step budget processed");
        Ok(completed)
    }

    /// Fires every reaction scheduled up to `until` and moves the clock there.
    ///
    /// Returns `false` if the network ran out of firable reactions before the
    /// horizon. The clock still reaches `until` in that case.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidHorizon`] if `until` is not finite or lies before
    /// the current time.
    pub fn run_until(&mut self, until: f64) -> Result<bool, EngineError> {
        if !until.is_finite() || until < self.time {
            return Err(EngineError::InvalidHorizon {
                until,
                now: self.time,
            });
        }
        let completed = loop {
            match self.advance(until)? {
                StepOutcome::Fired => continue,
                StepOutcome::Horizon => break true,
                StepOutcome::Exhausted => break false,
            }
        };
        self.time = until;
        self.settle();
        trace!(until, completed, steps = self.steps_fired, "Horizon reached");
        Ok(completed)
    }

    pub fn run(&mut self, limit: RunLimit) -> Result<bool, EngineError> {
        match limit {
            RunLimit::Steps(steps) => self.run_steps(steps),
            RunLimit::Until(until) => self.run_until(until),
        }
    }

    fn advance(&mut self, horizon: f64) -> Result<StepOutcome, EngineError> {
        if !self.scheduler.is_ready() {
            return Err(EngineError::NotInitialized {
                scheduler: self.scheduler.kind().name(),
            });
        }

        let event = {
            let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
            self.scheduler.next_event(&mut ctx)?
        };

        match event {
            NextEvent::Exhausted => {
                if self.state != SchedulerState::Exhausted {
                    info!(time = self.time, steps = self.steps_fired, "Network exhausted");
                }
                self.state = SchedulerState::Exhausted;
                Ok(StepOutcome::Exhausted)
            }
            NextEvent::Fire { time, .. } if time > horizon => Ok(StepOutcome::Horizon),
            NextEvent::Fire { reaction, time } => {
                self.state = SchedulerState::Running;
                self.fire(reaction, time)?;
                Ok(StepOutcome::Fired)
            }
        }
    }

    fn fire(&mut self, reaction: ReactionId, time: f64) -> Result<(), EngineError> {
        if time < self.time {
            return Err(EngineError::Internal(format!(
                "reaction {:?} scheduled at {} before the current time {}",
                reaction, time, self.time
            )));
        }
        self.time = time;
        let deltas = self.system.fire(reaction)?;

        self.touched.clear();
        self.touched.extend_from_slice(self.system.dependents(reaction)?);
        let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
        self.scheduler
            .reschedule(Some(reaction), &self.touched, &mut ctx)?;
        self.steps_fired += 1;
        trace!(reaction = ?reaction, time, dependents = self.touched.len(), "Reaction fired");

        for delta in deltas {
            self.notify_species(delta.species, delta.delta, delta.copy_number);
        }
        self.signals.emit_reaction(&ReactionEvent { reaction, time });
        Ok(())
    }

    fn reschedule(&mut self, touched: &[ReactionId]) -> Result<(), EngineError> {
        let mut ctx = SchedulerContext::new(&self.system, self.time, &mut self.rng);
        self.scheduler.reschedule(None, touched, &mut ctx)
    }

    fn settle(&mut self) {
        match self.state {
            SchedulerState::Running => self.state = SchedulerState::Ready,
            SchedulerState::Uninitialized if self.scheduler.is_ready() => self.state = SchedulerState::Ready,
            _ => {}
        }
    }
}
