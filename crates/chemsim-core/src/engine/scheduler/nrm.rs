use super::{NextEvent, Scheduler, SchedulerContext, SchedulerKind, draw_firing_time, rescale_tau};
use crate::core::ids::ReactionId;
use crate::engine::error::EngineError;
use crate::engine::heap::IndexedHeap;
use slotmap::SecondaryMap;
use tracing::{debug, trace};

/// Gibson and Bruck's next reaction method.
///
/// Each reaction carries an absolute firing time in an indexed min-heap, along
/// with the propensity that time was computed from. After a firing only the
/// fired reaction draws a fresh time; every dependent reuses its pending time
/// rescaled to its new propensity, so a step costs `O(D log R)` for `D`
/// dependents instead of a full scan.
#[derive(Debug, Default)]
pub struct NextReactionScheduler {
    queue: IndexedHeap<ReactionId>,
    propensities: SecondaryMap<ReactionId, f64>,
    initialized: bool,
}

impl NextReactionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule_fresh(&mut self, id: ReactionId, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        let a = ctx.system.propensity(id)?;
        let tau = draw_firing_time(ctx.rng, a, ctx.time);
        self.propensities.insert(id, a);
        self.queue.push(id, tau);
        Ok(())
    }

    fn rescale(&mut self, id: ReactionId, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        let a_new = ctx.system.propensity(id)?;
        let (Some(&a_old), Some(tau_old)) = (self.propensities.get(id), self.queue.priority(id)) else {
            return Err(EngineError::Internal(format!(
                "reaction {:?} is not scheduled",
                id
            )));
        };

        if a_new == a_old {
            return Ok(());
        }

        let tau_new = if a_old <= 0.0 || !tau_old.is_finite() {
            if a_new > 0.0 {
                debug!(reaction = ?id, a_new, "Reaction re-activated; drawing a fresh firing time");
            }
            draw_firing_time(ctx.rng, a_new, ctx.time)
        } else {
            rescale_tau(a_old, a_new, tau_old, ctx.time)
        };

        trace!(reaction = ?id, a_old, a_new, tau_old, tau_new, "Rescheduled dependent");
        self.propensities.insert(id, a_new);
        self.queue.update(id, tau_new);
        Ok(())
    }
}

impl Scheduler for NextReactionScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::NextReaction
    }

    fn is_ready(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        let system = ctx.system;
        self.queue = IndexedHeap::with_capacity(system.num_reactions());
        self.propensities.clear();
        for &id in system.reaction_ids() {
            self.schedule_fresh(id, ctx)?;
        }
        self.initialized = true;
        debug!(reactions = self.queue.len(), time = ctx.time, "Next reaction queue built");
        Ok(())
    }

    fn register(&mut self, id: ReactionId, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        if self.initialized {
            self.schedule_fresh(id, ctx)
        } else {
            // Parked until `initialize` draws real times for everything.
            self.propensities.insert(id, 0.0);
            self.queue.push(id, f64::INFINITY);
            Ok(())
        }
    }

    fn unregister(&mut self, id: ReactionId) {
        self.queue.remove(id);
        self.propensities.remove(id);
    }

    fn next_event(&mut self, _ctx: &mut SchedulerContext<'_>) -> Result<NextEvent, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized {
                scheduler: SchedulerKind::NextReaction.name(),
            });
        }
        match self.queue.peek() {
            Some((reaction, time)) if time.is_finite() => Ok(NextEvent::Fire { reaction, time }),
            _ => Ok(NextEvent::Exhausted),
        }
    }

    fn reschedule(
        &mut self,
        fired: Option<ReactionId>,
        touched: &[ReactionId],
        ctx: &mut SchedulerContext<'_>,
    ) -> Result<(), EngineError> {
        if !self.initialized {
            return Ok(());
        }
        for &id in touched {
            if Some(id) != fired {
                self.rescale(id, ctx)?;
            }
        }
        if let Some(id) = fired {
            self.schedule_fresh(id, ctx)?;
        }
        Ok(())
    }

    fn scheduled_time(&self, id: ReactionId) -> Option<f64> {
        self.queue.priority(id)
    }

    fn shift_time(&mut self, offset: f64) {
        self.queue.map_priorities(|_, tau| tau - offset);
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
