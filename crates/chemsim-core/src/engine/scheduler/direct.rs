use super::{EXHAUSTION_THRESHOLD, NextEvent, Scheduler, SchedulerContext, SchedulerKind};
use crate::core::ids::ReactionId;
use crate::engine::error::EngineError;
use rand::Rng;
use rand_distr::Exp1;
use tracing::{trace, warn};

/// Gillespie's direct method.
///
/// Keeps no schedule between steps: every call recomputes all propensities in
/// registration order, draws the waiting time from their sum and picks the
/// reaction by a linear scan over the cumulative sums.
#[derive(Debug, Default)]
pub struct DirectScheduler {
    order: Vec<ReactionId>,
    scratch: Vec<f64>,
}

impl DirectScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for DirectScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Direct
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn initialize(&mut self, ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        self.order.clear();
        self.order.extend_from_slice(ctx.system.reaction_ids());
        self.scratch.clear();
        Ok(())
    }

    fn register(&mut self, id: ReactionId, _ctx: &mut SchedulerContext<'_>) -> Result<(), EngineError> {
        if !self.order.contains(&id) {
            self.order.push(id);
        }
        Ok(())
    }

    fn unregister(&mut self, id: ReactionId) {
        self.order.retain(|&r| r != id);
    }

    fn next_event(&mut self, ctx: &mut SchedulerContext<'_>) -> Result<NextEvent, EngineError> {
        if self.order.is_empty() {
            return Ok(NextEvent::Exhausted);
        }

        self.scratch.clear();
        let mut a_total = 0.0;
        for &id in &self.order {
            let a = ctx.system.propensity(id)?;
            self.scratch.push(a);
            a_total += a;
        }

        if a_total < EXHAUSTION_THRESHOLD {
            trace!(a_total, "Total propensity vanished; network exhausted");
            return Ok(NextEvent::Exhausted);
        }

        if !a_total.is_finite() {
            return Err(EngineError::Internal(format!(
                "total propensity {} is not finite",
                a_total
            )));
        }

        let e: f64 = ctx.rng.sample(Exp1);
        let tau = e / a_total;
        let mu = ctx.rng.gen_range(0.0..a_total);

        let mut cumulative = 0.0;
        let mut chosen = None;
        for (&id, &a) in self.order.iter().zip(&self.scratch) {
            cumulative += a;
            if cumulative > mu {
                chosen = Some(id);
                break;
            }
        }

        let reaction = match chosen {
            Some(id) => id,
            None => {
                let fallback = self
                    .order
                    .iter()
                    .zip(&self.scratch)
                    .rev()
                    .find(|&(_, &a)| a > 0.0)
                    .map(|(&id, _)| id)
                    .ok_or_else(|| {
                        EngineError::Internal("no reaction with positive propensity despite non-zero total".to_string())
                    })?;
                warn!(
                    mu,
                    cumulative,
                    a_total,
                    "Cumulative propensity never exceeded the threshold; falling back to the last active reaction"
                );
                fallback
            }
        };

        Ok(NextEvent::Fire {
            reaction,
            time: ctx.time + tau,
        })
    }

    fn reschedule(
        &mut self,
        _fired: Option<ReactionId>,
        _touched: &[ReactionId],
        _ctx: &mut SchedulerContext<'_>,
    ) -> Result<(), EngineError> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}
