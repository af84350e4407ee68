use crate::core::ids::{ReactionId, SpeciesId};
use crate::core::species::CopyNumber;
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use std::fmt;

new_key_type! {
    pub struct SubscriptionId;
}

/// Emitted once each time a reaction fires, after the dependent cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionEvent {
    pub reaction: ReactionId,
    pub time: f64,
}

/// Emitted for every stoichiometry entry touched by a firing reaction, and for
/// every direct copy-number change made through the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesEvent {
    pub species: SpeciesId,
    pub delta: i64,
    pub copy_number: CopyNumber,
    pub time: f64,
}

pub type ReactionCallback = Box<dyn FnMut(&ReactionEvent) + Send>;
pub type SpeciesCallback = Box<dyn FnMut(&SpeciesEvent) + Send>;

enum Subscription {
    Reaction {
        target: ReactionId,
        callback: ReactionCallback,
    },
    AnyReaction {
        callback: ReactionCallback,
    },
    Species {
        target: SpeciesId,
        callback: SpeciesCallback,
    },
}

/// Observer lists for reaction firings and species copy-number changes.
///
/// Subscribers are invoked synchronously in subscription order. Every
/// subscription targeting a reaction or species is dropped together with its
/// target, so a callback never outlives the entity it observes.
#[derive(Default)]
pub struct SignalHub {
    subscriptions: SlotMap<SubscriptionId, Subscription>,
    by_reaction: SecondaryMap<ReactionId, Vec<SubscriptionId>>,
    by_species: SecondaryMap<SpeciesId, Vec<SubscriptionId>>,
    any_reaction: Vec<SubscriptionId>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn subscribe_reaction(&mut self, target: ReactionId, callback: ReactionCallback) -> SubscriptionId {
        let id = self
            .subscriptions
            .insert(Subscription::Reaction { target, callback });
        match self.by_reaction.get_mut(target) {
            Some(ids) => ids.push(id),
            None => {
                self.by_reaction.insert(target, vec![id]);
            }
        }
        id
    }

    pub fn subscribe_all(&mut self, callback: ReactionCallback) -> SubscriptionId {
        let id = self
            .subscriptions
            .insert(Subscription::AnyReaction { callback });
        self.any_reaction.push(id);
        id
    }

    pub fn subscribe_species(&mut self, target: SpeciesId, callback: SpeciesCallback) -> SubscriptionId {
        let id = self
            .subscriptions
            .insert(Subscription::Species { target, callback });
        match self.by_species.get_mut(target) {
            Some(ids) => ids.push(id),
            None => {
                self.by_species.insert(target, vec![id]);
            }
        }
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(subscription) = self.subscriptions.remove(id) else {
            return false;
        };
        match subscription {
            Subscription::Reaction { target, .. } => {
                if let Some(ids) = self.by_reaction.get_mut(target) {
                    ids.retain(|&s| s != id);
                }
            }
            Subscription::AnyReaction { .. } => self.any_reaction.retain(|&s| s != id),
            Subscription::Species { target, .. } => {
                if let Some(ids) = self.by_species.get_mut(target) {
                    ids.retain(|&s| s != id);
                }
            }
        }
        true
    }

    /// Drops every subscription observing `target`, returning how many were dropped.
    pub fn drop_reaction(&mut self, target: ReactionId) -> usize {
        let ids = self.by_reaction.remove(target).unwrap_or_default();
        for &id in &ids {
            self.subscriptions.remove(id);
        }
        ids.len()
    }

    pub fn drop_species(&mut self, target: SpeciesId) -> usize {
        let ids = self.by_species.remove(target).unwrap_or_default();
        for &id in &ids {
            self.subscriptions.remove(id);
        }
        ids.len()
    }

    pub fn is_signaling(&self, target: ReactionId) -> bool {
        self.by_reaction
            .get(target)
            .is_some_and(|ids| !ids.is_empty())
    }

    pub fn emit_reaction(&mut self, event: &ReactionEvent) {
        if let Some(ids) = self.by_reaction.get(event.reaction) {
            for &id in ids {
                if let Some(Subscription::Reaction { callback, .. }) = self.subscriptions.get_mut(id) {
                    callback(event);
                }
            }
        }
        for &id in &self.any_reaction {
            if let Some(Subscription::AnyReaction { callback }) = self.subscriptions.get_mut(id) {
                callback(event);
            }
        }
    }

    pub fn emit_species(&mut self, event: &SpeciesEvent) {
        if let Some(ids) = self.by_species.get(event.species) {
            for &id in ids {
                if let Some(Subscription::Species { callback, .. }) = self.subscriptions.get_mut(id) {
                    callback(event);
                }
            }
        }
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHub")
            .field("subscriptions", &self.subscriptions.len())
            .field("any_reaction", &self.any_reaction.len())
            .finish()
    }
}
