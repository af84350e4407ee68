use super::ids::ReactionId;

pub type CopyNumber = u64;

/// A chemical species tracked by an integer copy number.
///
/// A species records which reactions consume it and which produce it, so that
/// a change in its copy number can be traced to every reaction whose
/// propensity may have changed. Species are owned by a
/// [`ChemicalSystem`](super::system::ChemicalSystem) and only mutated through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    pub name: String,                        // Display name, not unique across containers
    pub(crate) copy_number: CopyNumber,      // Current number of molecules
    pub(crate) upper_limit: Option<CopyNumber>, // Producing reactions stop at this count
    as_reactant: Vec<ReactionId>,            // Reactions reading this species
    as_product: Vec<ReactionId>,             // Reactions writing this species
}

impl Species {
    pub(crate) fn new(name: &str, copy_number: CopyNumber, upper_limit: Option<CopyNumber>) -> Self {
        Self {
            name: name.to_string(),
            copy_number,
            upper_limit,
            as_reactant: Vec::new(),
            as_product: Vec::new(),
        }
    }

    #[inline]
    pub fn copy_number(&self) -> CopyNumber {
        self.copy_number
    }

    #[inline]
    pub fn upper_limit(&self) -> Option<CopyNumber> {
        self.upper_limit
    }

    pub fn reactant_reactions(&self) -> &[ReactionId] {
        &self.as_reactant
    }

    pub fn product_reactions(&self) -> &[ReactionId] {
        &self.as_product
    }

    /// Returns `true` while any reaction still holds a handle to this species.
    pub fn is_referenced(&self) -> bool {
        !self.as_reactant.is_empty() || !self.as_product.is_empty()
    }

    /// Whether `n` copies sit at or above the configured upper limit.
    #[inline]
    pub(crate) fn is_saturated_at(&self, n: CopyNumber) -> bool {
        self.upper_limit.is_some_and(|ulim| n >= ulim)
    }

    pub(crate) fn register_as_reactant(&mut self, reaction_id: ReactionId) {
        if !self.as_reactant.contains(&reaction_id) {
            self.as_reactant.push(reaction_id);
        }
    }

    pub(crate) fn register_as_product(&mut self, reaction_id: ReactionId) {
        if !self.as_product.contains(&reaction_id) {
            self.as_product.push(reaction_id);
        }
    }

    pub(crate) fn unregister(&mut self, reaction_id: ReactionId) {
        self.as_reactant.retain(|&id| id != reaction_id);
        self.as_product.retain(|&id| id != reaction_id);
    }

    /// Every reaction touching this species, reactant side first.
    pub(crate) fn touching_reactions(&self) -> impl Iterator<Item = ReactionId> + '_ {
        self.as_reactant
            .iter()
            .chain(self.as_product.iter())
            .copied()
    }
}
