use super::ids::{ReactionId, SpeciesId};
use super::reaction::{Reaction, ReactionError, Stoichiometry};
use super::species::{CopyNumber, Species};
use slotmap::SlotMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SystemError {
    #[error("Species {0:?} does not exist (removed or never created)")]
    SpeciesNotFound(SpeciesId),

    #[error("Reaction {0:?} does not exist (removed or never created)")]
    ReactionNotFound(ReactionId),

    #[error("Species '{name}' is still referenced by {reactions} reaction(s)")]
    SpeciesInUse { name: String, reactions: usize },

    #[error("Copy number of species '{name}' would become negative")]
    NegativeCopyNumber { name: String },

    #[error("Reaction {reaction:?} was fired with zero propensity")]
    ZeroPropensityFiring { reaction: ReactionId },

    #[error("Invalid reaction: {0}")]
    Reaction(#[from] ReactionError),
}

/// A copy-number change applied by a firing reaction, one per stoichiometry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeciesDelta {
    pub species: SpeciesId,
    pub delta: i64,
    pub copy_number: CopyNumber,
}

/// Owns every species and reaction of one network.
///
/// This is the arena behind the reaction network: species and reactions live in
/// slot maps and refer to each other only through generation-checked handles.
/// Every mutation goes through this type so that the species-reaction incidence
/// lists, the passivation counters and the cached dependency sets stay in sync.
#[derive(Debug, Clone, Default)]
pub struct ChemicalSystem {
    /// Primary storage for species.
    species: SlotMap<SpeciesId, Species>,
    /// Primary storage for reactions.
    reactions: SlotMap<ReactionId, Reaction>,
    /// Species handles in creation order.
    species_order: Vec<SpeciesId>,
    /// Reaction handles in registration order; schedulers scan in this order.
    reaction_order: Vec<ReactionId>,
}

impl ChemicalSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id)
    }

    /// Returns an iterator over all species in creation order.
    pub fn species_iter(&self) -> impl Iterator<Item = (SpeciesId, &Species)> {
        self.species_order
            .iter()
            .filter_map(|&id| self.species.get(id).map(|s| (id, s)))
    }

    /// Finds the first species carrying `name`.
    pub fn find_species_by_name(&self, name: &str) -> Option<SpeciesId> {
        self.species_iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    pub fn num_species(&self) -> usize {
        self.species.len()
    }

    pub fn reaction(&self, id: ReactionId) -> Option<&Reaction> {
        self.reactions.get(id)
    }

    /// Returns an iterator over all reactions in registration order.
    pub fn reactions_iter(&self) -> impl Iterator<Item = (ReactionId, &Reaction)> {
        self.reaction_order
            .iter()
            .filter_map(|&id| self.reactions.get(id).map(|r| (id, r)))
    }

    /// Reaction handles in registration order.
    pub fn reaction_ids(&self) -> &[ReactionId] {
        &self.reaction_order
    }

    pub fn num_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn copy_number(&self, id: SpeciesId) -> Result<CopyNumber, SystemError> {
        self.species
            .get(id)
            .map(Species::copy_number)
            .ok_or(SystemError::SpeciesNotFound(id))
    }

    pub fn add_species(&mut self, name: &str, copy_number: CopyNumber) -> SpeciesId {
        self.insert_species(Species::new(name, copy_number, None))
    }

    pub fn add_species_with_limit(
        &mut self,
        name: &str,
        copy_number: CopyNumber,
        upper_limit: CopyNumber,
    ) -> SpeciesId {
        self.insert_species(Species::new(name, copy_number, Some(upper_limit)))
    }

    fn insert_species(&mut self, species: Species) -> SpeciesId {
        let id = self.species.insert(species);
        self.species_order.push(id);
        id
    }

    /// Removes a species that no reaction references any more.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::SpeciesInUse`] while a live reaction still holds a
    /// handle to the species; the species is left untouched in that case.
    pub fn remove_species(&mut self, id: SpeciesId) -> Result<Species, SystemError> {
        let species = self
            .species
            .get(id)
            .ok_or(SystemError::SpeciesNotFound(id))?;
        if species.is_referenced() {
            let mut users: Vec<ReactionId> = species.touching_reactions().collect();
            users.sort_unstable();
            users.dedup();
            return Err(SystemError::SpeciesInUse {
                name: species.name.clone(),
                reactions: users.len(),
            });
        }

        self.species_order.retain(|&s| s != id);
        self.species
            .remove(id)
            .ok_or(SystemError::SpeciesNotFound(id))
    }

    /// Registers a reaction and binds it to its species.
    ///
    /// The passivation counters of the new reaction are derived from the current
    /// copy numbers, and the dependency sets of every reaction sharing a species
    /// with it are invalidated.
    pub fn add_reaction(&mut self, mut reaction: Reaction) -> Result<ReactionId, SystemError> {
        for sid in reaction.species() {
            if !self.species.contains_key(sid) {
                return Err(SystemError::SpeciesNotFound(sid));
            }
        }

        let depleted = reaction
            .reactants()
            .iter()
            .filter(|e| self.species[e.species].copy_number < e.coefficient as CopyNumber)
            .count() as u32;
        let saturated = reaction
            .products()
            .iter()
            .filter(|e| {
                let species = &self.species[e.species];
                species.is_saturated_at(species.copy_number)
            })
            .count() as u32;
        reaction.depleted_reactants = depleted;
        reaction.saturated_products = saturated;
        reaction.dependents = None;

        let id = self.reactions.insert(reaction);
        self.reaction_order.push(id);

        let reaction = &self.reactions[id];
        for entry in reaction.reactants() {
            self.species[entry.species].register_as_reactant(id);
        }
        for entry in reaction.products() {
            self.species[entry.species].register_as_product(id);
        }
        self.invalidate_dependents_around(id);

        Ok(id)
    }

    /// Unregisters a reaction from its species and from every dependency set.
    pub fn remove_reaction(&mut self, id: ReactionId) -> Result<Reaction, SystemError> {
        if !self.reactions.contains_key(id) {
            return Err(SystemError::ReactionNotFound(id));
        }
        self.invalidate_dependents_around(id);

        let species: Vec<SpeciesId> = self.reactions[id].species().collect();
        for sid in species {
            if let Some(s) = self.species.get_mut(sid) {
                s.unregister(id);
            }
        }
        self.reaction_order.retain(|&r| r != id);

        let mut reaction = self
            .reactions
            .remove(id)
            .ok_or(SystemError::ReactionNotFound(id))?;
        reaction.dependents = None;
        Ok(reaction)
    }

    /// Current propensity of a reaction. Pure; no cached state is touched.
    pub fn propensity(&self, id: ReactionId) -> Result<f64, SystemError> {
        let reaction = self
            .reactions
            .get(id)
            .ok_or(SystemError::ReactionNotFound(id))?;
        Ok(self.propensity_of(reaction))
    }

    fn propensity_of(&self, reaction: &Reaction) -> f64 {
        reaction.propensity_with(|sid| self.species.get(sid).map_or(0, Species::copy_number))
    }

    /// Reactions whose propensity may change when `id` fires.
    ///
    /// The set holds every other reaction sharing at least one species with
    /// `id`. It is materialized on first use and cached until a reaction
    /// sharing a species is added or removed.
    pub fn dependents(&mut self, id: ReactionId) -> Result<&[ReactionId], SystemError> {
        let reaction = self
            .reactions
            .get(id)
            .ok_or(SystemError::ReactionNotFound(id))?;

        if reaction.dependents.is_none() {
            let mut deps: Vec<ReactionId> = reaction
                .species()
                .filter_map(|sid| self.species.get(sid))
                .flat_map(Species::touching_reactions)
                .filter(|&r| r != id)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            self.reactions[id].dependents = Some(deps);
        }

        Ok(self.reactions[id].dependents.as_deref().unwrap_or_default())
    }

    /// Reactions whose propensity depends on the copy number of `id`.
    pub fn reactions_touching(&self, id: SpeciesId) -> Result<Vec<ReactionId>, SystemError> {
        let species = self
            .species
            .get(id)
            .ok_or(SystemError::SpeciesNotFound(id))?;
        let mut touching: Vec<ReactionId> = species.touching_reactions().collect();
        touching.sort_unstable();
        touching.dedup();
        Ok(touching)
    }

    /// Fires a reaction once.
    ///
    /// Reactants are decremented by their coefficients first, then products are
    /// incremented, so a species on both sides nets out. The firing is checked
    /// in full before any copy number changes: on error the system is untouched.
    ///
    /// # Errors
    ///
    /// [`SystemError::ZeroPropensityFiring`] if the reaction is passivated or
    /// has zero propensity, [`SystemError::NegativeCopyNumber`] if a reactant
    /// lacks the copies its coefficient requires.
    pub fn fire(&mut self, id: ReactionId) -> Result<Vec<SpeciesDelta>, SystemError> {
        let reaction = self
            .reactions
            .get(id)
            .ok_or(SystemError::ReactionNotFound(id))?;

        for entry in reaction.reactants() {
            let species = self
                .species
                .get(entry.species)
                .ok_or(SystemError::SpeciesNotFound(entry.species))?;
            if species.copy_number < entry.coefficient as CopyNumber {
                return Err(SystemError::NegativeCopyNumber {
                    name: species.name.clone(),
                });
            }
        }
        if self.propensity_of(reaction) <= 0.0 {
            return Err(SystemError::ZeroPropensityFiring { reaction: id });
        }

        let num_reactants = reaction.reactants().len();
        let num_products = reaction.products().len();
        let mut deltas = Vec::with_capacity(num_reactants + num_products);

        for i in 0..num_reactants {
            let entry = self.reactions[id].reactants()[i];
            let n = self.species[entry.species].copy_number - entry.coefficient as CopyNumber;
            self.update_copy_number(entry.species, n);
            deltas.push(SpeciesDelta {
                species: entry.species,
                delta: -(entry.coefficient as i64),
                copy_number: n,
            });
        }
        for i in 0..num_products {
            let entry = self.reactions[id].products()[i];
            let n = self.species[entry.species].copy_number + entry.coefficient as CopyNumber;
            self.update_copy_number(entry.species, n);
            deltas.push(SpeciesDelta {
                species: entry.species,
                delta: entry.coefficient as i64,
                copy_number: n,
            });
        }

        Ok(deltas)
    }

    pub fn increment(&mut self, id: SpeciesId) -> Result<CopyNumber, SystemError> {
        let n = self.copy_number(id)? + 1;
        self.update_copy_number(id, n);
        Ok(n)
    }

    pub fn decrement(&mut self, id: SpeciesId) -> Result<CopyNumber, SystemError> {
        let species = self
            .species
            .get(id)
            .ok_or(SystemError::SpeciesNotFound(id))?;
        let n = species
            .copy_number
            .checked_sub(1)
            .ok_or_else(|| SystemError::NegativeCopyNumber {
                name: species.name.clone(),
            })?;
        self.update_copy_number(id, n);
        Ok(n)
    }

    /// Overwrites a copy number, returning the reactions it may affect.
    pub fn set_copy_number(
        &mut self,
        id: SpeciesId,
        copy_number: CopyNumber,
    ) -> Result<Vec<ReactionId>, SystemError> {
        let touching = self.reactions_touching(id)?;
        self.update_copy_number(id, copy_number);
        Ok(touching)
    }

    /// Changes the upper limit of a species, returning the reactions it may affect.
    pub fn set_upper_limit(
        &mut self,
        id: SpeciesId,
        upper_limit: Option<CopyNumber>,
    ) -> Result<Vec<ReactionId>, SystemError> {
        let touching = self.reactions_touching(id)?;
        let species = &mut self.species[id];
        let n = species.copy_number;
        let was_saturated = species.is_saturated_at(n);
        species.upper_limit = upper_limit;
        let now_saturated = species.is_saturated_at(n);

        if was_saturated != now_saturated {
            let species = &self.species[id];
            for &rid in species.product_reactions() {
                if let Some(reaction) = self.reactions.get_mut(rid) {
                    adjust_counter(&mut reaction.saturated_products, was_saturated, now_saturated);
                }
            }
        }
        Ok(touching)
    }

    pub fn set_rate(&mut self, id: ReactionId, rate: f64) -> Result<(), SystemError> {
        let reaction = self
            .reactions
            .get_mut(id)
            .ok_or(SystemError::ReactionNotFound(id))?;
        reaction.set_rate(rate)?;
        Ok(())
    }

    /// Administratively disables a reaction without removing it.
    pub fn passivate(&mut self, id: ReactionId) -> Result<(), SystemError> {
        self.set_disabled(id, true)
    }

    /// Lifts an administrative passivation. Copy-number passivation still applies.
    pub fn activate(&mut self, id: ReactionId) -> Result<(), SystemError> {
        self.set_disabled(id, false)
    }

    fn set_disabled(&mut self, id: ReactionId, disabled: bool) -> Result<(), SystemError> {
        let reaction = self
            .reactions
            .get_mut(id)
            .ok_or(SystemError::ReactionNotFound(id))?;
        reaction.disabled = disabled;
        Ok(())
    }

    /// Renders a reaction as `A + 2 B -> C (k = 1.5)`.
    pub fn display_reaction(&self, id: ReactionId) -> Option<ReactionDisplay<'_>> {
        self.reactions.get(id).map(|reaction| ReactionDisplay {
            system: self,
            reaction,
        })
    }

    /// Writes a new copy number and updates the passivation counters of every
    /// reaction whose threshold was crossed.
    fn update_copy_number(&mut self, id: SpeciesId, new_n: CopyNumber) {
        let species = &mut self.species[id];
        let old_n = species.copy_number;
        species.copy_number = new_n;
        if old_n == new_n {
            return;
        }

        let species = &self.species[id];
        for &rid in species.reactant_reactions() {
            let Some(reaction) = self.reactions.get_mut(rid) else {
                continue;
            };
            if let Some(coefficient) = reaction.reactant_coefficient(id) {
                let coefficient = coefficient as CopyNumber;
                adjust_counter(
                    &mut reaction.depleted_reactants,
                    old_n < coefficient,
                    new_n < coefficient,
                );
            }
        }
        let was_saturated = species.is_saturated_at(old_n);
        let now_saturated = species.is_saturated_at(new_n);
        if was_saturated != now_saturated {
            for &rid in species.product_reactions() {
                if let Some(reaction) = self.reactions.get_mut(rid) {
                    adjust_counter(&mut reaction.saturated_products, was_saturated, now_saturated);
                }
            }
        }
    }

    fn invalidate_dependents_around(&mut self, id: ReactionId) {
        let Some(reaction) = self.reactions.get(id) else {
            return;
        };
        let neighbours: Vec<ReactionId> = reaction
            .species()
            .filter_map(|sid| self.species.get(sid))
            .flat_map(Species::touching_reactions)
            .collect();
        for rid in neighbours {
            if let Some(r) = self.reactions.get_mut(rid) {
                r.dependents = None;
            }
        }
        if let Some(r) = self.reactions.get_mut(id) {
            r.dependents = None;
        }
    }
}

#[inline]
fn adjust_counter(counter: &mut u32, was: bool, now: bool) {
    match (was, now) {
        (false, true) => *counter += 1,
        (true, false) => *counter -= 1,
        _ => {}
    }
}

pub struct ReactionDisplay<'a> {
    system: &'a ChemicalSystem,
    reaction: &'a Reaction,
}

impl ReactionDisplay<'_> {
    fn write_side(
        &self,
        f: &mut fmt::Formatter<'_>,
        entries: &[Stoichiometry],
    ) -> fmt::Result {
        if entries.is_empty() {
            return write!(f, "∅");
        }
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            let name = self
                .system
                .species(entry.species)
                .map_or("?", |s| s.name.as_str());
            if entry.coefficient > 1 {
                write!(f, "{} {}", entry.coefficient, name)?;
            } else {
                write!(f, "{}", name)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ReactionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_side(f, self.reaction.reactants())?;
        write!(f, " -> ")?;
        self.write_side(f, self.reaction.products())?;
        write!(f, " (k = {})", self.reaction.rate())?;
        if self.reaction.is_disabled() {
            write!(f, " [disabled]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRefs {
        a: SpeciesId,
        b: SpeciesId,
        c: SpeciesId,
        binding: ReactionId,
        unbinding: ReactionId,
    }

    fn create_binding_system() -> (ChemicalSystem, TestRefs) {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 2);
        let b = system.add_species("B", 1);
        let c = system.add_species("C", 0);

        let binding = system
            .add_reaction(Reaction::new(&[a, b], &[c], 1.0).unwrap())
            .unwrap();
        let unbinding = system
            .add_reaction(Reaction::new(&[c], &[a, b], 0.5).unwrap())
            .unwrap();

        let refs = TestRefs {
            a,
            b,
            c,
            binding,
            unbinding,
        };
        (system, refs)
    }

    #[test]
    fn system_creation_and_access() {
        let (system, refs) = create_binding_system();

        assert_eq!(system.num_species(), 3);
        assert_eq!(system.num_reactions(), 2);
        assert_eq!(system.reaction_ids(), &[refs.binding, refs.unbinding]);
        assert_eq!(system.find_species_by_name("B"), Some(refs.b));
        assert!(system.find_species_by_name("Z").is_none());

        let a = system.species(refs.a).unwrap();
        assert_eq!(a.reactant_reactions(), &[refs.binding]);
        assert_eq!(a.product_reactions(), &[refs.unbinding]);
    }

    #[test]
    fn add_reaction_derives_passivation_from_current_copy_numbers() {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 1);
        let b = system.add_species_with_limit("B", 3, 3);
        let c = system.add_species("C", 5);

        let dimerize = system.add_reaction(Reaction::new(&[a, a], &[c], 1.0).unwrap()).unwrap();
        let fill = system.add_reaction(Reaction::new(&[c], &[b], 1.0).unwrap()).unwrap();
        let drain = system.add_reaction(Reaction::new(&[c], &[a], 1.0).unwrap()).unwrap();

        let dimerize = system.reaction(dimerize).unwrap();
        assert_eq!(dimerize.depleted_reactants, 1);
        assert_eq!(dimerize.saturated_products, 0);
        let fill = system.reaction(fill).unwrap();
        assert_eq!(fill.depleted_reactants, 0);
        assert_eq!(fill.saturated_products, 1);
        assert!(!system.reaction(drain).unwrap().is_passivated());
    }

    #[test]
    fn add_reaction_rejects_unknown_species() {
        let (mut system, refs) = create_binding_system();
        system.remove_reaction(refs.unbinding).unwrap();
        system.remove_reaction(refs.binding).unwrap();
        system.remove_species(refs.c).unwrap();

        let result = system.add_reaction(Reaction::new(&[refs.a], &[refs.c], 1.0).unwrap());
        assert_eq!(result, Err(SystemError::SpeciesNotFound(refs.c)));
        assert!(system.species(refs.a).unwrap().reactant_reactions().is_empty());
    }

    #[test]
    fn fire_conserves_stoichiometry() {
        let (mut system, refs) = create_binding_system();

        let deltas = system.fire(refs.binding).unwrap();

        assert_eq!(system.copy_number(refs.a).unwrap(), 1);
        assert_eq!(system.copy_number(refs.b).unwrap(), 0);
        assert_eq!(system.copy_number(refs.c).unwrap(), 1);
        assert_eq!(
            deltas,
            vec![
                SpeciesDelta { species: refs.a, delta: -1, copy_number: 1 },
                SpeciesDelta { species: refs.b, delta: -1, copy_number: 0 },
                SpeciesDelta { species: refs.c, delta: 1, copy_number: 1 },
            ]
        );
    }

    #[test]
    fn depleting_a_reactant_passivates_and_refilling_reactivates() {
        let (mut system, refs) = create_binding_system();
        assert!(system.reaction(refs.unbinding).unwrap().is_passivated());

        system.fire(refs.binding).unwrap();
        assert!(system.reaction(refs.binding).unwrap().is_passivated());
        assert_eq!(system.propensity(refs.binding).unwrap(), 0.0);
        assert!(!system.reaction(refs.unbinding).unwrap().is_passivated());
        assert_eq!(system.propensity(refs.unbinding).unwrap(), 0.5);

        system.fire(refs.unbinding).unwrap();
        assert!(!system.reaction(refs.binding).unwrap().is_passivated());
        assert_eq!(system.propensity(refs.binding).unwrap(), 2.0);
    }

    #[test]
    fn firing_a_zero_propensity_reaction_is_rejected_without_mutation() {
        let (mut system, refs) = create_binding_system();

        let result = system.fire(refs.unbinding);

        assert!(matches!(result, Err(SystemError::NegativeCopyNumber { .. })));
        assert_eq!(system.copy_number(refs.a).unwrap(), 2);
        assert_eq!(system.copy_number(refs.c).unwrap(), 0);

        system.passivate(refs.binding).unwrap();
        assert_eq!(
            system.fire(refs.binding),
            Err(SystemError::ZeroPropensityFiring { reaction: refs.binding })
        );
        assert_eq!(system.copy_number(refs.a).unwrap(), 2);
    }

    #[test]
    fn upper_limit_passivates_producing_reactions() {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 5);
        let b = system.add_species_with_limit("B", 0, 2);
        let conversion = system
            .add_reaction(Reaction::new(&[a], &[b], 1.0).unwrap())
            .unwrap();

        system.fire(conversion).unwrap();
        assert!(!system.reaction(conversion).unwrap().is_passivated());
        system.fire(conversion).unwrap();
        assert!(system.reaction(conversion).unwrap().is_passivated());
        assert_eq!(system.copy_number(b).unwrap(), 2);

        system.decrement(b).unwrap();
        assert!(!system.reaction(conversion).unwrap().is_passivated());

        system.set_upper_limit(b, Some(1)).unwrap();
        assert!(system.reaction(conversion).unwrap().is_passivated());
        system.set_upper_limit(b, None).unwrap();
        assert!(!system.reaction(conversion).unwrap().is_passivated());
    }

    #[test]
    fn decrement_below_zero_is_an_error() {
        let (mut system, refs) = create_binding_system();
        assert_eq!(system.decrement(refs.c), Err(SystemError::NegativeCopyNumber { name: "C".into() }));
        assert_eq!(system.increment(refs.c), Ok(1));
        assert_eq!(system.decrement(refs.c), Ok(0));
    }

    #[test]
    fn dependents_share_a_species_and_exclude_self() {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 1);
        let b = system.add_species("B", 0);
        let c = system.add_species("C", 0);
        let d = system.add_species("D", 0);
        let ab = system.add_reaction(Reaction::new(&[a], &[b], 1.0).unwrap()).unwrap();
        let bc = system.add_reaction(Reaction::new(&[b], &[c], 1.0).unwrap()).unwrap();
        let cd = system.add_reaction(Reaction::new(&[c], &[d], 1.0).unwrap()).unwrap();

        assert_eq!(system.dependents(ab).unwrap(), &[bc]);
        let mut expected = vec![ab, cd];
        expected.sort_unstable();
        assert_eq!(system.dependents(bc).unwrap(), expected.as_slice());

        let da = system.add_reaction(Reaction::new(&[d], &[a], 1.0).unwrap()).unwrap();
        let mut expected = vec![bc, da];
        expected.sort_unstable();
        assert_eq!(system.dependents(ab).unwrap(), expected.as_slice());

        system.remove_reaction(bc).unwrap();
        assert_eq!(system.dependents(ab).unwrap(), &[da]);
        assert_eq!(system.dependents(bc), Err(SystemError::ReactionNotFound(bc)));
    }

    #[test]
    fn removing_a_reaction_clears_every_reference() {
        let (mut system, refs) = create_binding_system();
        assert_eq!(system.dependents(refs.unbinding).unwrap(), &[refs.binding]);

        let removed = system.remove_reaction(refs.binding).unwrap();
        assert_eq!(removed.rate(), 1.0);

        assert!(system.reaction(refs.binding).is_none());
        assert_eq!(system.reaction_ids(), &[refs.unbinding]);
        for sid in [refs.a, refs.b, refs.c] {
            let species = system.species(sid).unwrap();
            assert!(!species.reactant_reactions().contains(&refs.binding));
            assert!(!species.product_reactions().contains(&refs.binding));
        }
        assert!(system.dependents(refs.unbinding).unwrap().is_empty());
        assert_eq!(
            system.remove_reaction(refs.binding),
            Err(SystemError::ReactionNotFound(refs.binding))
        );
    }

    #[test]
    fn referenced_species_cannot_be_removed() {
        let (mut system, refs) = create_binding_system();

        let result = system.remove_species(refs.a);
        assert_eq!(
            result,
            Err(SystemError::SpeciesInUse { name: "A".into(), reactions: 2 })
        );
        assert!(system.species(refs.a).is_some());

        system.remove_reaction(refs.binding).unwrap();
        system.remove_reaction(refs.unbinding).unwrap();
        let removed = system.remove_species(refs.a).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(system.copy_number(refs.a), Err(SystemError::SpeciesNotFound(refs.a)));
    }

    #[test]
    fn set_copy_number_reports_touching_reactions_and_updates_passivation() {
        let (mut system, refs) = create_binding_system();

        let touched = system.set_copy_number(refs.c, 3).unwrap();
        let mut expected = vec![refs.binding, refs.unbinding];
        expected.sort_unstable();
        assert_eq!(touched, expected);
        assert_eq!(system.propensity(refs.unbinding).unwrap(), 1.5);

        system.set_copy_number(refs.b, 0).unwrap();
        assert!(system.reaction(refs.binding).unwrap().is_passivated());
    }

    #[test]
    fn dimerization_needs_two_copies() {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 3);
        let d = system.add_species("D", 0);
        let dimerize = system
            .add_reaction(Reaction::new(&[a, a], &[d], 1.0).unwrap())
            .unwrap();

        system.fire(dimerize).unwrap();
        assert_eq!(system.copy_number(a).unwrap(), 1);
        assert!(system.reaction(dimerize).unwrap().is_passivated());
        assert!(matches!(
            system.fire(dimerize),
            Err(SystemError::NegativeCopyNumber { .. })
        ));
        assert_eq!(system.copy_number(a).unwrap(), 1);
        assert_eq!(system.copy_number(d).unwrap(), 1);
    }

    #[test]
    fn display_renders_stoichiometry() {
        let mut system = ChemicalSystem::new();
        let a = system.add_species("A", 0);
        let b = system.add_species("B", 0);
        let r = system
            .add_reaction(Reaction::new(&[a, b, b], &[], 1.5).unwrap())
            .unwrap();
        let s = system
            .add_reaction(Reaction::new(&[], &[a], 2.0).unwrap())
            .unwrap();
        system.passivate(s).unwrap();

        assert_eq!(system.display_reaction(r).unwrap().to_string(), "A + 2 B -> ∅ (k = 1.5)");
        assert_eq!(
            system.display_reaction(s).unwrap().to_string(),
            "∅ -> A (k = 2) [disabled]"
        );
    }
}
