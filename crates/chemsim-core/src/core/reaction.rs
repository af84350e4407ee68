use super::ids::{ReactionId, SpeciesId};
use super::species::CopyNumber;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReactionError {
    #[error("Invalid rate constant {0}: rates must be finite and non-negative")]
    InvalidRate(f64),
    #[error("A reaction needs at least one reactant or product")]
    Empty,
    #[error("Stoichiometric coefficient of species {species:?} must be positive")]
    ZeroCoefficient { species: SpeciesId },
    #[error("Stoichiometric coefficient of species {species:?} overflows")]
    CoefficientOverflow { species: SpeciesId },
}

/// One entry of a reactant or product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stoichiometry {
    pub species: SpeciesId,
    pub coefficient: u32,
}

impl Stoichiometry {
    pub fn new(species: SpeciesId, coefficient: u32) -> Self {
        Self {
            species,
            coefficient,
        }
    }
}

/// An elementary reaction with a fixed reactant/product shape and a mutable rate.
///
/// The shape is fixed at construction: a reaction cannot gain or lose species
/// after it has been built. Repeated species in the input lists are merged into
/// one entry whose coefficient counts the repetitions, keeping the order of
/// first appearance.
///
/// Passivation has two independent sources. An administrative flag set through
/// [`ChemicalSystem::passivate`](super::system::ChemicalSystem::passivate), and
/// copy-number tracking: a reaction is passivated while any reactant has fewer
/// copies than its coefficient, or any product sits at its upper limit. The
/// counters below are maintained by the owning system on every copy-number
/// change.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    reactants: Vec<Stoichiometry>,
    products: Vec<Stoichiometry>,
    rate: f64,
    bare_rate: f64,
    label: Option<String>,
    pub(crate) disabled: bool,
    pub(crate) depleted_reactants: u32,
    pub(crate) saturated_products: u32,
    pub(crate) dependents: Option<Vec<ReactionId>>,
}

impl Reaction {
    /// Builds a reaction from plain species lists, one entry per molecule.
    ///
    /// `A + A -> B` is written as `&[a, a]`, `&[b]`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionError`] if the rate is negative or not finite, or if
    /// both lists are empty.
    pub fn new(reactants: &[SpeciesId], products: &[SpeciesId], rate: f64) -> Result<Self, ReactionError> {
        Self::from_stoichiometry(
            reactants.iter().map(|&s| Stoichiometry::new(s, 1)).collect(),
            products.iter().map(|&s| Stoichiometry::new(s, 1)).collect(),
            rate,
        )
    }

    /// Builds a reaction from explicit stoichiometric coefficients.
    pub fn from_stoichiometry(
        reactants: Vec<Stoichiometry>,
        products: Vec<Stoichiometry>,
        rate: f64,
    ) -> Result<Self, ReactionError> {
        validate_rate(rate)?;
        if reactants.is_empty() && products.is_empty() {
            return Err(ReactionError::Empty);
        }
        if let Some(entry) = reactants
            .iter()
            .chain(products.iter())
            .find(|e| e.coefficient == 0)
        {
            return Err(ReactionError::ZeroCoefficient {
                species: entry.species,
            });
        }

        Ok(Self {
            reactants: coalesce(reactants)?,
            products: coalesce(products)?,
            rate,
            bare_rate: rate,
            label: None,
            disabled: false,
            depleted_reactants: 0,
            saturated_products: 0,
            dependents: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn reactants(&self) -> &[Stoichiometry] {
        &self.reactants
    }

    pub fn products(&self) -> &[Stoichiometry] {
        &self.products
    }

    /// Total reactant multiplicity, `M`.
    pub fn num_reactants(&self) -> u32 {
        self.reactants.iter().map(|e| e.coefficient).sum()
    }

    /// Total product multiplicity, `N`.
    pub fn num_products(&self) -> u32 {
        self.products.iter().map(|e| e.coefficient).sum()
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// The rate the reaction was constructed with, before any rescaling.
    #[inline]
    pub fn bare_rate(&self) -> f64 {
        self.bare_rate
    }

    pub(crate) fn set_rate(&mut self, rate: f64) -> Result<(), ReactionError> {
        validate_rate(rate)?;
        self.rate = rate;
        Ok(())
    }

    /// Administratively disabled, regardless of copy numbers.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// A passivated reaction reports zero propensity and is never scheduled.
    #[inline]
    pub fn is_passivated(&self) -> bool {
        self.disabled || self.depleted_reactants > 0 || self.saturated_products > 0
    }

    pub fn reactant_coefficient(&self, species: SpeciesId) -> Option<u32> {
        find_coefficient(&self.reactants, species)
    }

    pub fn product_coefficient(&self, species: SpeciesId) -> Option<u32> {
        find_coefficient(&self.products, species)
    }

    /// Net change of `species` when this reaction fires once.
    pub fn net_change(&self, species: SpeciesId) -> i64 {
        let produced = self.product_coefficient(species).unwrap_or(0) as i64;
        let consumed = self.reactant_coefficient(species).unwrap_or(0) as i64;
        produced - consumed
    }

    /// Species handles in reactant-then-product order, without duplicates.
    pub fn species(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        let products = self
            .products
            .iter()
            .filter(|p| self.reactant_coefficient(p.species).is_none());
        self.reactants.iter().chain(products).map(|e| e.species)
    }

    /// Computes `rate * prod(n_i ^ m_i)` over the reactants.
    ///
    /// `copy_number` resolves a reactant handle to its current count. A reactant
    /// with fewer copies than its coefficient makes the propensity zero, which is
    /// what keeps a firing from ever driving a copy number negative.
    pub fn propensity_with<F>(&self, copy_number: F) -> f64
    where
        F: Fn(SpeciesId) -> CopyNumber,
    {
        if self.is_passivated() {
            return 0.0;
        }
        let mut a = self.rate;
        for entry in &self.reactants {
            let n = copy_number(entry.species);
            if n < entry.coefficient as CopyNumber {
                return 0.0;
            }
            a *= (n as f64).powi(entry.coefficient as i32);
        }
        a
    }
}

fn validate_rate(rate: f64) -> Result<(), ReactionError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ReactionError::InvalidRate(rate))
    }
}

fn find_coefficient(entries: &[Stoichiometry], species: SpeciesId) -> Option<u32> {
    entries
        .iter()
        .find(|e| e.species == species)
        .map(|e| e.coefficient)
}

fn coalesce(entries: Vec<Stoichiometry>) -> Result<Vec<Stoichiometry>, ReactionError> {
    let mut merged: Vec<Stoichiometry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match merged.iter_mut().find(|e| e.species == entry.species) {
            Some(existing) => {
                existing.coefficient = existing
                    .coefficient
                    .checked_add(entry.coefficient)
                    .ok_or(ReactionError::CoefficientOverflow {
                        species: entry.species,
                    })?;
            }
            None => merged.push(entry),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_species_id(n: u64) -> SpeciesId {
        SpeciesId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_merges_repeated_species_into_coefficients() {
        let a = dummy_species_id(1);
        let b = dummy_species_id(2);
        let reaction = Reaction::new(&[a, b, a], &[b], 2.0).unwrap();

        assert_eq!(
            reaction.reactants(),
            &[Stoichiometry::new(a, 2), Stoichiometry::new(b, 1)]
        );
        assert_eq!(reaction.num_reactants(), 3);
        assert_eq!(reaction.num_products(), 1);
        assert_eq!(reaction.rate(), 2.0);
        assert_eq!(reaction.bare_rate(), 2.0);
    }

    #[test]
    fn invalid_rates_are_rejected() {
        let a = dummy_species_id(1);
        assert_eq!(
            Reaction::new(&[a], &[], -1.0),
            Err(ReactionError::InvalidRate(-1.0))
        );
        assert!(matches!(
            Reaction::new(&[a], &[], f64::NAN),
            Err(ReactionError::InvalidRate(_))
        ));
        assert!(matches!(
            Reaction::new(&[a], &[], f64::INFINITY),
            Err(ReactionError::InvalidRate(_))
        ));
    }

    #[test]
    fn empty_reaction_and_zero_coefficient_are_rejected() {
        assert_eq!(Reaction::new(&[], &[], 1.0), Err(ReactionError::Empty));

        let a = dummy_species_id(1);
        assert_eq!(
            Reaction::from_stoichiometry(vec![Stoichiometry::new(a, 0)], vec![], 1.0),
            Err(ReactionError::ZeroCoefficient { species: a })
        );
    }

    #[test]
    fn overflowing_merged_coefficient_is_rejected() {
        let a = dummy_species_id(1);
        let result = Reaction::from_stoichiometry(
            vec![Stoichiometry::new(a, u32::MAX), Stoichiometry::new(a, 1)],
            vec![],
            1.0,
        );
        assert_eq!(result, Err(ReactionError::CoefficientOverflow { species: a }));
    }

    #[test]
    fn propensity_is_rate_times_product_of_powers() {
        let a = dummy_species_id(1);
        let b = dummy_species_id(2);
        let reaction = Reaction::new(&[a, a, b], &[], 0.5).unwrap();
        let counts = |s: SpeciesId| if s == a { 3 } else { 4 };

        assert_eq!(reaction.propensity_with(counts), 0.5 * 9.0 * 4.0);
    }

    #[test]
    fn propensity_is_zero_when_reactant_below_coefficient() {
        let a = dummy_species_id(1);
        let dimerization = Reaction::new(&[a, a], &[], 1.0).unwrap();
        assert_eq!(dimerization.propensity_with(|_| 1), 0.0);
        assert_eq!(dimerization.propensity_with(|_| 0), 0.0);
        assert_eq!(dimerization.propensity_with(|_| 2), 4.0);
    }

    #[test]
    fn source_reaction_propensity_equals_rate() {
        let a = dummy_species_id(1);
        let source = Reaction::new(&[], &[a], 3.0).unwrap();
        assert_eq!(source.propensity_with(|_| 0), 3.0);
    }

    #[test]
    fn passivated_reaction_reports_zero_propensity() {
        let a = dummy_species_id(1);
        let mut reaction = Reaction::new(&[a], &[], 1.0).unwrap();
        reaction.disabled = true;
        assert!(reaction.is_passivated());
        assert_eq!(reaction.propensity_with(|_| 10), 0.0);

        reaction.disabled = false;
        reaction.saturated_products = 1;
        assert_eq!(reaction.propensity_with(|_| 10), 0.0);
    }

    #[test]
    fn net_change_accounts_for_species_on_both_sides() {
        let a = dummy_species_id(1);
        let b = dummy_species_id(2);
        let autocatalysis = Reaction::new(&[a, b], &[a, a], 1.0).unwrap();

        assert_eq!(autocatalysis.net_change(a), 1);
        assert_eq!(autocatalysis.net_change(b), -1);
        assert_eq!(autocatalysis.species().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn set_rate_keeps_bare_rate() {
        let a = dummy_species_id(1);
        let mut reaction = Reaction::new(&[a], &[], 1.0).unwrap().with_label("decay");
        reaction.set_rate(4.0).unwrap();

        assert_eq!(reaction.rate(), 4.0);
        assert_eq!(reaction.bare_rate(), 1.0);
        assert_eq!(reaction.label(), Some("decay"));
        assert!(reaction.set_rate(-2.0).is_err());
        assert_eq!(reaction.rate(), 4.0);
    }
}
