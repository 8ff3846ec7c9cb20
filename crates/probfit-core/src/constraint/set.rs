//! Ordered, validated collection of requirements.

use std::collections::BTreeMap;
use std::ops::Index;

use smallvec::SmallVec;

use super::requirement::check_target;
use super::{ProbabilityRequirement, RequirementId};
use crate::error::{ConfigurationError, FitError, ValidationError};
use crate::formula::FormulaId;
use crate::weights::WeightVector;

/// Non-empty, ordered set of probability requirements.
///
/// Iteration order is insertion order and never changes; greedy fitting
/// relies on it for reproducibility. The set also indexes which
/// requirements drive each formula.
///
/// # Example
///
/// ```
/// use probfit_core::{ConstraintSet, FitError, ProbabilityRequirement, RequirementId};
///
/// let set = ConstraintSet::new(vec![
///     ProbabilityRequirement::unconditional("a", 0.7).unwrap(),
///     ProbabilityRequirement::unconditional("b", 0.2).unwrap(),
/// ]).unwrap();
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.driving("b"), &[RequirementId(1)]);
///
/// assert!(matches!(ConstraintSet::new(vec![]), Err(FitError::Configuration(_))));
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    requirements: Vec<ProbabilityRequirement>,
    by_formula: BTreeMap<FormulaId, SmallVec<[RequirementId; 4]>>,
}

impl ConstraintSet {
    /// Builds the set.
    ///
    /// # Errors
    ///
    /// `FitError::Configuration` if `requirements` is empty,
    /// `FitError::Validation` if any target lies outside `[0, 1]`.
    pub fn new(requirements: Vec<ProbabilityRequirement>) -> Result<Self, FitError> {
        if requirements.is_empty() {
            return Err(ConfigurationError::EmptyConstraintSet.into());
        }

        let mut by_formula: BTreeMap<FormulaId, SmallVec<[RequirementId; 4]>> = BTreeMap::new();
        for (index, requirement) in requirements.iter().enumerate() {
            let id = RequirementId(index);
            check_target(requirement.target(), Some(id))?;
            for formula in requirement.driven() {
                by_formula.entry(formula.clone()).or_default().push(id);
            }
        }

        Ok(Self {
            requirements,
            by_formula,
        })
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn get(&self, id: RequirementId) -> Option<&ProbabilityRequirement> {
        self.requirements.get(id.0)
    }

    /// Requirements in their fixed iteration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (RequirementId, &ProbabilityRequirement)> {
        self.requirements
            .iter()
            .enumerate()
            .map(|(index, req)| (RequirementId(index), req))
    }

    pub fn requirements(&self) -> &[ProbabilityRequirement] {
        &self.requirements
    }

    /// Requirements whose corrections adjust `formula`.
    pub fn driving(&self, formula: &str) -> &[RequirementId] {
        self.by_formula
            .get(formula)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Formulas whose weights this set adjusts.
    pub fn driven_formulas(&self) -> impl Iterator<Item = &FormulaId> {
        self.by_formula.keys()
    }

    /// Checks that `weights` covers every referenced formula with a finite weight.
    pub fn validate_weights(&self, weights: &WeightVector) -> Result<(), ValidationError> {
        for (id, requirement) in self.iter() {
            for formula in requirement.formula().referenced() {
                match weights.get(formula.as_str()) {
                    None => {
                        return Err(ValidationError::MissingWeight {
                            formula: formula.clone(),
                            requirement: id,
                        })
                    }
                    Some(weight) if !weight.is_finite() => {
                        return Err(ValidationError::NonFiniteWeight {
                            formula: formula.clone(),
                            weight,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

impl Index<RequirementId> for ConstraintSet {
    type Output = ProbabilityRequirement;

    fn index(&self, id: RequirementId) -> &Self::Output {
        &self.requirements[id.0]
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a ProbabilityRequirement;
    type IntoIter = std::slice::Iter<'a, ProbabilityRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}
