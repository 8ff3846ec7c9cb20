//! Small propositional log-linear models.
//!
//! A model has a handful of boolean atoms and named formulas over them. The
//! weight of a world is `exp(sum of the weights of the formulas it
//! satisfies)`; formulas without a weight contribute nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use probfit_core::{Evidence, FormulaId, InferenceError, WeightVector};

/// Truth assignment to every atom of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct World<'m> {
    atoms: &'m [String],
    bits: u32,
}

impl World<'_> {
    /// Truth value of `atom`; unknown atoms are false.
    pub fn get(&self, atom: &str) -> bool {
        self.atoms
            .iter()
            .position(|a| a == atom)
            .is_some_and(|i| self.bits & (1 << i) != 0)
    }
}

type Predicate = Arc<dyn Fn(&World<'_>) -> bool + Send + Sync>;

/// Propositional model with enumerable worlds.
///
/// # Example
///
/// ```
/// use probfit_core::{Evidence, FormulaId, WeightVector};
/// use probfit_test::PropositionalModel;
///
/// let model = PropositionalModel::new(["a"]).formula("a", |w| w.get("a"));
/// let p = model
///     .probability(&FormulaId::from("a"), &Evidence::new(), &WeightVector::new().with("a", 0.0))
///     .unwrap();
/// assert!((p - 0.5).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct PropositionalModel {
    atoms: Vec<String>,
    formulas: BTreeMap<FormulaId, Predicate>,
}

impl PropositionalModel {
    pub fn new<I, S>(atoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let atoms: Vec<String> = atoms.into_iter().map(Into::into).collect();
        assert!(atoms.len() < 20, "too many atoms to enumerate");
        Self {
            atoms,
            formulas: BTreeMap::new(),
        }
    }

    /// Adds a named formula.
    pub fn formula(
        mut self,
        name: impl Into<FormulaId>,
        predicate: impl Fn(&World<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.formulas.insert(name.into(), Arc::new(predicate));
        self
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn formula_ids(&self) -> impl Iterator<Item = &FormulaId> {
        self.formulas.keys()
    }

    pub fn world_count(&self) -> usize {
        1 << self.atoms.len()
    }

    /// All worlds, in a fixed order.
    pub fn worlds(&self) -> impl Iterator<Item = World<'_>> {
        (0..self.world_count() as u32).map(move |bits| World {
            atoms: &self.atoms,
            bits,
        })
    }

    pub fn holds(&self, formula: &FormulaId, world: &World<'_>) -> Result<bool, InferenceError> {
        match self.formulas.get(formula) {
            Some(predicate) => Ok(predicate(world)),
            None => Err(InferenceError::InvalidQuery {
                query: formula.clone(),
                reason: "unknown formula".to_string(),
            }),
        }
    }

    pub fn check_evidence(&self, evidence: &Evidence) -> Result<(), InferenceError> {
        match evidence
            .iter()
            .find(|(atom, _)| !self.atoms.iter().any(|a| a.as_str() == *atom))
        {
            Some((atom, _)) => Err(InferenceError::InvalidEvidence {
                reason: format!("unknown atom '{atom}'"),
            }),
            None => Ok(()),
        }
    }

    pub fn consistent(&self, world: &World<'_>, evidence: &Evidence) -> bool {
        evidence.iter().all(|(atom, value)| world.get(atom) == value)
    }

    /// Unnormalized log-weight of `world`.
    pub fn log_weight(&self, world: &World<'_>, weights: &WeightVector) -> f64 {
        self.formulas
            .iter()
            .filter(|(_, predicate)| predicate(world))
            .map(|(id, _)| weights.get(id.as_str()).unwrap_or(0.0))
            .sum()
    }

    /// Normalized probabilities of all worlds, in [`worlds`](Self::worlds) order.
    pub fn distribution(&self, weights: &WeightVector) -> Vec<f64> {
        let logs: Vec<f64> = self
            .worlds()
            .map(|world| self.log_weight(&world, weights))
            .collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let unnormalized: Vec<f64> = logs.iter().map(|l| (l - max).exp()).collect();
        let z: f64 = unnormalized.iter().sum();
        unnormalized.into_iter().map(|u| u / z).collect()
    }

    /// Exact `P(query | evidence)` by enumeration.
    pub fn probability(
        &self,
        query: &FormulaId,
        evidence: &Evidence,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        self.check_evidence(evidence)?;
        let distribution = self.distribution(weights);

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (world, p) in self.worlds().zip(distribution) {
            if !self.consistent(&world, evidence) {
                continue;
            }
            denominator += p;
            if self.holds(query, &world)? {
                numerator += p;
            }
        }

        if denominator > 0.0 {
            Ok(numerator / denominator)
        } else {
            Err(InferenceError::InvalidEvidence {
                reason: format!("evidence '{evidence}' has zero probability"),
            })
        }
    }
}

impl fmt::Debug for PropositionalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropositionalModel")
            .field("atoms", &self.atoms)
            .field("formulas", &self.formulas.keys().collect::<Vec<_>>())
            .finish()
    }
}
