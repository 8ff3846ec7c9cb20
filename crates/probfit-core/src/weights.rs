//! Weight vectors of log-linear models.

use std::collections::BTreeMap;

use crate::formula::FormulaId;

/// One real-valued weight per formula, ordered by formula id.
///
/// The fitter borrows the vector mutably for the whole fitting run, so no
/// two runs can adjust the same weights at once.
///
/// # Example
///
/// ```
/// use probfit_core::WeightVector;
///
/// let mut weights = WeightVector::new().with("a", 0.5).with("b", -1.0);
/// weights.add("a", 0.25);
///
/// assert_eq!(weights.get("a"), Some(0.75));
/// assert_eq!(weights.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeightVector {
    weights: BTreeMap<FormulaId, f64>,
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, formula: impl Into<FormulaId>, weight: f64) -> Self {
        self.insert(formula, weight);
        self
    }

    /// Sets a weight, returning the previous one.
    pub fn insert(&mut self, formula: impl Into<FormulaId>, weight: f64) -> Option<f64> {
        self.weights.insert(formula.into(), weight)
    }

    pub fn get(&self, formula: &str) -> Option<f64> {
        self.weights.get(formula).copied()
    }

    pub fn contains(&self, formula: &str) -> bool {
        self.weights.contains_key(formula)
    }

    /// Adds `delta` to an existing weight and returns the new value.
    ///
    /// Returns `None` and leaves the vector untouched if the formula has no weight.
    pub fn add(&mut self, formula: &str, delta: f64) -> Option<f64> {
        let weight = self.weights.get_mut(formula)?;
        *weight += delta;
        Some(*weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FormulaId, f64)> {
        self.weights.iter().map(|(id, w)| (id, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Largest absolute per-formula difference to `other`.
    ///
    /// Formulas present in only one of the vectors count as infinitely far apart.
    pub fn max_abs_difference(&self, other: &WeightVector) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.weights
            .iter()
            .map(|(id, w)| match other.weights.get(id) {
                Some(o) => (w - o).abs(),
                None => f64::INFINITY,
            })
            .fold(0.0, f64::max)
    }
}

impl<F: Into<FormulaId>> FromIterator<(F, f64)> for WeightVector {
    fn from_iter<I: IntoIterator<Item = (F, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().map(|(id, w)| (id.into(), w)).collect(),
        }
    }
}
