//! Canned fitting problems.
//!
//! - [`coupled`]: atoms A, B with formulas `a` (A) and `a_and_b` (A ∧ B);
//!   `P(a) = 0.7` and `P(a_and_b) = 0.5` interact through the weight of `a`.
//!   Satisfiable, solution near `w_a = 0.29`, `w_a_and_b = 0.91`.
//! - [`unsatisfiable`]: formulas `a` (A) and `not_a` (¬A) with
//!   `P(a) = 0.9` and `P(not_a) = 0.9`.
//! - [`single`]: one independent formula `a`, so `P(a) = sigmoid(w_a)`.
//! - [`shared`]: atoms A, B, E with formulas `a`, `a_and_b` and `e`;
//!   `P(a | E) = 0.8` and `P(a_and_b | E) = 0.4` both drive the weight of
//!   `a`. Since `P(a_and_b | E) = P(a | E) / 2`, both hold at `w_a = ln 4`.

use probfit_core::{ConstraintSet, Evidence, FormulaRef, ProbabilityRequirement, WeightVector};

use crate::model::PropositionalModel;

pub fn coupled_model() -> PropositionalModel {
    PropositionalModel::new(["A", "B"])
        .formula("a", |w| w.get("A"))
        .formula("a_and_b", |w| w.get("A") && w.get("B"))
}

pub fn coupled_constraints() -> ConstraintSet {
    ConstraintSet::new(vec![
        requirement("a", 0.7),
        requirement("a_and_b", 0.5),
    ])
    .unwrap_or_else(|e| panic!("coupled constraints: {e}"))
}

pub fn coupled_weights() -> WeightVector {
    WeightVector::new().with("a", 0.0).with("a_and_b", 0.0)
}

pub fn unsatisfiable_model() -> PropositionalModel {
    PropositionalModel::new(["A"])
        .formula("a", |w| w.get("A"))
        .formula("not_a", |w| !w.get("A"))
}

pub fn unsatisfiable_constraints() -> ConstraintSet {
    ConstraintSet::new(vec![requirement("a", 0.9), requirement("not_a", 0.9)])
        .unwrap_or_else(|e| panic!("unsatisfiable constraints: {e}"))
}

pub fn unsatisfiable_weights() -> WeightVector {
    WeightVector::new().with("a", 0.0).with("not_a", 0.0)
}

pub fn single_model() -> PropositionalModel {
    PropositionalModel::new(["A"]).formula("a", |w| w.get("A"))
}

pub fn single_constraints(target: f64) -> ConstraintSet {
    ConstraintSet::new(vec![requirement("a", target)])
        .unwrap_or_else(|e| panic!("single constraint: {e}"))
}

pub fn single_weights(weight: f64) -> WeightVector {
    WeightVector::new().with("a", weight)
}

pub fn shared_model() -> PropositionalModel {
    PropositionalModel::new(["A", "B", "E"])
        .formula("a", |w| w.get("A"))
        .formula("a_and_b", |w| w.get("A") && w.get("B"))
        .formula("e", |w| w.get("E"))
}

pub fn shared_evidence() -> Evidence {
    Evidence::new().with("E", true)
}

pub fn shared_constraints() -> ConstraintSet {
    let requirements = [("a", 0.8), ("a_and_b", 0.4)]
        .into_iter()
        .map(|(query, target)| {
            ProbabilityRequirement::new(
                FormulaRef::driving(query, ["a"]),
                shared_evidence(),
                target,
            )
            .unwrap_or_else(|e| panic!("requirement {query}: {e}"))
        })
        .collect();
    ConstraintSet::new(requirements).unwrap_or_else(|e| panic!("shared constraints: {e}"))
}

pub fn shared_weights() -> WeightVector {
    WeightVector::new()
        .with("a", 0.0)
        .with("a_and_b", 0.0)
        .with("e", 0.0)
}

/// Conditional requirement `P(query | evidence) = target`.
pub fn conditional(query: &str, evidence: Evidence, target: f64) -> ProbabilityRequirement {
    ProbabilityRequirement::new(query, evidence, target)
        .unwrap_or_else(|e| panic!("requirement {query}: {e}"))
}

/// Unconditional requirement `P(query) = target`.
pub fn requirement(query: &str, target: f64) -> ProbabilityRequirement {
    ProbabilityRequirement::unconditional(query, target)
        .unwrap_or_else(|e| panic!("requirement {query}: {e}"))
}
