//! Tests for requirements and constraint sets.

use super::*;
use crate::error::{ConfigurationError, FitError, ValidationError};
use crate::evidence::Evidence;
use crate::formula::{FormulaId, FormulaRef};
use crate::weights::WeightVector;

fn req(query: &str, target: f64) -> ProbabilityRequirement {
    ProbabilityRequirement::unconditional(query, target).unwrap()
}

#[test]
fn test_requirement_rejects_out_of_range_target() {
    for target in [1.5, -0.1, f64::NAN, f64::INFINITY] {
        let err = ProbabilityRequirement::unconditional("a", target).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TargetOutOfRange {
                requirement: None,
                ..
            }
        ));
    }
}

#[test]
fn test_requirement_accepts_boundary_targets() {
    assert_eq!(req("a", 0.0).target(), 0.0);
    assert_eq!(req("a", 1.0).target(), 1.0);
}

#[test]
fn test_requirement_display() {
    let conditional = ProbabilityRequirement::new(
        "cancer",
        Evidence::new().with("smokes", true),
        0.25,
    )
    .unwrap();
    assert_eq!(conditional.to_string(), "P(cancer | smokes=true) = 0.25");
    assert_eq!(req("a", 0.5).to_string(), "P(a) = 0.5");
}

#[test]
fn test_empty_set_is_configuration_error() {
    let err = ConstraintSet::new(Vec::new()).unwrap_err();
    assert_eq!(
        err,
        FitError::Configuration(ConfigurationError::EmptyConstraintSet)
    );
}

#[test]
fn test_iteration_order_is_insertion_order() {
    let set = ConstraintSet::new(vec![req("c", 0.1), req("a", 0.2), req("b", 0.3)]).unwrap();
    let order: Vec<_> = set
        .iter()
        .map(|(id, r)| (id.index(), r.query().as_str().to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            (0, "c".to_string()),
            (1, "a".to_string()),
            (2, "b".to_string())
        ]
    );
    assert_eq!(set[RequirementId(1)].target(), 0.2);
    assert_eq!(set.len(), 3);
    assert!(!set.is_empty());
}

#[test]
fn test_formula_index_scopes_shared_formulas() {
    let set = ConstraintSet::new(vec![
        req("a", 0.7),
        ProbabilityRequirement::unconditional(FormulaRef::driving("a_and_b", ["a", "b"]), 0.5)
            .unwrap(),
        req("b", 0.4),
    ])
    .unwrap();

    assert_eq!(set.driving("a"), &[RequirementId(0), RequirementId(1)]);
    assert_eq!(set.driving("b"), &[RequirementId(1), RequirementId(2)]);
    assert!(set.driving("a_and_b").is_empty());
    assert!(set.driving("unknown").is_empty());

    let driven: Vec<&FormulaId> = set.driven_formulas().collect();
    assert_eq!(driven, vec![&FormulaId::from("a"), &FormulaId::from("b")]);
}

#[test]
fn test_validate_weights_reports_missing_formula() {
    let set = ConstraintSet::new(vec![
        req("a", 0.7),
        ProbabilityRequirement::unconditional(FormulaRef::driving("a_and_b", ["b"]), 0.5)
            .unwrap(),
    ])
    .unwrap();

    let weights = WeightVector::new().with("a", 0.0).with("b", 0.0);
    let err = set.validate_weights(&weights).unwrap_err();
    assert_eq!(
        err,
        ValidationError::MissingWeight {
            formula: FormulaId::from("a_and_b"),
            requirement: RequirementId(1),
        }
    );

    let complete = weights.with("a_and_b", 0.0);
    assert!(set.validate_weights(&complete).is_ok());
}

#[test]
fn test_validate_weights_rejects_non_finite() {
    let set = ConstraintSet::new(vec![req("a", 0.7)]).unwrap();
    let weights = WeightVector::new().with("a", f64::NAN);
    assert!(matches!(
        set.validate_weights(&weights),
        Err(ValidationError::NonFiniteWeight { .. })
    ));
}
