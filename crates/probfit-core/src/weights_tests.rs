//! Tests for weights, evidence and inference parameters.

use crate::evidence::Evidence;
use crate::oracle::{InferenceMethod, InferenceParams, ParamValue};
use crate::weights::WeightVector;

#[test]
fn test_add_to_unknown_formula_is_noop() {
    let mut weights = WeightVector::new().with("a", 1.0);
    assert_eq!(weights.add("b", 2.0), None);
    assert_eq!(weights, WeightVector::new().with("a", 1.0));
}

#[test]
fn test_max_abs_difference() {
    let a = WeightVector::new().with("x", 1.0).with("y", -2.0);
    let b = WeightVector::new().with("x", 1.5).with("y", -1.0);
    assert!((a.max_abs_difference(&b) - 1.0).abs() < f64::EPSILON);
    assert_eq!(a.max_abs_difference(&a), 0.0);

    let c = WeightVector::new().with("x", 1.0).with("z", -2.0);
    assert!(a.max_abs_difference(&c).is_infinite());
}

#[test]
fn test_weights_iterate_in_formula_order() {
    let weights: WeightVector = [("b", 2.0), ("a", 1.0)].into_iter().collect();
    let ids: Vec<&str> = weights.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_evidence_overwrites_atom() {
    let mut evidence = Evidence::new().with("a", true);
    assert_eq!(evidence.set("a", false), Some(true));
    assert_eq!(evidence.get("a"), Some(false));
    assert_eq!(evidence.len(), 1);
}

#[test]
fn test_params_merge_prefers_overlay() {
    let mut base = InferenceParams::new()
        .with("samples", ParamValue::Integer(100))
        .with("verbose", ParamValue::Bool(false));
    let overlay = InferenceParams::new().with("samples", ParamValue::Integer(500));
    base.merge(&overlay);

    assert_eq!(base.get_u64("samples"), Some(500));
    assert_eq!(base.get_bool("verbose"), Some(false));
    assert_eq!(base.len(), 2);
}

#[test]
fn test_params_typed_getters() {
    let params = InferenceParams::new()
        .with("negative", ParamValue::Integer(-3))
        .with("name", ParamValue::Text("mcsat".to_string()));
    assert_eq!(params.get_u64("negative"), None);
    assert_eq!(params.get_f64("negative"), Some(-3.0));
    assert_eq!(params.get_str("name"), Some("mcsat"));
    assert_eq!(params.get_str("negative"), None);
}

#[test]
fn test_method_display() {
    assert_eq!(InferenceMethod::default().to_string(), "exact");
    assert_eq!(InferenceMethod::Mcsat.to_string(), "mcsat");
    assert_eq!(
        InferenceMethod::Custom("lifted_bp".to_string()).to_string(),
        "lifted_bp"
    );
}
