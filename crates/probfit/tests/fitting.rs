//! End-to-end fitting through the public entry points.

use std::io::Write;
use std::sync::Arc;

use probfit::{
    fit, fit_and_query, fit_declared, fit_from_file, fit_requirements, fit_with_channel,
    load_config, ConfigurationError, Error, Evidence, FitError, FittingConfig, FormulaId,
    InferenceError, InferenceMethod, InferenceOracle, InferenceParams, OracleRegistry, ParamValue,
    PosteriorQuery, TerminationReason, ValidationError, WeightVector,
};
use probfit_test::{scenarios, CountingOracle, EnumerationOracle, SamplingOracle};

fn coupled_oracle() -> CountingOracle<EnumerationOracle> {
    CountingOracle::new(EnumerationOracle::new(scenarios::coupled_model()))
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `P(a) = sigmoid(w_a)`; every other query answers the `answer` parameter.
#[derive(Debug)]
struct ParamAnswer;

impl InferenceOracle for ParamAnswer {
    fn posterior(
        &self,
        request: &PosteriorQuery<'_>,
        weights: &WeightVector,
    ) -> Result<f64, InferenceError> {
        if request.query.as_str() == "a" {
            Ok(sigmoid(weights.get("a").unwrap_or(0.0)))
        } else {
            Ok(request.params.get_f64("answer").unwrap_or(0.0))
        }
    }
}

#[test]
fn empty_requirement_list_is_a_configuration_error() {
    let oracle = coupled_oracle();
    let mut weights = scenarios::coupled_weights();

    let err = fit_requirements(Vec::new(), &mut weights, &oracle, &FittingConfig::default())
        .unwrap_err();

    assert_eq!(
        err,
        FitError::Configuration(ConfigurationError::EmptyConstraintSet)
    );
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn out_of_range_target_is_rejected_before_any_query() {
    let oracle = coupled_oracle();
    let config = FittingConfig::from_toml_str(
        r#"
        [[requirements]]
        query = "a"
        target = 1.5
        "#,
    )
    .unwrap();

    let err = fit_declared(&config, &mut scenarios::coupled_weights(), &oracle).unwrap_err();

    assert!(matches!(
        err,
        FitError::Validation(ValidationError::TargetOutOfRange { .. })
    ));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn batch_and_greedy_both_fit_coupled_constraints() {
    let constraints = scenarios::coupled_constraints();

    for greedy in [false, true] {
        let mut weights = scenarios::coupled_weights();
        let result = fit(
            &constraints,
            &mut weights,
            &coupled_oracle(),
            &FittingConfig::default().with_greedy(greedy),
        )
        .unwrap();

        assert!(result.converged, "greedy = {greedy}");
        assert!(result.steps_taken <= 100);
        assert!(result.last_record().unwrap().aggregate_error < 1e-3);
    }
}

#[test]
fn unsatisfiable_constraints_report_step_limit() {
    let mut weights = scenarios::unsatisfiable_weights();
    let result = fit(
        &scenarios::unsatisfiable_constraints(),
        &mut weights,
        &EnumerationOracle::new(scenarios::unsatisfiable_model()),
        &FittingConfig::default().with_max_threshold(0.05),
    )
    .unwrap();

    assert!(!result.converged);
    assert_eq!(result.termination, TerminationReason::StepLimit);
    assert_eq!(result.trace.len(), 100);
    assert_eq!(result.final_threshold, 0.05);
}

#[test]
fn conditional_requirement_is_fitted() {
    let model = scenarios::coupled_model();
    let requirements = vec![scenarios::conditional(
        "a_and_b",
        Evidence::new().with("A", true),
        0.9,
    )];
    let mut weights = WeightVector::new().with("a_and_b", 0.0);

    let result = fit_requirements(
        requirements,
        &mut weights,
        &EnumerationOracle::new(model),
        &FittingConfig::default(),
    )
    .unwrap();

    // Given A, P(A ∧ B) = sigmoid(w_a_and_b).
    assert!(result.converged);
    assert!((weights.get("a_and_b").unwrap() - 9f64.ln()).abs() < 0.02);
}

#[test]
fn registry_selects_oracle_by_configured_method() {
    let registry = OracleRegistry::new()
        .with(
            InferenceMethod::Exact,
            Arc::new(EnumerationOracle::new(scenarios::single_model())),
        )
        .with(
            InferenceMethod::Gibbs,
            Arc::new(SamplingOracle::new(scenarios::single_model(), 11)),
        );

    let config = FittingConfig::default()
        .with_inference_method(InferenceMethod::Gibbs)
        .with_threshold(0.02)
        .with_inference_params(
            InferenceParams::new().with("samples", ParamValue::Integer(20_000)),
        );
    let mut weights = scenarios::single_weights(0.0);

    let result = fit(
        &scenarios::single_constraints(0.7),
        &mut weights,
        &registry,
        &config,
    )
    .unwrap();

    assert!(result.converged);
    assert!((weights.get("a").unwrap() - (0.7f64 / 0.3).ln()).abs() < 0.2);
}

#[test]
fn unregistered_method_aborts_with_inference_error() {
    let registry = OracleRegistry::new();
    let mut weights = scenarios::single_weights(0.0);

    let result = fit(
        &scenarios::single_constraints(0.7),
        &mut weights,
        &registry,
        &FittingConfig::default().with_inference_method(InferenceMethod::Mcsat),
    )
    .unwrap();

    assert!(!result.converged);
    assert!(matches!(
        result.termination,
        TerminationReason::InferenceFailed { step: 0, .. }
    ));
    assert!(result.trace.is_empty());
}

#[test]
fn channel_streams_records() {
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let mut weights = scenarios::coupled_weights();

    let result = fit_with_channel(
        &scenarios::coupled_constraints(),
        &mut weights,
        &coupled_oracle(),
        &FittingConfig::default(),
        sender,
    )
    .unwrap();

    let mut count = 0;
    while receiver.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, result.trace.len());
}

#[test]
fn config_file_drives_a_complete_fit() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        inference_method = "exact"
        threshold = 0.001
        max_steps = 200
        greedy = true

        [[requirements]]
        query = "a"
        target = 0.7

        [[requirements]]
        query = "a_and_b"
        target = 0.5
        "#
    )
    .unwrap();

    let mut weights = scenarios::coupled_weights();
    let result = fit_from_file(file.path(), &mut weights, &coupled_oracle()).unwrap();

    assert!(result.converged);
    assert!((weights.get("a").unwrap() - 0.29).abs() < 0.05);
}

#[test]
fn invalid_options_in_file_surface_as_fit_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "threshold = -1.0").unwrap();

    let err = fit_from_file(
        file.path(),
        &mut scenarios::coupled_weights(),
        &coupled_oracle(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Fit(FitError::Configuration(_))));

    let err = fit_from_file(
        "/nonexistent/probfit.toml",
        &mut scenarios::coupled_weights(),
        &coupled_oracle(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn missing_config_falls_back_to_defaults() {
    assert_eq!(
        load_config("/nonexistent/probfit.toml"),
        FittingConfig::default()
    );
}

#[test]
fn fitted_weights_answer_follow_up_queries() {
    let mut weights = scenarios::coupled_weights();

    let answered = fit_and_query(
        &scenarios::coupled_constraints(),
        &mut weights,
        &coupled_oracle(),
        &FittingConfig::default(),
        &[FormulaId::new("a"), FormulaId::new("a_and_b")],
        &Evidence::new().with("A", true),
        &InferenceParams::new(),
    )
    .unwrap();

    assert!(answered.fit.converged);
    assert_eq!(answered.posteriors.len(), 2);
    // Given A, a holds surely and P(a_and_b) = sigmoid(w_a_and_b).
    assert!((answered.posterior("a").unwrap() - 1.0).abs() < 1e-12);
    let expected = sigmoid(weights.get("a_and_b").unwrap());
    assert!((answered.posterior("a_and_b").unwrap() - expected).abs() < 1e-12);
}

#[test]
fn query_overrides_take_precedence_over_configured_params() {
    let config = FittingConfig::default().with_inference_params(
        InferenceParams::new()
            .with("answer", ParamValue::Float(0.1))
            .with("samples", ParamValue::Integer(500)),
    );
    let mut weights = scenarios::single_weights(0.0);

    let answered = fit_and_query(
        &scenarios::single_constraints(0.8),
        &mut weights,
        &ParamAnswer,
        &config,
        &[FormulaId::new("q")],
        &Evidence::new(),
        &InferenceParams::new().with("answer", ParamValue::Float(0.6)),
    )
    .unwrap();

    assert!(answered.fit.converged);
    assert_eq!(answered.posterior("q"), Some(0.6));
    assert_eq!(answered.posterior("missing"), None);
}

#[test]
fn invalid_query_answer_is_reported() {
    let mut weights = scenarios::single_weights(0.0);

    let err = fit_and_query(
        &scenarios::single_constraints(0.5),
        &mut weights,
        &ParamAnswer,
        &FittingConfig::default(),
        &[FormulaId::new("q")],
        &Evidence::new(),
        &InferenceParams::new().with("answer", ParamValue::Float(1.5)),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Inference(InferenceError::InvalidProbability { value, .. }) if value == 1.5
    ));
}
