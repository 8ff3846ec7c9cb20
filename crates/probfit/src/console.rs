//! Colorful console output for fitting runs.
//!
//! Provides a `tracing` layer that formats the fitter's lifecycle events.
//!
//! ## Log Levels
//!
//! - **INFO**: Run start and end, threshold relaxations
//! - **DEBUG**: One line per step
//! - **TRACE**: Individual requirement corrections (not formatted here)

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Target prefix of the events this layer formats.
const FITTER_TARGET: &str = "probfit_fitter";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. The
/// filter defaults to `probfit_fitter=info` and honors `RUST_LOG`.
pub fn init() {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(env_filter(None))
            .with(FitConsoleLayer)
            .try_init();
    });
}

/// Builds the filter from `directives`, or from `RUST_LOG` when `None`.
/// `probfit_fitter=info` applies only if no directive is given.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(default_directive());
    match directives {
        Some(directives) => builder.parse_lossy(directives),
        None => builder.from_env_lossy(),
    }
}

fn default_directive() -> tracing_subscriber::filter::Directive {
    match "probfit_fitter=info".parse() {
        Ok(directive) => directive,
        Err(_) => LevelFilter::INFO.into(),
    }
}

/// A tracing layer that formats fitter events with colors.
pub struct FitConsoleLayer;

impl<S: Subscriber> Layer<S> for FitConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with(FITTER_TARGET) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_fit_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    mode: Option<String>,
    method: Option<String>,
    requirements: Option<u64>,
    max_steps: Option<u64>,
    steps: Option<u64>,
    step: Option<u64>,
    applied: Option<u64>,
    oracle_calls: Option<u64>,
    duration_ms: Option<u64>,
    threshold: Option<f64>,
    final_threshold: Option<f64>,
    aggregate_error: Option<f64>,
    from: Option<f64>,
    to: Option<f64>,
    converged: Option<bool>,
    accepted: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value).trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "mode" => self.mode = Some(s),
            "method" => self.method = Some(s),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "mode" => self.mode = Some(value.to_string()),
            "method" => self.method = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "requirements" => self.requirements = Some(value),
            "max_steps" => self.max_steps = Some(value),
            "steps" => self.steps = Some(value),
            "step" => self.step = Some(value),
            "applied" => self.applied = Some(value),
            "oracle_calls" => self.oracle_calls = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "threshold" => self.threshold = Some(value),
            "final_threshold" => self.final_threshold = Some(value),
            "aggregate_error" => self.aggregate_error = Some(value),
            "from" => self.from = Some(value),
            "to" => self.to = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "converged" => self.converged = Some(value),
            "accepted" => self.accepted = Some(value),
            _ => {}
        }
    }
}

fn format_fit_event(v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("fit_start") => format_fit_start(v),
        Some("step") => format_step(v),
        Some("threshold_relaxed") => format_relaxed(v),
        Some("fit_end") => format_fit_end(v),
        _ => String::new(),
    }
}

fn format_fit_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {} requirements, {} mode, method ({}), threshold ({}), max steps ({})",
        "INFO".bright_green(),
        "[Fitter]".bright_cyan(),
        "Fitting started:".white().bold(),
        count(v.requirements).bright_yellow(),
        v.mode.as_deref().unwrap_or("batch").yellow(),
        v.method.as_deref().unwrap_or("exact"),
        error(v.threshold).bright_magenta(),
        count(v.max_steps).white()
    )
}

fn format_step(v: &EventVisitor) -> String {
    let marker = if v.accepted == Some(true) {
        "->".bright_blue().to_string()
    } else {
        "  ".to_string()
    };
    format!(
        "    {} Step {:>7} | error {} | threshold {} | {} corrections",
        marker,
        count(v.step).white(),
        error(v.aggregate_error).bright_yellow(),
        error(v.threshold),
        count(v.applied)
    )
}

fn format_relaxed(v: &EventVisitor) -> String {
    format!(
        "{} {} Threshold relaxed at step {}: {} -> {}",
        "INFO".bright_green(),
        "[Fitter]".bright_cyan(),
        count(v.step).white(),
        error(v.from).yellow(),
        error(v.to).bright_yellow()
    )
}

fn format_fit_end(v: &EventVisitor) -> String {
    let status = if v.converged == Some(true) {
        "CONVERGED".bright_green().bold().to_string()
    } else {
        "NOT CONVERGED".bright_red().bold().to_string()
    };
    format!(
        "{} {} Fitting ended: {} after {} steps, error ({}), threshold ({}), oracle calls ({}), time spent ({})",
        "INFO".bright_green(),
        "[Fitter]".bright_cyan(),
        status,
        count(v.steps).white(),
        error(v.aggregate_error).bright_magenta(),
        error(v.final_threshold),
        count(v.oracle_calls).white(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow()
    )
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn error(value: Option<f64>) -> String {
    match value {
        Some(x) => format!("{:.3e}", x),
        None => "N/A".to_string(),
    }
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_event_is_silent() {
        let visitor = EventVisitor {
            event: Some("other".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_fit_event(&visitor).is_empty());
    }

    #[test]
    fn test_fit_end_reports_status() {
        let visitor = EventVisitor {
            event: Some("fit_end".to_string()),
            converged: Some(false),
            steps: Some(1200),
            ..EventVisitor::default()
        };
        let line = format_fit_event(&visitor);
        assert!(line.contains("NOT CONVERGED"));
        assert!(line.contains("1,200"));
    }

    #[test]
    fn test_filter_defaults_to_fitter_info() {
        let filter = env_filter(Some("")).to_string();
        assert!(filter.contains("probfit_fitter=info"), "{filter}");
    }

    #[test]
    fn test_filter_honors_explicit_directives() {
        let filter = env_filter(Some("probfit_fitter=debug")).to_string();
        assert!(filter.contains("probfit_fitter=debug"), "{filter}");
        assert!(!filter.contains("info"), "{filter}");
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
