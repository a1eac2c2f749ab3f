//! Outcome shaping and report formatting.
//!
//! [`OutcomeFormatter`] turns evaluator numbers into outcomes at the
//! requested verbosity. The [`ReportFormatter`] implementations render a
//! whole [`ValidationReport`] as JSON or as plain text for a terminal.
//!
//! # Examples
//!
//! ```rust
//! use term_expect::core::{ValidationReport, ValidationStatistics};
//! use term_expect::formatters::{HumanFormatter, ReportFormatter};
//!
//! let report = ValidationReport {
//!     success: true,
//!     results: vec![],
//!     statistics: ValidationStatistics::default(),
//!     meta: serde_json::json!({"data_asset_name": "orders"}),
//! };
//! let text = HumanFormatter::new().format(&report).unwrap();
//! assert!(text.contains("Validation PASSED"));
//! ```

mod outcome;

pub use outcome::{ratio, MapTally, OutcomeFormatter};

use crate::core::{EvaluationOutcome, ResultObject, ValidationReport};
use crate::prelude::*;
use std::fmt::Write;

/// Configuration options for formatting validation reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include run statistics
    pub include_statistics: bool,
    /// Include per-expectation results
    pub include_results: bool,
    /// Include observed values and unexpected counts in result lines
    pub include_observed: bool,
    /// Maximum number of results to display (-1 for all)
    pub max_results: i32,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_statistics: true,
            include_results: true,
            include_observed: true,
            max_results: -1, // Show all results by default
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_statistics: true,
            include_results: false,
            include_observed: false,
            max_results: 0,
            use_colors: false,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_statistics: true,
            include_results: true,
            include_observed: true,
            max_results: 50, // Limit output in CI
            use_colors: false,
        }
    }

    /// Sets whether to include run statistics.
    pub fn with_statistics(mut self, include: bool) -> Self {
        self.include_statistics = include;
        self
    }

    /// Sets whether to include per-expectation results.
    pub fn with_results(mut self, include: bool) -> Self {
        self.include_results = include;
        self
    }

    /// Sets the maximum number of results to display.
    pub fn with_max_results(mut self, max: i32) -> Self {
        self.max_results = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible<'a>(&self, results: &'a [EvaluationOutcome]) -> &'a [EvaluationOutcome] {
        if !self.include_results {
            &[]
        } else if self.max_results < 0 {
            results
        } else {
            &results[..std::cmp::min(self.max_results as usize, results.len())]
        }
    }
}

/// Trait for rendering validation reports.
///
/// # Examples
///
/// ```rust
/// use term_expect::core::ValidationReport;
/// use term_expect::formatters::ReportFormatter;
///
/// struct OneLine;
///
/// impl ReportFormatter for OneLine {
///     fn format(&self, report: &ValidationReport) -> term_expect::prelude::Result<String> {
///         Ok(format!("success={}", report.success))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats a report into a string.
    fn format(&self, report: &ValidationReport) -> Result<String>;

    /// Formats a report with custom configuration.
    fn format_with_config(
        &self,
        report: &ValidationReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

/// Renders reports as JSON for programmatic consumption.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ValidationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut filtered = report.clone();
        filtered.results = config.visible(&report.results).to_vec();

        let mut value = serde_json::to_value(&filtered)?;
        if !config.include_statistics {
            if let Some(object) = value.as_object_mut() {
                object.remove("statistics");
            }
        }

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| ExpectError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

/// Renders reports as plain text for terminals and logs.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(
        &self,
        output: &mut String,
        report: &ValidationReport,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        writeln!(output)?;
        match (report.success, config.use_colors) {
            (true, true) => writeln!(output, "✅ \x1b[32mValidation PASSED\x1b[0m")?,
            (true, false) => writeln!(output, "✅ Validation PASSED")?,
            (false, true) => writeln!(output, "❌ \x1b[31mValidation FAILED\x1b[0m")?,
            (false, false) => writeln!(output, "❌ Validation FAILED")?,
        }

        if let Some(name) = report.meta.get("data_asset_name").and_then(|v| v.as_str()) {
            writeln!(output)?;
            writeln!(output, "Data asset: {name}")?;
        }

        if config.include_statistics {
            let stats = &report.statistics;
            writeln!(output)?;
            writeln!(output, "📊 Summary Statistics:")?;
            writeln!(output, "   Evaluated: {}", stats.evaluated_expectations)?;
            if config.use_colors {
                writeln!(
                    output,
                    "   ✅ Passed: \x1b[32m{}\x1b[0m",
                    stats.successful_expectations
                )?;
                writeln!(
                    output,
                    "   ❌ Failed: \x1b[31m{}\x1b[0m",
                    stats.unsuccessful_expectations
                )?;
            } else {
                writeln!(output, "   ✅ Passed: {}", stats.successful_expectations)?;
                writeln!(output, "   ❌ Failed: {}", stats.unsuccessful_expectations)?;
            }
            if let Some(percent) = stats.success_percent {
                writeln!(output, "   Success Rate: {percent:.1}%")?;
            }
        }

        let visible = config.visible(&report.results);
        if !visible.is_empty() {
            writeln!(output)?;
            writeln!(output, "🔍 Results:")?;
            for outcome in visible {
                render_outcome(output, outcome, config)?;
            }
        }

        if config.include_results && report.results.len() > visible.len() {
            writeln!(output)?;
            writeln!(
                output,
                "   ... and {} more results",
                report.results.len() - visible.len()
            )?;
        }

        writeln!(output)
    }
}

fn render_outcome(
    output: &mut String,
    outcome: &EvaluationOutcome,
    config: &FormatterConfig,
) -> std::fmt::Result {
    let symbol = if outcome.success { "✅" } else { "❌" };
    let name = outcome
        .expectation_config
        .as_ref()
        .map(|c| match c.column() {
            Some(column) => format!("{} ({column})", c.expectation_type),
            None => c.expectation_type.clone(),
        })
        .unwrap_or_else(|| "expectation".to_string());

    writeln!(output, "   {symbol} {name}")?;

    if config.include_observed {
        match &outcome.result_obj {
            Some(ResultObject::Map(result)) => {
                write!(output, "      Unexpected: {}", result.unexpected_count)?;
                if let Some(percent) = result.unexpected_percent {
                    write!(output, " ({:.1}%)", percent * 100.0)?;
                }
                writeln!(output)?;
                if !result.partial_unexpected_list.is_empty() {
                    let sample: Vec<String> = result
                        .partial_unexpected_list
                        .iter()
                        .map(|v| v.to_string())
                        .collect();
                    writeln!(
                        output,
                        "      Sample: {}",
                        crate::logging::truncate_field(&sample.join(", "), 120)
                    )?;
                }
            }
            Some(ResultObject::Aggregate(result)) => {
                writeln!(output, "      Observed: {}", result.observed_value)?;
            }
            Some(ResultObject::Table(result)) => {
                writeln!(output, "      Observed: {}", result.observed_value)?;
            }
            None => {}
        }
    }

    if let Some(info) = &outcome.exception_info {
        if let Some(message) = &info.exception_message {
            writeln!(output, "      Exception: {message}")?;
        }
    }
    Ok(())
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ValidationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, report, config)
            .map_err(|e| ExpectError::Internal(format!("Failed to render report: {e}")))?;
        Ok(output)
    }
}
