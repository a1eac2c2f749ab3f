//! The dataset handle through which expectations are invoked.

use super::{
    DatasetConfig, EvaluationOutcome, ExpectationConfig, ExpectationParams, ExpectationSuite,
    InvocationOptions, ResultFormat, SchemaSnapshot, ValidateOptions, ValidationReport,
    ValidationStatistics,
};
use crate::backend::BackendAdapter;
use crate::evaluation::{evaluate_aggregate, evaluate_map, evaluate_table};
use crate::expectations::{ExpectationDefinition, ExpectationKind, ExpectationRegistry};
use crate::prelude::*;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, instrument, warn};

/// Settings that take precedence over both the kwargs and the dataset defaults.
#[derive(Debug, Clone, Default)]
struct Overrides {
    result_format: Option<ResultFormat>,
    catch_exceptions: Option<bool>,
    include_config: Option<bool>,
}

/// A backend bound to an expectation registry and dataset defaults.
///
/// Every successful invocation is recorded in the dataset's
/// [`ExpectationSuite`] (unless `capture_configs` is off), so a session of
/// interactive checks can be saved and replayed with [`Dataset::validate`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use datafusion::prelude::SessionContext;
/// use serde_json::json;
/// use term_expect::backend::SqlBackend;
/// use term_expect::core::{Dataset, DatasetConfig};
///
/// # async fn example(ctx: SessionContext) -> term_expect::prelude::Result<()> {
/// let backend = SqlBackend::connect(ctx, "orders").await?;
/// let dataset = Dataset::new(Arc::new(backend), DatasetConfig::default());
///
/// let outcome = dataset
///     .expect(
///         "expect_column_values_to_be_between",
///         json!({"column": "amount", "min_value": 0, "mostly": 0.99}),
///     )
///     .await?;
/// println!("amount in range: {}", outcome.success);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dataset {
    backend: Arc<dyn BackendAdapter>,
    registry: Arc<ExpectationRegistry>,
    config: DatasetConfig,
    suite: Mutex<ExpectationSuite>,
}

impl Dataset {
    /// Creates a dataset over a backend with the built-in expectations.
    pub fn new(backend: Arc<dyn BackendAdapter>, config: DatasetConfig) -> Self {
        let suite = ExpectationSuite::new(backend.table_name());
        Self {
            backend,
            registry: Arc::new(ExpectationRegistry::builtin()),
            config,
            suite: Mutex::new(suite),
        }
    }

    /// Replaces the expectation registry.
    pub fn with_registry(mut self, registry: Arc<ExpectationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The schema captured when the backend was constructed.
    pub fn schema(&self) -> &SchemaSnapshot {
        self.backend.schema()
    }

    pub fn backend(&self) -> &Arc<dyn BackendAdapter> {
        &self.backend
    }

    pub fn registry(&self) -> &ExpectationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Returns a copy of the configs captured so far.
    pub fn expectation_suite(&self) -> ExpectationSuite {
        self.lock_suite().clone()
    }

    /// Removes captured configs of a type, optionally restricted to a column.
    pub fn discard_expectation(&self, expectation_type: &str, column: Option<&str>) -> usize {
        self.lock_suite()
            .remove_expectation(expectation_type, column)
    }

    fn lock_suite(&self) -> MutexGuard<'_, ExpectationSuite> {
        self.suite.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invokes an expectation by name.
    ///
    /// `kwargs` must be a JSON object (or `null` for no arguments). Besides
    /// the expectation's own parameters it may carry `result_format`,
    /// `include_config`, `catch_exceptions` and `meta`.
    ///
    /// # Errors
    ///
    /// Unknown expectations, bad parameters and unknown columns fail before
    /// any query is issued. Backend failures are returned as errors unless
    /// catch-exceptions mode is on, in which case they become a failed
    /// outcome with `exception_info`.
    pub async fn expect(&self, expectation_type: &str, kwargs: Value) -> Result<EvaluationOutcome> {
        let kwargs = match kwargs {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ExpectError::configuration(format!(
                    "{expectation_type}: kwargs must be a JSON object, got {other}"
                )))
            }
        };
        let config = ExpectationConfig::with_kwargs(expectation_type, kwargs);
        self.invoke(&config, &Overrides::default(), true).await
    }

    /// Invokes a stored expectation config.
    pub async fn expect_config(&self, config: &ExpectationConfig) -> Result<EvaluationOutcome> {
        self.invoke(config, &Overrides::default(), true).await
    }

    #[instrument(
        skip(self, config, overrides),
        fields(
            expectation = %config.expectation_type,
            column = config.column().unwrap_or(""),
            backend = self.backend.name()
        )
    )]
    async fn invoke(
        &self,
        config: &ExpectationConfig,
        overrides: &Overrides,
        capture: bool,
    ) -> Result<EvaluationOutcome> {
        let definition = self.registry.get(&config.expectation_type).ok_or_else(|| {
            ExpectError::configuration(format!(
                "Unknown expectation type: {}",
                config.expectation_type
            ))
        })?;

        let (options, params) = InvocationOptions::split(&config.kwargs)?;
        let result_format = overrides
            .result_format
            .clone()
            .or(options.result_format)
            .unwrap_or_else(|| self.config.default_result_format.clone());
        let catch_exceptions = overrides
            .catch_exceptions
            .or(options.catch_exceptions)
            .unwrap_or(self.config.catch_exceptions);
        let include_config = overrides
            .include_config
            .or(options.include_config)
            .unwrap_or(self.config.include_config);
        let meta = options.meta.or_else(|| config.meta.clone());

        let params = ExpectationParams::new(&config.expectation_type, params);
        params.require(&definition.required())?;

        let mut outcome = match self.dispatch(definition, &params, &result_format).await {
            Ok(outcome) => outcome,
            Err(err) if catch_exceptions && err.is_catchable() => {
                warn!(error = %err, "Captured backend error as a failed outcome");
                EvaluationOutcome::from_exception(&err)
            }
            Err(err) => return Err(err),
        };

        if !outcome.success && self.config.log_failures {
            warn!("Expectation failed");
        }

        let recorded = ExpectationConfig {
            expectation_type: config.expectation_type.clone(),
            kwargs: params.as_map().clone(),
            meta: meta.clone(),
        };
        if include_config {
            outcome.expectation_config = Some(recorded.clone());
        }
        outcome.meta = meta;

        if capture && self.config.capture_configs {
            self.lock_suite().add_expectation(recorded);
        }

        Ok(outcome)
    }

    async fn dispatch(
        &self,
        definition: &ExpectationDefinition,
        params: &ExpectationParams,
        result_format: &ResultFormat,
    ) -> Result<EvaluationOutcome> {
        let backend = self.backend.as_ref();

        match &definition.kind {
            ExpectationKind::Map(expectation) => {
                let column = self.schema().column(params.column()?)?;
                let mostly = params.mostly()?;
                let condition = expectation.condition(column, params)?;
                evaluate_map(
                    backend,
                    &column.name,
                    condition,
                    expectation.null_policy(),
                    mostly,
                    result_format,
                )
                .await
            }
            ExpectationKind::Aggregate(expectation) => {
                let column = self.schema().column(params.column()?)?;
                let raw = expectation.compute(backend, column, params).await?;
                evaluate_aggregate(
                    backend,
                    params.expectation(),
                    &column.name,
                    raw,
                    result_format,
                )
                .await
            }
            ExpectationKind::Table(expectation) => {
                let raw = expectation.compute(backend, params).await?;
                evaluate_table(params.expectation(), raw, result_format)
            }
        }
    }

    /// Evaluates every config of a suite in order.
    ///
    /// Each result carries its `expectation_config`. Validation does not
    /// record configs into the dataset's own suite.
    #[instrument(
        skip(self, suite, options),
        fields(backend = self.backend.name(), expectations = suite.len())
    )]
    pub async fn validate(
        &self,
        suite: &ExpectationSuite,
        options: ValidateOptions,
    ) -> Result<ValidationReport> {
        let overrides = Overrides {
            result_format: options.result_format,
            catch_exceptions: options.catch_exceptions,
            include_config: Some(true),
        };

        let mut results = Vec::with_capacity(suite.len());
        for config in &suite.expectations {
            results.push(self.invoke(config, &overrides, false).await?);
        }

        let statistics = ValidationStatistics::from_outcomes(&results);
        let success = statistics.unsuccessful_expectations == 0;
        if options.only_return_failures {
            results.retain(|outcome| !outcome.success);
        }

        info!(
            evaluated = statistics.evaluated_expectations,
            successful = statistics.successful_expectations,
            success,
            "Validation completed"
        );

        Ok(ValidationReport {
            success,
            results,
            statistics,
            meta: json!({
                "data_asset_name": suite.data_asset_name,
                "expectation_suite_meta": suite.meta,
                "validation_time": Utc::now().to_rfc3339(),
            }),
        })
    }

    /// Evaluates the configs captured by this dataset.
    pub async fn validate_captured(&self, options: ValidateOptions) -> Result<ValidationReport> {
        let suite = self.expectation_suite();
        self.validate(&suite, options).await
    }
}

/// Builds a kwargs object, skipping absent values.
fn kwargs<const N: usize>(pairs: [(&str, Option<Value>); N]) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect();
    Value::Object(map)
}

/// Typed wrappers over [`Dataset::expect`] for the built-in expectations.
impl Dataset {
    pub async fn expect_table_row_count_to_equal(&self, value: u64) -> Result<EvaluationOutcome> {
        self.expect("expect_table_row_count_to_equal", json!({ "value": value }))
            .await
    }

    pub async fn expect_table_row_count_to_be_between(
        &self,
        min_value: Option<u64>,
        max_value: Option<u64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_table_row_count_to_be_between",
            kwargs([
                ("min_value", min_value.map(Value::from)),
                ("max_value", max_value.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_to_exist(
        &self,
        column: &str,
        column_index: Option<usize>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_to_exist",
            kwargs([
                ("column", Some(json!(column))),
                ("column_index", column_index.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_be_null(
        &self,
        column: &str,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_be_null",
            kwargs([
                ("column", Some(json!(column))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_not_be_null(
        &self,
        column: &str,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_not_be_null",
            kwargs([
                ("column", Some(json!(column))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_be_in_set(
        &self,
        column: &str,
        values_set: Vec<Value>,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_be_in_set",
            kwargs([
                ("column", Some(json!(column))),
                ("values_set", Some(Value::Array(values_set))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_not_be_in_set(
        &self,
        column: &str,
        values_set: Vec<Value>,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_not_be_in_set",
            kwargs([
                ("column", Some(json!(column))),
                ("values_set", Some(Value::Array(values_set))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_be_between(
        &self,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_be_between",
            kwargs([
                ("column", Some(json!(column))),
                ("min_value", min_value),
                ("max_value", max_value),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_match_regex(
        &self,
        column: &str,
        regex: &str,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_match_regex",
            kwargs([
                ("column", Some(json!(column))),
                ("regex", Some(json!(regex))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_values_to_not_match_regex(
        &self,
        column: &str,
        regex: &str,
        mostly: Option<f64>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            "expect_column_values_to_not_match_regex",
            kwargs([
                ("column", Some(json!(column))),
                ("regex", Some(json!(regex))),
                ("mostly", mostly.map(Value::from)),
            ]),
        )
        .await
    }

    pub async fn expect_column_max_to_be_between(
        &self,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
    ) -> Result<EvaluationOutcome> {
        self.expect_statistic("expect_column_max_to_be_between", column, min_value, max_value)
            .await
    }

    pub async fn expect_column_min_to_be_between(
        &self,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
    ) -> Result<EvaluationOutcome> {
        self.expect_statistic("expect_column_min_to_be_between", column, min_value, max_value)
            .await
    }

    pub async fn expect_column_sum_to_be_between(
        &self,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
    ) -> Result<EvaluationOutcome> {
        self.expect_statistic("expect_column_sum_to_be_between", column, min_value, max_value)
            .await
    }

    pub async fn expect_column_mean_to_be_between(
        &self,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
    ) -> Result<EvaluationOutcome> {
        self.expect_statistic("expect_column_mean_to_be_between", column, min_value, max_value)
            .await
    }

    async fn expect_statistic(
        &self,
        expectation_type: &str,
        column: &str,
        min_value: Option<Value>,
        max_value: Option<Value>,
    ) -> Result<EvaluationOutcome> {
        self.expect(
            expectation_type,
            kwargs([
                ("column", Some(json!(column))),
                ("min_value", min_value),
                ("max_value", max_value),
            ]),
        )
        .await
    }
}
