use super::{
    AggregateExpectation, ColumnToExist, MapExpectation, RowCountBetween, RowCountEqual,
    StatisticBetween, TableExpectation, ValuesBetween, ValuesInSet, ValuesMatchRegex,
    ValuesNotInSet, ValuesNotMatchRegex, ValuesNotNull, ValuesNull,
};
use crate::backend::Statistic;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The implementation behind a registered expectation.
#[derive(Clone)]
pub enum ExpectationKind {
    /// Per-row condition over one column
    Map(Arc<dyn MapExpectation>),
    /// Single statistic over one column
    Aggregate(Arc<dyn AggregateExpectation>),
    /// Property of the whole table
    Table(Arc<dyn TableExpectation>),
}

impl ExpectationKind {
    /// Whether the expectation targets a column resolved before dispatch.
    pub fn is_column_scoped(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Aggregate(_))
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Aggregate(_) => "aggregate",
            Self::Table(_) => "table",
        }
    }
}

impl fmt::Debug for ExpectationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named expectation together with its required parameters.
#[derive(Debug, Clone)]
pub struct ExpectationDefinition {
    /// Registered name, e.g. `expect_column_values_to_be_in_set`
    pub name: String,
    /// Implementation
    pub kind: ExpectationKind,
    /// Parameters that must be present and non-null
    pub required_params: Vec<String>,
}

impl ExpectationDefinition {
    fn new(name: impl Into<String>, required_params: &[&str], kind: ExpectationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required_params: required_params.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Defines a column map expectation.
    pub fn map(
        name: impl Into<String>,
        required_params: &[&str],
        expectation: Arc<dyn MapExpectation>,
    ) -> Self {
        Self::new(name, required_params, ExpectationKind::Map(expectation))
    }

    /// Defines a column aggregate expectation.
    pub fn aggregate(
        name: impl Into<String>,
        required_params: &[&str],
        expectation: Arc<dyn AggregateExpectation>,
    ) -> Self {
        Self::new(name, required_params, ExpectationKind::Aggregate(expectation))
    }

    /// Defines a table expectation.
    pub fn table(
        name: impl Into<String>,
        required_params: &[&str],
        expectation: Arc<dyn TableExpectation>,
    ) -> Self {
        Self::new(name, required_params, ExpectationKind::Table(expectation))
    }

    /// Required parameter names as string slices.
    pub fn required(&self) -> Vec<&str> {
        self.required_params.iter().map(String::as_str).collect()
    }
}

/// Name-to-definition lookup used by [`Dataset`](crate::core::Dataset).
#[derive(Debug, Clone, Default)]
pub struct ExpectationRegistry {
    definitions: HashMap<String, ExpectationDefinition>,
}

impl ExpectationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in expectation.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(ExpectationDefinition::table(
            "expect_table_row_count_to_equal",
            &["value"],
            Arc::new(RowCountEqual),
        ));
        registry.register(ExpectationDefinition::table(
            "expect_table_row_count_to_be_between",
            &[],
            Arc::new(RowCountBetween),
        ));
        registry.register(ExpectationDefinition::table(
            "expect_column_to_exist",
            &["column"],
            Arc::new(ColumnToExist),
        ));

        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_be_null",
            &["column"],
            Arc::new(ValuesNull),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_not_be_null",
            &["column"],
            Arc::new(ValuesNotNull),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_be_in_set",
            &["column", "values_set"],
            Arc::new(ValuesInSet),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_not_be_in_set",
            &["column", "values_set"],
            Arc::new(ValuesNotInSet),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_be_between",
            &["column"],
            Arc::new(ValuesBetween),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_match_regex",
            &["column", "regex"],
            Arc::new(ValuesMatchRegex),
        ));
        registry.register(ExpectationDefinition::map(
            "expect_column_values_to_not_match_regex",
            &["column", "regex"],
            Arc::new(ValuesNotMatchRegex),
        ));

        for statistic in [Statistic::Max, Statistic::Min, Statistic::Sum, Statistic::Mean] {
            registry.register(ExpectationDefinition::aggregate(
                format!("expect_column_{}_to_be_between", statistic),
                &["column"],
                Arc::new(StatisticBetween::new(statistic)),
            ));
        }

        registry
    }

    /// Registers a definition, replacing any existing one with the same name.
    ///
    /// Returns the replaced definition.
    pub fn register(&mut self, definition: ExpectationDefinition) -> Option<ExpectationDefinition> {
        self.definitions.insert(definition.name.clone(), definition)
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<&ExpectationDefinition> {
        self.definitions.get(name)
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
