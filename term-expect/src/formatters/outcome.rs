//! Shapes raw evaluation numbers into an [`EvaluationOutcome`] at the
//! requested verbosity.
//!
//! Every evaluator funnels its results through [`OutcomeFormatter`], so the
//! field set of an outcome depends only on its kind and result format:
//!
//! | level          | map                                   | aggregate              | table            |
//! |----------------|---------------------------------------|------------------------|------------------|
//! | `BOOLEAN_ONLY` | `success`                             | `success`              | `success`        |
//! | `BASIC`        | + counts, percents, unexpected sample | + observed, counts     | + observed value |
//! | `SUMMARY`      | + `partial_unexpected_counts`         | + `details`            | same as BASIC    |
//! | `COMPLETE`     | same as SUMMARY, unbounded sample     | same as SUMMARY        | same as BASIC    |

use crate::core::{
    AggregateResult, EvaluationOutcome, MapResult, ResultFormat, ResultFormatLevel, ResultObject,
    TableResult, ValueCount,
};
use serde_json::Value;
use std::collections::HashMap;

/// Counts a map evaluator hands to the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapTally {
    /// Total number of rows
    pub element_count: u64,
    /// Rows where the column is not null
    pub nonnull_count: u64,
    /// Rows the condition was evaluated over; the `unexpected_percent` denominator
    pub domain_count: u64,
    /// Rows that violate the expectation
    pub unexpected_count: u64,
}

impl MapTally {
    /// Rows where the column is null.
    pub fn missing_count(&self) -> u64 {
        self.element_count.saturating_sub(self.nonnull_count)
    }
}

/// Builds outcomes for the three expectation kinds.
pub struct OutcomeFormatter;

impl OutcomeFormatter {
    /// Formats a column map outcome.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_json::json;
    /// use term_expect::core::ResultFormat;
    /// use term_expect::formatters::{MapTally, OutcomeFormatter};
    ///
    /// let tally = MapTally {
    ///     element_count: 10,
    ///     nonnull_count: 8,
    ///     domain_count: 8,
    ///     unexpected_count: 2,
    /// };
    /// let outcome = OutcomeFormatter::format_map(
    ///     &ResultFormat::basic(),
    ///     false,
    ///     tally,
    ///     vec![json!(-1), json!(130)],
    /// );
    ///
    /// let result = outcome.map_result().unwrap();
    /// assert_eq!(result.missing_count, 2);
    /// assert_eq!(result.unexpected_percent, Some(0.25));
    /// ```
    pub fn format_map(
        result_format: &ResultFormat,
        success: bool,
        tally: MapTally,
        partial_unexpected_list: Vec<Value>,
    ) -> EvaluationOutcome {
        if result_format.level == ResultFormatLevel::BooleanOnly {
            return EvaluationOutcome::boolean(success);
        }

        let partial_unexpected_counts = (result_format.level >= ResultFormatLevel::Summary)
            .then(|| value_counts(&partial_unexpected_list));

        EvaluationOutcome::with_result(
            success,
            ResultObject::Map(MapResult {
                element_count: tally.element_count,
                missing_count: tally.missing_count(),
                missing_percent: ratio(tally.missing_count(), tally.element_count),
                unexpected_count: tally.unexpected_count,
                unexpected_percent: ratio(tally.unexpected_count, tally.domain_count),
                partial_unexpected_list,
                partial_unexpected_counts,
            }),
        )
    }

    /// Formats a column aggregate outcome.
    ///
    /// `details` is only kept at `SUMMARY` and above.
    pub fn format_aggregate(
        result_format: &ResultFormat,
        success: bool,
        observed_value: Value,
        element_count: u64,
        null_count: u64,
        details: Option<Value>,
    ) -> EvaluationOutcome {
        if result_format.level == ResultFormatLevel::BooleanOnly {
            return EvaluationOutcome::boolean(success);
        }

        let details = if result_format.level >= ResultFormatLevel::Summary {
            details
        } else {
            None
        };

        EvaluationOutcome::with_result(
            success,
            ResultObject::Aggregate(AggregateResult {
                observed_value,
                element_count,
                missing_count: null_count,
                missing_percent: ratio(null_count, element_count),
                details,
            }),
        )
    }

    /// Formats a table-level outcome.
    pub fn format_table(
        result_format: &ResultFormat,
        success: bool,
        observed_value: Option<Value>,
    ) -> EvaluationOutcome {
        match observed_value {
            Some(observed_value) if result_format.level > ResultFormatLevel::BooleanOnly => {
                EvaluationOutcome::with_result(
                    success,
                    ResultObject::Table(TableResult { observed_value }),
                )
            }
            _ => EvaluationOutcome::boolean(success),
        }
    }
}

/// `part / whole`, or `None` when `whole` is zero.
pub fn ratio(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

/// Groups sampled values by descending count, ties in order of first appearance.
fn value_counts(values: &[Value]) -> Vec<ValueCount> {
    let mut counts: Vec<ValueCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for value in values {
        let key = value.to_string();
        match positions.get(&key) {
            Some(&index) => counts[index].count += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push(ValueCount {
                    value: value.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tally() -> MapTally {
        MapTally {
            element_count: 10,
            nonnull_count: 9,
            domain_count: 9,
            unexpected_count: 3,
        }
    }

    #[test]
    fn test_boolean_only_has_single_field() {
        let outcome = OutcomeFormatter::format_map(
            &ResultFormat::boolean_only(),
            true,
            tally(),
            vec![json!(1)],
        );
        assert_eq!(outcome.field_names(), vec!["success"]);

        let aggregate = OutcomeFormatter::format_aggregate(
            &ResultFormat::boolean_only(),
            false,
            json!(3),
            10,
            0,
            None,
        );
        assert_eq!(aggregate.field_names(), vec!["success"]);
    }

    #[test]
    fn test_map_fields_are_monotonic() {
        let sample = vec![json!("a"), json!("b"), json!("a")];
        let levels = [
            ResultFormat::boolean_only(),
            ResultFormat::basic(),
            ResultFormat::summary(),
            ResultFormat::complete(),
        ];

        let field_sets: Vec<Vec<String>> = levels
            .iter()
            .map(|format| {
                OutcomeFormatter::format_map(format, false, tally(), sample.clone()).field_names()
            })
            .collect();

        for pair in field_sets.windows(2) {
            assert!(pair[0].iter().all(|field| pair[1].contains(field)));
        }
        assert!(field_sets[2].contains(&"result_obj.partial_unexpected_counts".to_string()));
        assert!(!field_sets[1].contains(&"result_obj.partial_unexpected_counts".to_string()));
    }

    #[test]
    fn test_value_counts_order() {
        let sample = vec![json!("b"), json!("a"), json!("a"), json!("c"), json!("b"), json!("a")];
        let counts = value_counts(&sample);
        assert_eq!(
            counts,
            vec![
                ValueCount { value: json!("a"), count: 3 },
                ValueCount { value: json!("b"), count: 2 },
                ValueCount { value: json!("c"), count: 1 },
            ]
        );
    }

    #[test]
    fn test_percentages_absent_for_empty_domains() {
        let outcome = OutcomeFormatter::format_map(
            &ResultFormat::basic(),
            true,
            MapTally::default(),
            vec![],
        );
        let result = outcome.map_result().unwrap();
        assert_eq!(result.missing_percent, None);
        assert_eq!(result.unexpected_percent, None);
    }

    #[test]
    fn test_aggregate_details_only_at_summary() {
        let details = Some(json!({"method": "max"}));
        let basic = OutcomeFormatter::format_aggregate(
            &ResultFormat::basic(),
            true,
            json!(5),
            4,
            1,
            details.clone(),
        );
        assert!(basic.aggregate_result().unwrap().details.is_none());
        assert_eq!(basic.aggregate_result().unwrap().missing_percent, Some(0.25));

        let summary = OutcomeFormatter::format_aggregate(
            &ResultFormat::summary(),
            true,
            json!(5),
            4,
            1,
            details.clone(),
        );
        assert_eq!(summary.aggregate_result().unwrap().details, details);
    }

    #[test]
    fn test_table_outcome() {
        let outcome =
            OutcomeFormatter::format_table(&ResultFormat::basic(), true, Some(json!(10)));
        assert_eq!(outcome.observed_value(), Some(&json!(10)));

        let boolean =
            OutcomeFormatter::format_table(&ResultFormat::boolean_only(), true, Some(json!(10)));
        assert_eq!(boolean.field_names(), vec!["success"]);
    }
}
