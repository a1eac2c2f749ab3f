use super::evaluate_success;
use crate::backend::BackendAdapter;
use crate::core::{Condition, EvaluationOutcome, NullPolicy, ResultFormat, ResultFormatLevel};
use crate::formatters::{MapTally, OutcomeFormatter};
use crate::prelude::*;
use tracing::{debug, instrument};

/// Evaluates a column map expectation.
///
/// `condition` describes the *unexpected* rows. Under
/// [`NullPolicy::IgnoreNulls`] it is restricted to non-null rows and success
/// is measured over them; under [`NullPolicy::IncludeNulls`] it sees every
/// row and success is measured over the whole table.
///
/// At most two round trips are issued: the combined counts, then a sample of
/// unexpected values. The sample is skipped when nothing is unexpected, when
/// the limit is zero, or at `BOOLEAN_ONLY`.
#[instrument(
    skip(backend, condition, result_format),
    fields(backend = backend.name(), column = %column, null_policy = ?null_policy, mostly = ?mostly)
)]
pub async fn evaluate_map(
    backend: &dyn BackendAdapter,
    column: &str,
    condition: Condition,
    null_policy: NullPolicy,
    mostly: Option<f64>,
    result_format: &ResultFormat,
) -> Result<EvaluationOutcome> {
    backend.schema().column(column)?;

    let condition = null_policy.apply(column, condition);
    let counts = backend
        .count_and_null_and_unexpected(column, &condition)
        .await?;

    let nonnull_count = counts.nonnull_count();
    let domain_count = match null_policy {
        NullPolicy::IgnoreNulls => nonnull_count,
        NullPolicy::IncludeNulls => counts.element_count,
    };
    let unexpected_count = counts.unexpected_count.min(domain_count);
    let success_count = domain_count - unexpected_count;
    let success = evaluate_success(success_count, domain_count, mostly);

    let limit = result_format.unexpected_count_limit();
    let wants_sample = result_format.level > ResultFormatLevel::BooleanOnly
        && unexpected_count > 0
        && limit != Some(0);
    let sample = if wants_sample {
        backend.sample_unexpected(column, &condition, limit).await?
    } else {
        Vec::new()
    };

    debug!(
        element_count = counts.element_count,
        nonnull_count,
        unexpected_count,
        sample_len = sample.len(),
        success,
        "Evaluated map expectation"
    );

    Ok(OutcomeFormatter::format_map(
        result_format,
        success,
        MapTally {
            element_count: counts.element_count,
            nonnull_count,
            domain_count,
            unexpected_count,
        },
        sample,
    ))
}
