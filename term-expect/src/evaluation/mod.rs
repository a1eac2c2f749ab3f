//! Evaluators shared by every expectation of a kind.
//!
//! Expectations only describe *what* to check: a row condition, a statistic
//! or a table property. The evaluators in this module do the rest. They
//! issue the backend round trips, derive counts and ratios, apply `mostly`,
//! and hand the numbers to the [`OutcomeFormatter`](crate::formatters::OutcomeFormatter).

mod aggregate;
mod map;
mod table;

pub use aggregate::{evaluate_aggregate, StatisticOutput};
pub use map::evaluate_map;
pub use table::{evaluate_table, TableOutput};

/// Decides success from the number of conforming rows.
///
/// With `mostly == None` every evaluated row must conform; otherwise the
/// conforming fraction must reach `mostly`. An empty domain succeeds
/// vacuously.
///
/// # Examples
///
/// ```rust
/// use term_expect::evaluation::evaluate_success;
///
/// assert!(evaluate_success(8, 10, Some(0.8)));
/// assert!(!evaluate_success(7, 10, Some(0.8)));
/// assert!(!evaluate_success(9, 10, None));
/// assert!(evaluate_success(0, 0, None));
/// ```
pub fn evaluate_success(success_count: u64, domain_count: u64, mostly: Option<f64>) -> bool {
    if domain_count == 0 {
        return true;
    }
    match mostly {
        None => success_count >= domain_count,
        Some(mostly) => success_count as f64 / domain_count as f64 >= mostly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn strict_success_means_no_unexpected(domain in 0u64..1000, unexpected in 0u64..1000) {
            let unexpected = unexpected.min(domain);
            let success = evaluate_success(domain - unexpected, domain, None);
            prop_assert_eq!(success, unexpected == 0);
        }

        #[test]
        fn mostly_is_monotonic(domain in 1u64..1000, conforming in 0u64..1000, mostly in 0.0f64..=1.0) {
            let conforming = conforming.min(domain);
            if evaluate_success(conforming, domain, Some(mostly)) && conforming < domain {
                prop_assert!(evaluate_success(conforming + 1, domain, Some(mostly)));
            }
        }

        #[test]
        fn empty_domain_is_vacuous(mostly in proptest::option::of(0.0f64..=1.0)) {
            prop_assert!(evaluate_success(0, 0, mostly));
        }
    }

    #[test]
    fn test_mostly_boundaries() {
        assert!(evaluate_success(10, 10, Some(1.0)));
        assert!(!evaluate_success(9, 10, Some(1.0)));
        assert!(evaluate_success(0, 10, Some(0.0)));
    }
}
