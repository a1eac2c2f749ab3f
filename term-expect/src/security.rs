//! SQL quoting and input validation for pushed-down queries.
//!
//! Every identifier and literal that the SQL backend splices into a query
//! passes through [`SqlSecurity`]. Parameter values supplied by callers are
//! checked by [`InputValidator`] before any backend work starts.

use crate::error::{ExpectError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_IDENTIFIER_LENGTH: usize = 128;
const MAX_PATTERN_LENGTH: usize = 1000;

/// SQL identifier and literal escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and quotes a column identifier.
    ///
    /// Column names come from the introspected schema, so any printable name
    /// is accepted; embedded double quotes are doubled.
    ///
    /// # Examples
    /// ```rust
    /// use term_expect::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("amount").unwrap(), "\"amount\"");
    /// assert_eq!(SqlSecurity::escape_identifier("Order Date").unwrap(), "\"Order Date\"");
    /// assert!(SqlSecurity::escape_identifier("").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;

        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Validates an identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(ExpectError::Security(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(ExpectError::Security(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        if identifier.contains('\0') {
            return Err(ExpectError::Security(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates a (possibly schema-qualified) table reference.
    ///
    /// ```rust
    /// use term_expect::security::SqlSecurity;
    ///
    /// assert!(SqlSecurity::validate_table_reference("public.Orders").is_ok());
    /// assert!(SqlSecurity::validate_table_reference("orders; DROP TABLE x").is_err());
    /// ```
    pub fn validate_table_reference(table: &str) -> Result<()> {
        static TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
            // Hard-coded pattern, known to be valid
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        Self::validate_identifier(table)?;
        if !TABLE_REGEX.is_match(table) {
            return Err(ExpectError::Security(format!(
                "Invalid table reference: '{table}'. Table names must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }
        Ok(())
    }

    /// Quotes a string literal, doubling embedded single quotes.
    pub fn escape_string_literal(value: &str) -> Result<String> {
        if value.contains('\0') {
            return Err(ExpectError::Security(
                "String literal cannot contain null bytes".to_string(),
            ));
        }
        let escaped = value.replace('\'', "''");
        Ok(format!("'{escaped}'"))
    }

    /// Validates a regular expression supplied as an expectation parameter.
    pub fn validate_regex_pattern(pattern: &str) -> Result<()> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(ExpectError::Security(format!(
                "Regex pattern too long (max {MAX_PATTERN_LENGTH} characters)"
            )));
        }

        Regex::new(pattern)
            .map(|_| ())
            .map_err(|e| ExpectError::configuration(format!("Invalid regex pattern: {e}")))
    }
}

/// Validation of numeric expectation parameters.
pub struct InputValidator;

impl InputValidator {
    /// Validates that a value is finite.
    pub fn validate_finite(value: f64, name: &str) -> Result<()> {
        if !value.is_finite() {
            return Err(ExpectError::configuration(format!(
                "Invalid {name} value: must be finite (not NaN or infinite)"
            )));
        }
        Ok(())
    }

    /// Validates a fraction in `[0, 1]`, as used by `mostly`.
    pub fn validate_fraction(value: f64, name: &str) -> Result<()> {
        Self::validate_finite(value, name)?;

        if !(0.0..=1.0).contains(&value) {
            return Err(ExpectError::configuration(format!(
                "Invalid {name} value: must be between 0.0 and 1.0, got {value}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_escaping() {
        assert_eq!(
            SqlSecurity::escape_identifier("customer_id").unwrap(),
            "\"customer_id\""
        );
        assert_eq!(
            SqlSecurity::escape_identifier("col\"quoted").unwrap(),
            "\"col\"\"quoted\""
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::validate_identifier("").is_err());
        assert!(SqlSecurity::validate_identifier("   ").is_err());
        assert!(SqlSecurity::validate_identifier(&"a".repeat(200)).is_err());
        assert!(SqlSecurity::validate_identifier("nul\0byte").is_err());
    }

    #[test]
    fn test_table_references() {
        assert!(SqlSecurity::validate_table_reference("data").is_ok());
        assert!(SqlSecurity::validate_table_reference("Sales.Orders_2024").is_ok());
        assert!(SqlSecurity::validate_table_reference("123table").is_err());
        assert!(SqlSecurity::validate_table_reference("t--comment").is_err());
        assert!(SqlSecurity::validate_table_reference("a b").is_err());
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(SqlSecurity::escape_string_literal("abc").unwrap(), "'abc'");
        assert_eq!(
            SqlSecurity::escape_string_literal("it's").unwrap(),
            "'it''s'"
        );
        assert!(SqlSecurity::escape_string_literal("x\0").is_err());
    }

    #[test]
    fn test_regex_pattern_validation() {
        assert!(SqlSecurity::validate_regex_pattern(r"^[A-Z]\d+$").is_ok());
        assert!(matches!(
            SqlSecurity::validate_regex_pattern(r"[unclosed"),
            Err(ExpectError::Configuration(_))
        ));
        assert!(SqlSecurity::validate_regex_pattern(&"a".repeat(2000)).is_err());
    }

    #[test]
    fn test_fraction_validation() {
        assert!(InputValidator::validate_fraction(0.95, "mostly").is_ok());
        assert!(InputValidator::validate_fraction(0.0, "mostly").is_ok());
        assert!(InputValidator::validate_fraction(1.0, "mostly").is_ok());
        assert!(InputValidator::validate_fraction(1.5, "mostly").is_err());
        assert!(InputValidator::validate_fraction(-0.1, "mostly").is_err());
        assert!(InputValidator::validate_fraction(f64::NAN, "mostly").is_err());
    }
}
