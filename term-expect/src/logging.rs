//! Logging utilities and configuration for term-expect.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. [`setup::init_logging`] is provided for binaries and
//! tests that want a ready-made one.

/// Controls how much diagnostic detail a backend logs.
///
/// Set per backend with `with_log_config`. Whether failed expectations are
/// logged is a dataset setting, see
/// [`DatasetConfig::log_failures`](crate::core::DatasetConfig::log_failures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether to log the text of pushed-down queries
    pub log_queries: bool,
    /// Whether to log per-query counts and batch scans
    pub log_evaluation_details: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_queries: false,
            log_evaluation_details: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            log_queries: true,
            log_evaluation_details: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            log_queries: false,
            log_evaluation_details: false,
            max_field_length: 128,
        }
    }
}

/// Logs a pushed-down query if query logging is enabled.
#[macro_export]
macro_rules! log_query {
    ($config:expr, $backend:expr, $sql:expr) => {
        if $config.log_queries {
            tracing::debug!(
                backend = $backend,
                query = %$crate::logging::truncate_field($sql, $config.max_field_length),
                "Executing query"
            );
        }
    };
}

/// Logs evaluation details if enabled.
#[macro_export]
macro_rules! log_evaluation {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_evaluation_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
///
/// The cut never splits a UTF-8 character.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }

    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for applications embedding term-expect.
pub mod setup {
    use tracing::Level;

    /// Configuration for the `tracing-subscriber` installed by [`init_logging`].
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for term-expect specifically
        pub expect_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                expect_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                expect_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                expect_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for the application.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for term-expect.
        pub fn with_expect_level(mut self, level: Level) -> Self {
            self.expect_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},term_expect={}",
                    self.level.as_str().to_lowercase(),
                    self.expect_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use term_expect::logging::setup::{init_logging, LoggingConfig};
    ///
    /// let config = LoggingConfig::development().with_json_format(true);
    /// init_logging(config).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert!(!config.log_queries);
        assert!(!config.log_evaluation_details);

        let verbose = LogConfig::verbose();
        assert!(verbose.log_queries);
        assert!(verbose.log_evaluation_details);
        assert_eq!(verbose.max_field_length, 1024);

        let production = LogConfig::production();
        assert!(!production.log_queries);
        assert_eq!(production.max_field_length, 128);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        // 'é' is two bytes; the cut backs off to the previous boundary
        assert_eq!(truncate_field("aé", 2), "a...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LoggingConfig::default().env_filter(), "info,term_expect=debug");
        assert_eq!(
            LoggingConfig::production().env_filter(),
            "warn,term_expect=info"
        );
        assert_eq!(
            LoggingConfig::default()
                .with_env_filter("term_expect=trace")
                .env_filter(),
            "term_expect=trace"
        );
    }
}
