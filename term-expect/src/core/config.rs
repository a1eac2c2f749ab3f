//! Dataset and DataFusion session configuration.

use super::ResultFormat;
use crate::prelude::*;
use datafusion::execution::context::{SessionConfig, SessionContext};
use datafusion::execution::memory_pool::{FairSpillPool, MemoryPool};
use datafusion::execution::runtime_env::RuntimeEnvBuilder;
use std::sync::Arc;
use tracing::instrument;

/// Defaults applied to every expectation invoked on a [`Dataset`](super::Dataset).
///
/// Each default can be overridden per call through the kwargs
/// `result_format`, `catch_exceptions` and `include_config`.
///
/// # Examples
///
/// ```rust
/// use term_expect::core::{DatasetConfig, ResultFormat};
///
/// let config = DatasetConfig::default()
///     .with_result_format(ResultFormat::summary())
///     .with_catch_exceptions(true);
/// assert!(config.catch_exceptions);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Verbosity used when a call does not request one
    pub default_result_format: ResultFormat,
    /// Capture backend errors into failed outcomes by default
    pub catch_exceptions: bool,
    /// Attach the expectation config to every outcome by default
    pub include_config: bool,
    /// Record invoked configs into the dataset's suite
    pub capture_configs: bool,
    /// Emit a `warn!` event for every failed expectation
    pub log_failures: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            default_result_format: ResultFormat::basic(),
            catch_exceptions: false,
            include_config: false,
            capture_configs: true,
            log_failures: true,
        }
    }
}

impl DatasetConfig {
    /// Fails fast on any error and keeps outcomes small.
    pub fn strict() -> Self {
        Self {
            default_result_format: ResultFormat::boolean_only(),
            catch_exceptions: false,
            ..Self::default()
        }
    }

    /// Captures backend errors and returns detailed outcomes.
    pub fn lenient() -> Self {
        Self {
            default_result_format: ResultFormat::summary(),
            catch_exceptions: true,
            include_config: true,
            ..Self::default()
        }
    }

    /// Sets the default result format.
    pub fn with_result_format(mut self, result_format: impl Into<ResultFormat>) -> Self {
        self.default_result_format = result_format.into();
        self
    }

    /// Sets the default catch-exceptions mode.
    pub fn with_catch_exceptions(mut self, enabled: bool) -> Self {
        self.catch_exceptions = enabled;
        self
    }

    /// Sets whether outcomes carry their config by default.
    pub fn with_include_config(mut self, enabled: bool) -> Self {
        self.include_config = enabled;
        self
    }

    /// Sets whether invoked configs are recorded.
    pub fn with_capture_configs(mut self, enabled: bool) -> Self {
        self.capture_configs = enabled;
        self
    }

    /// Sets whether failed expectations are logged.
    pub fn with_log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }
}

/// Settings for the DataFusion session behind a SQL backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
    /// Maximum memory for query execution (in bytes)
    pub max_memory: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
            max_memory: 2 * 1024 * 1024 * 1024, // 2GB
        }
    }
}

impl SessionSettings {
    /// Single-partition execution, so unexpected samples come back in table order.
    pub fn deterministic() -> Self {
        Self {
            target_partitions: 1,
            ..Self::default()
        }
    }

    /// Builds a session context with a bounded memory pool.
    #[instrument]
    pub fn session_context(&self) -> Result<SessionContext> {
        let session_config = SessionConfig::new()
            .with_batch_size(self.batch_size)
            .with_target_partitions(self.target_partitions);

        let memory_pool = Arc::new(FairSpillPool::new(self.max_memory)) as Arc<dyn MemoryPool>;
        let runtime_env = RuntimeEnvBuilder::new()
            .with_memory_pool(memory_pool)
            .build()
            .map(Arc::new)?;

        Ok(SessionContext::new_with_config_rt(session_config, runtime_env))
    }
}
