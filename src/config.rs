//! Engine configuration.
//!
//! [`EngineConfig`] controls how many field paths are resolved concurrently
//! while matching and a compatibility switch for inequality removal. It can be
//! built in code with the `with_*` methods or loaded from YAML.
//!
//! ```rust
//! use expr_match::EngineConfig;
//!
//! let config = EngineConfig::from_yaml_str("concurrency: 8\nstrict_inequality_removal: true")?;
//! assert_eq!(config.concurrency, 8);
//! assert!(config.strict_inequality_removal);
//! # Ok::<(), expr_match::ExprError>(())
//! ```

use crate::error::{ExprError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound accepted for [`EngineConfig::concurrency`].
pub const MAX_CONCURRENCY: i64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of field paths matched at once.
    ///
    /// Zero or a negative value runs on the shared rayon pool without a
    /// dedicated bound.
    ///
    /// **Default**: `rayon::current_num_threads()`
    pub concurrency: i64,

    /// Report `PartNotFound` when removing an inequality part whose field
    /// path is indexed but whose literal bucket does not exist.
    ///
    /// Disabled, such removals succeed as a no-op, which is what existing
    /// callers rely on. Equality removal always reports `PartNotFound`.
    ///
    /// **Default**: false
    pub strict_inequality_removal: bool,

    /// Prefix used to name worker threads.
    ///
    /// **Default**: `"expr-match"`
    pub thread_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: rayon::current_num_threads() as i64,
            strict_inequality_removal: false,
            thread_name_prefix: "expr-match".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one field path at a time. Useful for debugging and tests.
    pub fn single_threaded() -> Self {
        Self {
            concurrency: 1,
            ..Self::default()
        }
    }

    /// Oversubscribe the CPU for events with many distinct field paths.
    pub fn high_throughput() -> Self {
        Self {
            concurrency: (rayon::current_num_threads() as i64 * 2).min(MAX_CONCURRENCY),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_concurrency(mut self, concurrency: i64) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_strict_inequality_removal(mut self, enable: bool) -> Self {
        self.strict_inequality_removal = enable;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency > MAX_CONCURRENCY {
            return Err(ExprError::InvalidConfig(format!(
                "concurrency {} exceeds the maximum of {MAX_CONCURRENCY}",
                self.concurrency
            )));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(ExprError::InvalidConfig(
                "thread_name_prefix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.concurrency >= 1);
        assert!(!config.strict_inequality_removal);
        assert_eq!(config.thread_name_prefix, "expr-match");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(EngineConfig::single_threaded().concurrency, 1);
        let high = EngineConfig::high_throughput();
        assert!(high.concurrency >= EngineConfig::default().concurrency);
        assert!(high.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::new()
            .with_concurrency(-1)
            .with_strict_inequality_removal(true)
            .with_thread_name_prefix("events");

        assert_eq!(config.concurrency, -1);
        assert!(config.strict_inequality_removal);
        assert_eq!(config.thread_name_prefix, "events");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let too_many = EngineConfig::new().with_concurrency(MAX_CONCURRENCY + 1);
        assert!(matches!(
            too_many.validate(),
            Err(ExprError::InvalidConfig(_))
        ));

        let unnamed = EngineConfig::new().with_thread_name_prefix(" ");
        assert!(matches!(unnamed.validate(), Err(ExprError::InvalidConfig(_))));
    }

    #[test]
    fn test_yaml_partial_config() {
        let config = EngineConfig::from_yaml_str("concurrency: 3").unwrap();
        assert_eq!(config.concurrency, 3);
        assert!(!config.strict_inequality_removal);
        assert_eq!(config.thread_name_prefix, "expr-match");
    }

    #[test]
    fn test_yaml_errors() {
        assert!(matches!(
            EngineConfig::from_yaml_str("concurrency: [1, 2"),
            Err(ExprError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("concurrency: 5000"),
            Err(ExprError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EngineConfig::single_threaded().with_strict_inequality_removal(true);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
