//! Configuration for the attribute engine

use serde::Deserialize;

/// What to do when `ref` selectors form a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePolicy {
    /// Fail with a circular reference error
    #[default]
    Strict,
    /// Log a warning and resolve in arrival order
    BestEffort,
}

/// Configuration options for attribute resolution
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cycle_policy: CyclePolicy,

    /// Fractional digits kept in the translation of a written transform
    pub transform_precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_policy: CyclePolicy::Strict,
            transform_precision: 1,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn with_transform_precision(mut self, precision: u32) -> Self {
        self.transform_precision = precision;
        self
    }
}
