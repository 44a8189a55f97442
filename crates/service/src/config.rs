//! Service configuration loaded from environment variables.

use fulfillment::{ChaosConfig, FailureScenario};

use crate::facade::ExecutionStrategy;

/// Runtime settings with sensible defaults.
///
/// Reads from environment variables:
/// - `STRATEGY` — `"pipeline"` or `"workflow"` (default: `"pipeline"`)
/// - `BASE_DELAY_MS` — simulated per-stage delay (default: `4000`)
/// - `FAILURE_SCENARIO` — `"none"`, `"equipment_failure"`, `"code_bug"`,
///   or `"delivery_failure"` (default: `"none"`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: ExecutionStrategy,
    pub base_delay_ms: u64,
    pub scenario: FailureScenario,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything absent or unparsable.
    pub fn from_env() -> Self {
        Self {
            strategy: std::env::var("STRATEGY")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            base_delay_ms: std::env::var("BASE_DELAY_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(fulfillment::chaos::DEFAULT_DELAY_MS),
            scenario: std::env::var("FAILURE_SCENARIO")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Builds a chaos config carrying these settings.
    pub fn chaos(&self) -> ChaosConfig {
        let chaos = ChaosConfig::with_scenario(self.scenario);
        chaos.set_base_delay_ms(self.base_delay_ms);
        chaos
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::default(),
            base_delay_ms: fulfillment::chaos::DEFAULT_DELAY_MS,
            scenario: FailureScenario::default(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.strategy, ExecutionStrategy::Pipeline);
        assert_eq!(config.base_delay_ms, 4_000);
        assert_eq!(config.scenario, FailureScenario::None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn chaos_carries_settings() {
        let config = Config {
            scenario: FailureScenario::EquipmentFailure,
            base_delay_ms: 250,
            ..Config::default()
        };
        let chaos = config.chaos();
        assert_eq!(chaos.scenario(), FailureScenario::EquipmentFailure);
        assert_eq!(chaos.base_delay_ms(), 250);
    }
}
