//! Fault-injection configuration shared by both execution strategies.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::state::Stage;

/// Failure scenarios selectable for fault-injection testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailureScenario {
    /// All stages operate normally.
    #[default]
    None,
    /// Toaster malfunction during bread toasting.
    EquipmentFailure,
    /// Division-by-zero defect in the sandwich assembly logic.
    CodeBug,
    /// Network connectivity failure during delivery.
    DeliveryFailure,
}

impl FailureScenario {
    /// All scenarios, for settings surfaces.
    pub const ALL: [FailureScenario; 4] = [
        FailureScenario::None,
        FailureScenario::EquipmentFailure,
        FailureScenario::CodeBug,
        FailureScenario::DeliveryFailure,
    ];

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            FailureScenario::None => "Normal Operation",
            FailureScenario::EquipmentFailure => "Equipment Failure",
            FailureScenario::CodeBug => "Code Bug",
            FailureScenario::DeliveryFailure => "Delivery Failure",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            FailureScenario::None => {
                "All services operate normally without any failures or delays"
            }
            FailureScenario::EquipmentFailure => {
                "Simulates toaster malfunction during bread toasting"
            }
            FailureScenario::CodeBug => {
                "Simulates a division by zero bug in the sandwich assembly logic"
            }
            FailureScenario::DeliveryFailure => {
                "Simulates delivery failure due to network connectivity issues"
            }
        }
    }

    /// The stages this scenario forces to fail.
    pub fn affected_stages(&self) -> &'static [Stage] {
        match self {
            FailureScenario::None => &[],
            FailureScenario::EquipmentFailure => &[Stage::ToastingBread],
            FailureScenario::CodeBug => &[Stage::AssemblingSandwich],
            FailureScenario::DeliveryFailure => &[Stage::Delivery],
        }
    }

    /// Snake-case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureScenario::None => "none",
            FailureScenario::EquipmentFailure => "equipment_failure",
            FailureScenario::CodeBug => "code_bug",
            FailureScenario::DeliveryFailure => "delivery_failure",
        }
    }
}

impl std::str::FromStr for FailureScenario {
    type Err = UnknownScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FailureScenario::None),
            "equipment_failure" => Ok(FailureScenario::EquipmentFailure),
            "code_bug" => Ok(FailureScenario::CodeBug),
            "delivery_failure" => Ok(FailureScenario::DeliveryFailure),
            other => Err(UnknownScenarioError(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized scenario name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScenarioError(pub String);

impl std::fmt::Display for UnknownScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown failure scenario: {}", self.0)
    }
}

impl std::error::Error for UnknownScenarioError {}

/// Default simulated per-stage delay.
pub const DEFAULT_DELAY_MS: u64 = 4_000;

/// Bounds the configurable base delay.
pub const MIN_DELAY_MS: u64 = 100;
pub const MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug)]
struct ChaosState {
    scenario: FailureScenario,
    base_delay_ms: u64,
}

/// Shared, injected chaos configuration.
///
/// Clones share the same underlying settings, so an executor and the
/// settings surface that reconfigures it can hold the same handle. Never
/// global: each test constructs its own.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    state: Arc<RwLock<ChaosState>>,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChaosConfig {
    /// Creates a config with no active scenario and the default delay.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ChaosState {
                scenario: FailureScenario::None,
                base_delay_ms: DEFAULT_DELAY_MS,
            })),
        }
    }

    /// Creates a config with the given scenario active.
    pub fn with_scenario(scenario: FailureScenario) -> Self {
        let config = Self::new();
        config.set_scenario(scenario);
        config
    }

    /// Returns the active failure scenario.
    pub fn scenario(&self) -> FailureScenario {
        self.state.read().unwrap().scenario
    }

    /// Sets the active failure scenario.
    pub fn set_scenario(&self, scenario: FailureScenario) {
        self.state.write().unwrap().scenario = scenario;
    }

    /// Returns the configured base delay in milliseconds.
    pub fn base_delay_ms(&self) -> u64 {
        self.state.read().unwrap().base_delay_ms
    }

    /// Sets the base delay, clamped to the 100–30000 ms range.
    pub fn set_base_delay_ms(&self, delay_ms: u64) {
        let clamped = delay_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS);
        self.state.write().unwrap().base_delay_ms = clamped;
    }

    /// Whether the active scenario forces the given stage to fail.
    pub fn should_fail(&self, stage: Stage) -> bool {
        self.scenario().affected_stages().contains(&stage)
    }

    /// Simulated processing delay for a stage: the base jittered by ±20%.
    pub fn delay_for(&self, _stage: Stage) -> Duration {
        let base = self.base_delay_ms();
        let factor = rand::thread_rng().gen_range(80..=120);
        Duration::from_millis(base * factor / 100)
    }

    /// Restores the default scenario and delay.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap();
        state.scenario = FailureScenario::None;
        state.base_delay_ms = DEFAULT_DELAY_MS;
    }
}
