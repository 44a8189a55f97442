//! Strategy selection and the fulfilment facade.

use std::sync::RwLock;

use fulfillment::{
    FulfilmentEnv, FulfilmentError, IngredientSubstitution, OrderData, OrderState,
};
use pipeline::SandwichPipeline;
use serde::{Deserialize, Serialize};
use workflow::{WorkflowEngine, WorkflowError, WorkflowHandle};

/// Which executor handles an incoming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// In-process synchronous pipeline; the call blocks until done.
    #[default]
    Pipeline,
    /// Durable saga-driven workflow; the call returns a handle immediately.
    Workflow,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Pipeline => "pipeline",
            ExecutionStrategy::Workflow => "workflow",
        }
    }
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown execution strategy: {0}")]
pub struct ParseStrategyError(pub String);

impl std::str::FromStr for ExecutionStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pipeline" => Ok(ExecutionStrategy::Pipeline),
            "workflow" => Ok(ExecutionStrategy::Workflow),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Outcome of submitting an order: final state (pipeline) or a running
/// instance handle (workflow).
#[derive(Debug)]
pub enum Submission {
    Completed(OrderState),
    Started(WorkflowHandle),
}

/// Dispatches incoming orders to the active execution strategy.
///
/// Both executors share one environment, so chaos and catalog settings
/// apply to either path.
#[derive(Debug)]
pub struct FulfilmentService {
    pipeline: SandwichPipeline,
    engine: WorkflowEngine,
    strategy: RwLock<ExecutionStrategy>,
}

impl FulfilmentService {
    /// Creates a service over the shared environment, defaulting to the
    /// synchronous pipeline.
    pub fn new(env: FulfilmentEnv) -> Self {
        Self::with_strategy(env, ExecutionStrategy::default())
    }

    /// Creates a service with an explicit initial strategy.
    pub fn with_strategy(env: FulfilmentEnv, strategy: ExecutionStrategy) -> Self {
        Self {
            pipeline: SandwichPipeline::new(env.clone()),
            engine: WorkflowEngine::new(env),
            strategy: RwLock::new(strategy),
        }
    }

    /// Returns the currently active strategy.
    pub fn strategy(&self) -> ExecutionStrategy {
        *self.strategy.read().unwrap()
    }

    /// Switches the strategy for subsequently submitted orders.
    pub fn set_strategy(&self, strategy: ExecutionStrategy) {
        *self.strategy.write().unwrap() = strategy;
        tracing::info!(%strategy, "active execution strategy changed");
    }

    pub fn env(&self) -> &FulfilmentEnv {
        self.pipeline.env()
    }

    /// Submits an order under the active strategy.
    pub async fn submit(&self, order: OrderData) -> Result<Submission, FulfilmentError> {
        match self.strategy() {
            ExecutionStrategy::Pipeline => {
                let state = self.pipeline.process_order(order).await?;
                Ok(Submission::Completed(state))
            }
            ExecutionStrategy::Workflow => Ok(Submission::Started(self.engine.start(order))),
        }
    }

    /// Routes a substitution signal to the running workflow for its order.
    pub fn submit_substitution(
        &self,
        substitution: IngredientSubstitution,
    ) -> Result<(), WorkflowError> {
        self.engine.submit_substitution(substitution)
    }
}
