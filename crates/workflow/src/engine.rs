//! Engine managing running workflow instances and signal routing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::OrderId;
use fulfillment::{FulfilmentEnv, IngredientSubstitution, OrderData, OrderState};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::retry::RetryPolicy;
use crate::signal::SubstitutionSlot;
use crate::workflow::OrderWorkflow;

/// Spawns order workflows and routes substitution signals to them.
///
/// One instance per process; registered instances are keyed by order id
/// and deregistered when their workflow reaches a terminal state.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    env: FulfilmentEnv,
    retry: RetryPolicy,
    running: Arc<RwLock<HashMap<OrderId, Arc<SubstitutionSlot>>>>,
}

impl WorkflowEngine {
    /// Creates an engine with the default retry policy.
    pub fn new(env: FulfilmentEnv) -> Self {
        Self::with_retry(env, RetryPolicy::default())
    }

    /// Creates an engine with an explicit retry policy.
    pub fn with_retry(env: FulfilmentEnv, retry: RetryPolicy) -> Self {
        Self {
            env,
            retry,
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn env(&self) -> &FulfilmentEnv {
        &self.env
    }

    /// Starts a workflow for the order and returns immediately.
    ///
    /// The workflow gets exactly one attempt: a terminal failure never
    /// restarts the order from scratch. Progress is observable through the
    /// environment's event sink; the final outcome through the handle.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub fn start(&self, order: OrderData) -> WorkflowHandle {
        metrics::counter!("workflow_orders_total").increment(1);

        let order_id = order.order_id.clone();
        let run_id = Uuid::new_v4();
        let slot = Arc::new(SubstitutionSlot::new());
        self.running
            .write()
            .unwrap()
            .insert(order_id.clone(), slot.clone());

        let workflow = OrderWorkflow::new(order, self.env.clone(), slot, self.retry.clone());
        let running = self.running.clone();
        let task_order_id = order_id.clone();
        let join = tokio::spawn(async move {
            let started = std::time::Instant::now();
            let result = workflow.run().await;
            running.write().unwrap().remove(&task_order_id);
            metrics::histogram!("workflow_order_duration_seconds")
                .record(started.elapsed().as_secs_f64());
            match &result {
                Ok(_) => metrics::counter!("workflow_orders_completed").increment(1),
                Err(_) => metrics::counter!("workflow_orders_failed").increment(1),
            }
            result
        });

        tracing::info!(%run_id, "workflow started");
        WorkflowHandle {
            order_id,
            run_id,
            join,
        }
    }

    /// Routes a substitution signal to the running workflow for its order.
    ///
    /// Overwrites any substitution the workflow has not consumed yet.
    pub fn submit_substitution(
        &self,
        substitution: IngredientSubstitution,
    ) -> Result<(), WorkflowError> {
        let running = self.running.read().unwrap();
        let slot = running
            .get(&substitution.order_id)
            .ok_or_else(|| WorkflowError::UnknownOrder(substitution.order_id.clone()))?;
        tracing::info!(
            order_id = %substitution.order_id,
            original = %substitution.original_ingredient,
            substituted = %substitution.substituted_ingredient,
            "substitution signal routed"
        );
        slot.store(substitution);
        Ok(())
    }

    /// True while a workflow instance is running for the order.
    pub fn is_running(&self, order_id: &OrderId) -> bool {
        self.running.read().unwrap().contains_key(order_id)
    }
}

/// Handle to one running workflow instance.
#[derive(Debug)]
pub struct WorkflowHandle {
    order_id: OrderId,
    run_id: Uuid,
    join: JoinHandle<Result<OrderState, fulfillment::FulfilmentError>>,
}

impl WorkflowHandle {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Waits for the workflow's terminal state.
    pub async fn join(self) -> Result<OrderState, WorkflowError> {
        match self.join.await {
            Ok(result) => result.map_err(WorkflowError::from),
            Err(join_error) => Err(WorkflowError::Join(join_error.to_string())),
        }
    }
}
