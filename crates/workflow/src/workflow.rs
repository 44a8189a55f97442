//! The order fulfilment workflow: substitution loop, forward path, saga
//! compensation on terminal failure.

use std::sync::Arc;

use async_trait::async_trait;
use fulfillment::{
    FulfilmentEnv, FulfilmentError, OrderData, OrderState, Stage, StageOutcome, compensate_stage,
    substitute_ingredients,
};

use crate::retry::{RetryPolicy, run_activity};
use crate::saga::{Compensator, Saga};
use crate::signal::SubstitutionSlot;

/// Forward stages after ingredient preparation, in issue order.
const FORWARD_STAGES: [Stage; 5] = [
    Stage::ToastingBread,
    Stage::AssemblingSandwich,
    Stage::Packaging,
    Stage::QualityCheck,
    Stage::Delivery,
];

/// One durable fulfilment run for one order.
///
/// Logically single-threaded: the workflow suspends at every activity
/// invocation and at the substitution await point, and nothing else ever
/// touches its [`OrderState`]. The workflow itself is never restarted; a
/// terminal failure compensates and propagates.
pub struct OrderWorkflow {
    state: OrderState,
    env: FulfilmentEnv,
    slot: Arc<SubstitutionSlot>,
    retry: RetryPolicy,
}

impl OrderWorkflow {
    /// Creates a workflow for a freshly submitted order.
    pub fn new(
        order: OrderData,
        env: FulfilmentEnv,
        slot: Arc<SubstitutionSlot>,
        retry: RetryPolicy,
    ) -> Self {
        let state = OrderState::new(order, env.sink.clone());
        Self {
            state,
            env,
            slot,
            retry,
        }
    }

    /// Runs the workflow to its terminal state.
    #[tracing::instrument(skip(self), fields(order_id = %self.state.order_id()))]
    pub async fn run(mut self) -> Result<OrderState, FulfilmentError> {
        let mut saga = Saga::new();

        match self.forward(&mut saga).await {
            Ok(()) => {
                tracing::info!("order processing completed successfully");
                Ok(self.state)
            }
            Err(error) => {
                tracing::error!(%error, "order processing failed, compensating");
                self.state.set_error("Order processing failed terminally :(");

                // The failing stage never completed; compensation covers
                // only the stages before it.
                if let Some(stage) = error.stage() {
                    saga.discard(stage);
                }

                let mut compensator = StageCompensator {
                    state: &mut self.state,
                    env: &self.env,
                };
                let outcomes = saga.compensate(&mut compensator).await;
                tracing::info!(
                    compensated = outcomes.len(),
                    failed = outcomes.iter().filter(|o| o.result.is_err()).count(),
                    "saga compensation finished"
                );

                Err(error)
            }
        }
    }

    async fn forward(&mut self, saga: &mut Saga) -> Result<(), FulfilmentError> {
        // Ingredient preparation loops until nothing is missing, suspending
        // for an external substitution signal between attempts.
        loop {
            saga.register(Stage::PreparingIngredients);
            let outcome = run_activity(
                Stage::PreparingIngredients,
                &mut self.state,
                &self.env,
                &self.retry,
            )
            .await?;

            match outcome {
                StageOutcome::Completed => break,
                StageOutcome::AwaitingSubstitution => {
                    tracing::info!(
                        missing = ?self.state.missing_ingredients(),
                        "suspended awaiting ingredient substitution"
                    );
                    let substitution = self.slot.recv().await;
                    substitute_ingredients(&mut self.state, &substitution);
                }
            }
        }

        for stage in FORWARD_STAGES {
            saga.register(stage);
            run_activity(stage, &mut self.state, &self.env, &self.retry).await?;
        }

        Ok(())
    }
}

/// Production compensator: drives the shared per-stage compensation
/// handler against the workflow's own state.
struct StageCompensator<'a> {
    state: &'a mut OrderState,
    env: &'a FulfilmentEnv,
}

#[async_trait]
impl Compensator for StageCompensator<'_> {
    async fn compensate(&mut self, stage: Stage) -> Result<(), FulfilmentError> {
        compensate_stage(stage, self.state, self.env).await
    }
}
