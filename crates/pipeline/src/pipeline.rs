//! The in-process stage pipeline.

use fulfillment::{
    FulfilmentEnv, FulfilmentError, FulfilmentEvent, OrderData, OrderState, Stage, StageOutcome,
    run_stage,
};

/// Runs orders through all six stages on the caller's task.
#[derive(Debug, Clone)]
pub struct SandwichPipeline {
    env: FulfilmentEnv,
}

impl SandwichPipeline {
    /// Creates a pipeline over the given environment.
    pub fn new(env: FulfilmentEnv) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &FulfilmentEnv {
        &self.env
    }

    /// Processes one order to completion or first failure.
    ///
    /// A missing ingredient returns the stalled state as `Ok`: this strategy
    /// has no pause-and-resume, so the caller applies a substitution to the
    /// order out of band and re-invokes. Any stage error is recorded on the
    /// state and propagated.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn process_order(&self, order: OrderData) -> Result<OrderState, FulfilmentError> {
        metrics::counter!("pipeline_orders_total").increment(1);
        let started = std::time::Instant::now();

        let state = OrderState::new(order, self.env.sink.clone());
        self.env.sink.publish(FulfilmentEvent::status_changed(
            &state,
            "initialized",
            "initialized",
            Some("Order processing initialized"),
        ));

        let result = self.run_stages(state).await;
        metrics::histogram!("pipeline_order_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(state) if state.is_missing_ingredients() => {
                metrics::counter!("pipeline_orders_stalled").increment(1);
                tracing::warn!(
                    missing = ?state.missing_ingredients(),
                    "pipeline stalled awaiting substitution"
                );
            }
            Ok(_) => {
                metrics::counter!("pipeline_orders_completed").increment(1);
                tracing::info!("pipeline processing completed");
            }
            Err(error) => {
                metrics::counter!("pipeline_orders_failed").increment(1);
                tracing::error!(%error, "pipeline processing failed");
            }
        }

        result
    }

    async fn run_stages(&self, mut state: OrderState) -> Result<OrderState, FulfilmentError> {
        for stage in Stage::ALL {
            match run_stage(stage, &mut state, &self.env).await {
                Ok(StageOutcome::Completed) => {}
                Ok(StageOutcome::AwaitingSubstitution) => {
                    // Stalled, not failed. Downstream stages stay pending.
                    return Ok(state);
                }
                Err(error) => {
                    state.set_error(error.to_string());
                    return Err(error);
                }
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IngredientCategory;
    use fulfillment::{
        ChaosConfig, FailureScenario, IngredientCatalog, IngredientSubstitution, InMemoryEventSink,
        StepStatus, substitute_ingredients,
    };
    use std::sync::Arc;

    fn sample_order() -> OrderData {
        OrderData::new(
            "order-1",
            "sourdough",
            vec!["turkey".to_string(), "cheese".to_string()],
            vec!["mayo".to_string()],
        )
    }

    fn setup() -> (SandwichPipeline, Arc<InMemoryEventSink>) {
        let sink = Arc::new(InMemoryEventSink::new());
        let env = FulfilmentEnv::new(ChaosConfig::new(), IngredientCatalog::new(), sink.clone());
        (SandwichPipeline::new(env), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_completes_every_stage_in_order() {
        let (pipeline, sink) = setup();

        let state = pipeline.process_order(sample_order()).await.unwrap();

        assert!(state.is_completed());
        assert!(state.error().is_none());
        for stage in Stage::ALL {
            assert_eq!(state.step_status(stage), StepStatus::Completed);
        }

        // Stages complete in pipeline order.
        let completed: Vec<String> = sink
            .status_updates()
            .into_iter()
            .filter(|update| update.status == "completed" && update.step != "completed")
            .map(|update| update.step)
            .collect();
        assert_eq!(
            completed,
            [
                "preparing_ingredients",
                "toasting_bread",
                "assembling_sandwich",
                "packaging",
                "quality_check",
                "delivery",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_initialized_event_first() {
        let (pipeline, sink) = setup();
        pipeline.process_order(sample_order()).await.unwrap();

        let updates = sink.status_updates();
        assert_eq!(updates[0].step, "initialized");
        assert_eq!(updates[0].status, "initialized");
    }

    #[tokio::test(start_paused = true)]
    async fn equipment_failure_aborts_run_and_leaves_downstream_pending() {
        let (pipeline, _) = setup();
        pipeline
            .env()
            .chaos
            .set_scenario(FailureScenario::EquipmentFailure);

        let err = pipeline.process_order(sample_order()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Bread toasting failed - toaster equipment malfunction"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_stage_leaves_downstream_pending() {
        let (pipeline, sink) = setup();
        pipeline
            .env()
            .chaos
            .set_scenario(FailureScenario::EquipmentFailure);

        let _ = pipeline.process_order(sample_order()).await;

        // The error event carries the final statuses.
        let updates = sink.status_updates();
        let error_update = updates
            .iter()
            .find(|update| update.step == "error")
            .expect("error event published");
        assert_eq!(error_update.step_statuses["preparing_ingredients"], "completed");
        assert_eq!(error_update.step_statuses["toasting_bread"], "error");
        assert_eq!(error_update.step_statuses["assembling_sandwich"], "pending");
        assert_eq!(error_update.step_statuses["packaging"], "pending");
        assert_eq!(error_update.step_statuses["quality_check"], "pending");
        assert_eq!(error_update.step_statuses["delivery"], "pending");
    }

    #[tokio::test(start_paused = true)]
    async fn code_bug_fails_assembly_despite_normal_flag_path() {
        let (pipeline, _) = setup();
        pipeline.env().chaos.set_scenario(FailureScenario::CodeBug);

        let err = pipeline.process_order(sample_order()).await.unwrap_err();
        assert!(matches!(err, FulfilmentError::AssemblyDefect));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_ingredient_stalls_without_error() {
        let (pipeline, sink) = setup();
        pipeline
            .env()
            .catalog
            .set_availability("cheese", IngredientCategory::Fillings, false);

        let state = pipeline.process_order(sample_order()).await.unwrap();

        assert!(!state.is_completed());
        assert!(state.error().is_none());
        assert_eq!(state.missing_ingredients(), ["cheese"]);
        assert_eq!(state.step_status(Stage::ToastingBread), StepStatus::Pending);
        assert_eq!(sink.substitution_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reinvocation_after_out_of_band_substitution_completes() {
        let (pipeline, _) = setup();
        pipeline
            .env()
            .catalog
            .set_availability("cheese", IngredientCategory::Fillings, false);

        let mut state = pipeline.process_order(sample_order()).await.unwrap();
        assert!(state.is_missing_ingredients());

        substitute_ingredients(
            &mut state,
            &IngredientSubstitution {
                order_id: "order-1".into(),
                original_ingredient: "cheese".to_string(),
                substituted_ingredient: "avocado".to_string(),
                category: IngredientCategory::Fillings,
            },
        );

        let state = pipeline
            .process_order(state.order_data().clone())
            .await
            .unwrap();
        assert!(state.is_completed());
        assert_eq!(state.order_data().fillings, ["turkey", "avocado"]);
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_full_order_all_stages_completed() {
        let (pipeline, _) = setup();
        let state = pipeline.process_order(sample_order()).await.unwrap();

        let snapshot = state.snapshot();
        assert!(snapshot.is_completed);
        for stage in [
            "preparing_ingredients",
            "toasting_bread",
            "assembling_sandwich",
            "packaging",
            "quality_check",
            "delivery",
        ] {
            assert_eq!(snapshot.step_statuses[stage], "completed");
        }
    }
}
