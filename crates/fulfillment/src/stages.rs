//! The six stage handlers shared by both execution strategies.
//!
//! The synchronous pipeline calls [`run_stage`] directly; the durable
//! workflow wraps the same function as a schedulable activity. Neither
//! strategy carries its own copy of stage logic.

use common::IngredientCategory;

use crate::env::FulfilmentEnv;
use crate::error::{FulfilmentError, Result};
use crate::events::FulfilmentEvent;
use crate::order::{IngredientSubstitution, OrderData, SubstitutionRecord};
use crate::state::{OrderState, Stage, StepStatus};

/// How a forward stage invocation ended without erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage ran to completion.
    Completed,

    /// Ingredient preparation found a missing ingredient and paused the
    /// order; not an error. Only `preparing_ingredients` produces this.
    AwaitingSubstitution,
}

fn start_message(stage: Stage) -> &'static str {
    match stage {
        Stage::PreparingIngredients => "Checking ingredient availability...",
        Stage::ToastingBread => "Starting Bread Toasting...",
        Stage::AssemblingSandwich => "Starting Sandwich Assembly...",
        Stage::Packaging => "Starting Sandwich Packaging...",
        Stage::QualityCheck => "Starting Quality Check...",
        Stage::Delivery => "Starting Order Delivery...",
    }
}

fn success_message(stage: Stage) -> &'static str {
    match stage {
        Stage::PreparingIngredients => {
            "All ingredients have been prepared and are ready for assembly"
        }
        Stage::ToastingBread => "The bread has been perfectly toasted and is ready for assembly",
        Stage::AssemblingSandwich => {
            "The sandwich has been expertly assembled with all requested ingredients"
        }
        Stage::Packaging => "The sandwich has been properly packaged and is ready for quality check",
        Stage::QualityCheck => {
            "The sandwich has passed all quality standards and is ready for delivery"
        }
        Stage::Delivery => "Your delicious sandwich has been successfully delivered!",
    }
}

fn failure_message(stage: Stage) -> &'static str {
    match stage {
        Stage::PreparingIngredients => {
            "Ingredient preparation failed - some ingredients are unavailable"
        }
        Stage::ToastingBread => "Bread toasting failed - toaster equipment malfunction",
        Stage::AssemblingSandwich => "Sandwich assembly failed - no workers available",
        Stage::Packaging => "Packaging failed - no packaging materials available",
        Stage::QualityCheck => "Quality check failed - sandwich does not meet standards",
        Stage::Delivery => "Delivery failed - network connectivity issues",
    }
}

fn compensation_pending_message(stage: Stage) -> &'static str {
    match stage {
        Stage::PreparingIngredients => "Preparing to compensate ingredient preparation...",
        Stage::ToastingBread => "Preparing to compensate bread toasting...",
        Stage::AssemblingSandwich => "Preparing to compensate sandwich assembly...",
        Stage::Packaging => "Preparing to compensate sandwich packaging...",
        Stage::QualityCheck => "Preparing to compensate quality check...",
        Stage::Delivery => "Preparing to compensate order delivery...",
    }
}

fn compensated_message(stage: Stage) -> &'static str {
    match stage {
        Stage::PreparingIngredients => "Ingredient preparation was compensated",
        Stage::ToastingBread => "Bread toasting was compensated",
        Stage::AssemblingSandwich => "Sandwich assembly was compensated",
        Stage::Packaging => "Sandwich packaging was compensated",
        Stage::QualityCheck => "Quality check was compensated",
        Stage::Delivery => "Order delivery was compensated",
    }
}

fn failure_error(stage: Stage) -> FulfilmentError {
    let reason = failure_message(stage).to_string();
    if stage == Stage::Delivery {
        FulfilmentError::DeliveryFailed(reason)
    } else {
        FulfilmentError::StageFailed { stage, reason }
    }
}

/// Runs one forward stage against the order state.
///
/// Marks the stage in progress, honors the configured chaos delay, then
/// either fails with the stage-specific error or completes. The delivery
/// stage also marks the whole order completed.
#[tracing::instrument(skip(state, env), fields(order_id = %state.order_id()))]
pub async fn run_stage(
    stage: Stage,
    state: &mut OrderState,
    env: &FulfilmentEnv,
) -> Result<StageOutcome> {
    if stage == Stage::PreparingIngredients {
        return prepare_ingredients(state, env).await;
    }

    state.set_current_step(stage);
    state.set_step_status(stage, StepStatus::InProgress, Some(start_message(stage)));

    tokio::time::sleep(env.chaos.delay_for(stage)).await;

    // The forced-defect scenario bypasses the normal failure path entirely.
    if stage == Stage::AssemblingSandwich
        && env.chaos.scenario() == crate::chaos::FailureScenario::CodeBug
    {
        tracing::error!(order_id = %state.order_id(), "assembly defect triggered");
        state.set_step_status(
            stage,
            StepStatus::Error,
            Some("Critical bug detected - division by zero in ingredient calculation"),
        );
        return Err(FulfilmentError::AssemblyDefect);
    }

    if env.chaos.should_fail(stage) {
        tracing::error!(order_id = %state.order_id(), stage = %stage, "stage failure injected");
        state.set_step_status(stage, StepStatus::Error, Some(failure_message(stage)));
        return Err(failure_error(stage));
    }

    state.set_current_step(stage);
    state.set_step_status(stage, StepStatus::Completed, Some(success_message(stage)));

    if stage == Stage::Delivery {
        state.set_completed(true);
    }

    Ok(StageOutcome::Completed)
}

/// Ingredient preparation: availability scan first, then the normal
/// delay/failure/completion flow.
async fn prepare_ingredients(state: &mut OrderState, env: &FulfilmentEnv) -> Result<StageOutcome> {
    let stage = Stage::PreparingIngredients;

    state.set_missing_ingredients(Vec::new());
    state.set_current_step(stage);
    state.set_step_status(stage, StepStatus::InProgress, Some(start_message(stage)));

    if let Some((missing, category)) = find_first_missing(state, env) {
        tracing::warn!(
            order_id = %state.order_id(),
            ingredient = %missing,
            category = %category,
            "missing ingredient, awaiting substitution"
        );
        state.set_step_status(
            stage,
            StepStatus::Error,
            Some("Waiting for ingredient substitutions..."),
        );
        state.set_missing_ingredients(vec![missing]);
        return Ok(StageOutcome::AwaitingSubstitution);
    }

    tokio::time::sleep(env.chaos.delay_for(stage)).await;

    if env.chaos.should_fail(stage) {
        state.set_step_status(stage, StepStatus::Error, Some(failure_message(stage)));
        return Err(failure_error(stage));
    }

    state.set_current_step(stage);
    state.set_step_status(stage, StepStatus::Completed, Some(success_message(stage)));
    Ok(StageOutcome::Completed)
}

/// Scans bread, then fillings, then condiments; the first unavailable
/// ingredient publishes one substitution request and stops the scan.
fn find_first_missing(
    state: &OrderState,
    env: &FulfilmentEnv,
) -> Option<(String, IngredientCategory)> {
    for category in IngredientCategory::ALL {
        for ingredient in state.order_data().ingredients(category) {
            if !env.catalog.is_available(ingredient, category) {
                let candidates = env.catalog.substitutions_for(ingredient, category);
                env.sink.publish(FulfilmentEvent::substitution_requested(
                    state, ingredient, category, candidates,
                ));
                return Some((ingredient.to_string(), category));
            }
        }
    }
    None
}

/// Applies a substitution: replaces every value-matching entry of the
/// relevant category, rebuilds the order data wholesale, and appends to
/// the audit trail.
#[tracing::instrument(skip(state), fields(order_id = %state.order_id()))]
pub fn substitute_ingredients(state: &mut OrderState, substitution: &IngredientSubstitution) {
    let data = state.order_data();
    let replace = |value: &String| -> String {
        if value == &substitution.original_ingredient {
            substitution.substituted_ingredient.clone()
        } else {
            value.clone()
        }
    };

    let bread = match substitution.category {
        IngredientCategory::Bread => replace(&data.bread),
        _ => data.bread.clone(),
    };
    let fillings = match substitution.category {
        IngredientCategory::Fillings => data.fillings.iter().map(replace).collect(),
        _ => data.fillings.clone(),
    };
    let condiments = match substitution.category {
        IngredientCategory::Condiments => data.condiments.iter().map(replace).collect(),
        _ => data.condiments.clone(),
    };

    let order_id = data.order_id.clone();
    state.set_order_data(OrderData {
        order_id,
        bread,
        fillings,
        condiments,
    });
    state.add_substitution(SubstitutionRecord {
        original: substitution.original_ingredient.clone(),
        substituted: substitution.substituted_ingredient.clone(),
        category: substitution.category,
    });

    tracing::info!(
        original = %substitution.original_ingredient,
        substituted = %substitution.substituted_ingredient,
        category = %substitution.category,
        "ingredient substitution applied"
    );
}

/// Runs the compensating action for one completed stage.
///
/// Compensations are advisory in this domain: the contract is the pair of
/// observable transitions, `compensation_pending` then `compensated`.
#[tracing::instrument(skip(state, env), fields(order_id = %state.order_id()))]
pub async fn compensate_stage(
    stage: Stage,
    state: &mut OrderState,
    env: &FulfilmentEnv,
) -> Result<()> {
    state.set_compensation_pending(stage, Some(compensation_pending_message(stage)));

    tokio::time::sleep(env.chaos.delay_for(stage)).await;

    state.set_step_status(
        stage,
        StepStatus::Compensated,
        Some(compensated_message(stage)),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IngredientCatalog;
    use crate::chaos::{ChaosConfig, FailureScenario};
    use crate::events::InMemoryEventSink;
    use std::sync::Arc;

    fn sample_order() -> OrderData {
        OrderData::new(
            "order-1",
            "sourdough",
            vec!["turkey".to_string(), "cheese".to_string()],
            vec!["mayo".to_string()],
        )
    }

    fn setup() -> (OrderState, FulfilmentEnv, Arc<InMemoryEventSink>) {
        let sink = Arc::new(InMemoryEventSink::new());
        let env = FulfilmentEnv::new(
            ChaosConfig::new(),
            IngredientCatalog::new(),
            sink.clone(),
        );
        let state = OrderState::new(sample_order(), sink.clone());
        (state, env, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn stage_completes_with_start_and_success_events() {
        let (mut state, env, sink) = setup();

        let outcome = run_stage(Stage::ToastingBread, &mut state, &env)
            .await
            .unwrap();

        assert_eq!(outcome, StageOutcome::Completed);
        assert_eq!(state.step_status(Stage::ToastingBread), StepStatus::Completed);
        assert_eq!(state.current_step(), "toasting_bread");
        assert_eq!(
            sink.statuses_for_step("toasting_bread"),
            ["in_progress", "completed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_marks_order_completed() {
        let (mut state, env, sink) = setup();

        run_stage(Stage::Delivery, &mut state, &env).await.unwrap();

        assert!(state.is_completed());
        let updates = sink.status_updates();
        assert_eq!(updates.last().unwrap().step, "completed");
    }

    #[tokio::test(start_paused = true)]
    async fn equipment_failure_fails_toasting() {
        let (mut state, env, _) = setup();
        env.chaos.set_scenario(FailureScenario::EquipmentFailure);

        let err = run_stage(Stage::ToastingBread, &mut state, &env)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Bread toasting failed - toaster equipment malfunction"
        );
        assert!(err.is_retryable());
        assert_eq!(state.step_status(Stage::ToastingBread), StepStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failure_is_non_retryable() {
        let (mut state, env, _) = setup();
        env.chaos.set_scenario(FailureScenario::DeliveryFailure);

        let err = run_stage(Stage::Delivery, &mut state, &env).await.unwrap_err();

        assert!(matches!(err, FulfilmentError::DeliveryFailed(_)));
        assert!(!err.is_retryable());
        assert!(!state.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn code_bug_raises_defect_in_assembly() {
        let (mut state, env, sink) = setup();
        env.chaos.set_scenario(FailureScenario::CodeBug);

        let err = run_stage(Stage::AssemblingSandwich, &mut state, &env)
            .await
            .unwrap_err();

        assert!(matches!(err, FulfilmentError::AssemblyDefect));
        assert_eq!(state.step_status(Stage::AssemblingSandwich), StepStatus::Error);
        let updates = sink.statuses_for_step("assembling_sandwich");
        assert_eq!(updates, ["in_progress", "error"]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_bread_pauses_preparation() {
        let (mut state, env, sink) = setup();
        env.catalog
            .set_availability("sourdough", IngredientCategory::Bread, false);

        let outcome = run_stage(Stage::PreparingIngredients, &mut state, &env)
            .await
            .unwrap();

        assert_eq!(outcome, StageOutcome::AwaitingSubstitution);
        assert_eq!(state.missing_ingredients(), ["sourdough"]);
        assert_eq!(
            state.step_status(Stage::PreparingIngredients),
            StepStatus::Error
        );

        let requests = sink.substitution_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].missing_ingredient, "sourdough");
        assert_eq!(requests[0].category, IngredientCategory::Bread);
        assert!(!requests[0].available_substitutions.contains(&"sourdough".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn first_missing_ingredient_wins() {
        let (mut state, env, sink) = setup();
        env.catalog
            .set_availability("turkey", IngredientCategory::Fillings, false);
        env.catalog
            .set_availability("mayo", IngredientCategory::Condiments, false);

        let outcome = run_stage(Stage::PreparingIngredients, &mut state, &env)
            .await
            .unwrap();

        assert_eq!(outcome, StageOutcome::AwaitingSubstitution);
        assert_eq!(state.missing_ingredients(), ["turkey"]);
        assert_eq!(sink.substitution_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn preparation_clears_stale_missing_list() {
        let (mut state, env, _) = setup();
        state.set_missing_ingredients(vec!["white".to_string()]);

        let outcome = run_stage(Stage::PreparingIngredients, &mut state, &env)
            .await
            .unwrap();

        assert_eq!(outcome, StageOutcome::Completed);
        assert!(!state.is_missing_ingredients());
    }

    #[test]
    fn substitution_replaces_matching_fillings_only() {
        let (mut state, _, _) = setup();
        substitute_ingredients(
            &mut state,
            &IngredientSubstitution {
                order_id: "order-1".into(),
                original_ingredient: "turkey".to_string(),
                substituted_ingredient: "ham".to_string(),
                category: IngredientCategory::Fillings,
            },
        );

        assert_eq!(state.order_data().fillings, ["ham", "cheese"]);
        assert_eq!(state.order_data().bread, "sourdough");
        assert_eq!(state.substitutions().len(), 1);
        assert_eq!(state.substitutions()[0].original, "turkey");
        assert_eq!(state.substitutions()[0].substituted, "ham");
    }

    #[test]
    fn substitution_replaces_bread_on_value_match() {
        let (mut state, _, _) = setup();
        substitute_ingredients(
            &mut state,
            &IngredientSubstitution {
                order_id: "order-1".into(),
                original_ingredient: "sourdough".to_string(),
                substituted_ingredient: "wheat".to_string(),
                category: IngredientCategory::Bread,
            },
        );
        assert_eq!(state.order_data().bread, "wheat");

        // A non-matching original leaves the bread untouched.
        substitute_ingredients(
            &mut state,
            &IngredientSubstitution {
                order_id: "order-1".into(),
                original_ingredient: "rye".to_string(),
                substituted_ingredient: "white".to_string(),
                category: IngredientCategory::Bread,
            },
        );
        assert_eq!(state.order_data().bread, "wheat");
    }

    #[tokio::test(start_paused = true)]
    async fn compensation_transitions_pending_then_compensated() {
        let (mut state, env, sink) = setup();
        state.set_step_status(Stage::Packaging, StepStatus::Completed, None);
        sink.clear();

        compensate_stage(Stage::Packaging, &mut state, &env)
            .await
            .unwrap();

        assert_eq!(state.step_status(Stage::Packaging), StepStatus::Compensated);
        assert_eq!(
            sink.statuses_for_step("packaging"),
            ["compensation_pending", "compensated"]
        );
    }
}
