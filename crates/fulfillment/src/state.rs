//! Order state machine: stages, statuses, and the per-order aggregate.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::events::{EventSink, FulfilmentEvent};
use crate::order::{OrderData, OrderSnapshot, SubstitutionRecord};

/// The six fixed fulfilment stages, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreparingIngredients,
    ToastingBread,
    AssemblingSandwich,
    Packaging,
    QualityCheck,
    Delivery,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::PreparingIngredients,
        Stage::ToastingBread,
        Stage::AssemblingSandwich,
        Stage::Packaging,
        Stage::QualityCheck,
        Stage::Delivery,
    ];

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreparingIngredients => "preparing_ingredients",
            Stage::ToastingBread => "toasting_bread",
            Stage::AssemblingSandwich => "assembling_sandwich",
            Stage::Packaging => "packaging",
            Stage::QualityCheck => "quality_check",
            Stage::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single stage within one order.
///
/// Within one forward pass a stage moves `Pending → InProgress →
/// {Completed, Error}`; `preparing_ingredients` may cycle back from `Error`
/// to `InProgress` while ingredients are missing. Compensation moves a
/// completed stage through `CompensationPending → Compensated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Either a terminal stage failure or, for `preparing_ingredients` with
    /// missing ingredients recorded, a pause awaiting substitution.
    Error,
    CompensationPending,
    Compensated,
}

impl StepStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
            StepStatus::CompensationPending => "compensation_pending",
            StepStatus::Compensated => "compensated",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable aggregate tracking one order through fulfilment.
///
/// Owned exclusively by the executing strategy for the lifetime of the order;
/// no two stages ever touch it concurrently. Every status transition is
/// published through the injected [`EventSink`], so there are no silent
/// state changes. All operations are total: none of them can fail.
#[derive(Debug, Clone)]
pub struct OrderState {
    order_data: OrderData,
    current_step: String,
    step_statuses: BTreeMap<Stage, StepStatus>,
    error: Option<String>,
    is_completed: bool,
    missing_ingredients: Vec<String>,
    substitutions: Vec<SubstitutionRecord>,
    sink: Arc<dyn EventSink>,
}

impl OrderState {
    /// Creates the state for a freshly submitted order, all stages pending.
    pub fn new(order_data: OrderData, sink: Arc<dyn EventSink>) -> Self {
        let step_statuses = Stage::ALL
            .iter()
            .map(|stage| (*stage, StepStatus::Pending))
            .collect();
        Self {
            order_data,
            current_step: "pending".to_string(),
            step_statuses,
            error: None,
            is_completed: false,
            missing_ingredients: Vec::new(),
            substitutions: Vec::new(),
            sink,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_data.order_id
    }

    pub fn order_data(&self) -> &OrderData {
        &self.order_data
    }

    /// Replaces the order data wholesale (substitution applied).
    pub fn set_order_data(&mut self, order_data: OrderData) {
        self.order_data = order_data;
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn set_current_step(&mut self, stage: Stage) {
        self.current_step = stage.as_str().to_string();
    }

    pub fn step_status(&self, stage: Stage) -> StepStatus {
        self.step_statuses.get(&stage).copied().unwrap_or_default()
    }

    pub fn step_statuses(&self) -> &BTreeMap<Stage, StepStatus> {
        &self.step_statuses
    }

    /// Sets a stage status and publishes the transition.
    ///
    /// Re-applying the same status is allowed and publishes again: observers
    /// see one event per call, not per distinct value.
    pub fn set_step_status(&mut self, stage: Stage, status: StepStatus, message: Option<&str>) {
        self.step_statuses.insert(stage, status);

        tracing::info!(
            order_id = %self.order_data.order_id,
            stage = %stage,
            status = %status,
            message,
            "order step status updated"
        );

        self.publish_status(stage.as_str(), status.as_str(), message);
    }

    /// Marks a stage as pending compensation.
    pub fn set_compensation_pending(&mut self, stage: Stage, message: Option<&str>) {
        self.set_step_status(
            stage,
            StepStatus::CompensationPending,
            Some(message.unwrap_or("Compensation pending...")),
        );
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Records the order-level error and publishes it on the order topic.
    pub fn set_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.error = Some(error.clone());
        self.publish_status("error", "error", Some(&error));
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Marks the order completed; publishes a completion event when set true.
    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
        if completed {
            self.publish_status(
                "completed",
                "completed",
                Some("Order processing completed successfully"),
            );
        }
    }

    pub fn missing_ingredients(&self) -> &[String] {
        &self.missing_ingredients
    }

    pub fn set_missing_ingredients(&mut self, missing: Vec<String>) {
        self.missing_ingredients = missing;
    }

    /// True while the order is paused awaiting an ingredient substitution.
    pub fn is_missing_ingredients(&self) -> bool {
        !self.missing_ingredients.is_empty()
    }

    /// Appends to the substitution audit trail.
    pub fn add_substitution(&mut self, record: SubstitutionRecord) {
        self.substitutions.push(record);
    }

    pub fn substitutions(&self) -> &[SubstitutionRecord] {
        &self.substitutions
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Builds a serializable snapshot for event payloads.
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.order_data.order_id.clone(),
            current_step: self.current_step.clone(),
            step_statuses: self
                .step_statuses
                .iter()
                .map(|(stage, status)| (stage.as_str().to_string(), status.as_str().to_string()))
                .collect(),
            error: self.error.clone(),
            is_completed: self.is_completed,
            ingredient_substitutions: self.substitutions.clone(),
            bread: self.order_data.bread.clone(),
            fillings: self.order_data.fillings.clone(),
            condiments: self.order_data.condiments.clone(),
        }
    }

    fn publish_status(&self, step: &str, status: &str, message: Option<&str>) {
        self.sink
            .publish(FulfilmentEvent::status_changed(self, step, status, message));
    }
}
