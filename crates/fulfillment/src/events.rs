//! Observable events and the sink they are published through.
//!
//! Every order state transition is published as a [`FulfilmentEvent`] on a
//! per-order topic. The sink is the sole externally observable progress
//! feed; delivery to actual subscribers is a collaborator concern.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use common::{IngredientCategory, OrderId};
use serde::{Deserialize, Serialize};

use crate::order::OrderSnapshot;
use crate::state::OrderState;

/// Events published by the core during fulfilment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FulfilmentEvent {
    /// A stage (or the order as a whole) changed status.
    StatusChanged(StatusUpdate),

    /// Ingredient preparation found an unavailable ingredient and is
    /// waiting for an external substitution decision.
    SubstitutionRequested(SubstitutionRequest),
}

impl FulfilmentEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            FulfilmentEvent::StatusChanged(_) => "order-status-update",
            FulfilmentEvent::SubstitutionRequested(_) => "ingredient-substitution-request",
        }
    }

    /// Returns the per-order topic this event is published on.
    pub fn topic(&self) -> String {
        format!("order.{}", self.order_id())
    }

    /// Returns the order this event belongs to.
    pub fn order_id(&self) -> &OrderId {
        match self {
            FulfilmentEvent::StatusChanged(update) => &update.order_id,
            FulfilmentEvent::SubstitutionRequested(request) => &request.order_id,
        }
    }

    /// Builds a status-change event from the current order state.
    pub fn status_changed(
        state: &OrderState,
        step: &str,
        status: &str,
        message: Option<&str>,
    ) -> Self {
        FulfilmentEvent::StatusChanged(StatusUpdate {
            order_id: state.order_id().clone(),
            step: step.to_string(),
            status: status.to_string(),
            message: message.map(str::to_string),
            current_step: state.current_step().to_string(),
            step_statuses: stringify_statuses(state),
            is_completed: state.is_completed(),
            error: state.error().map(str::to_string),
            order: state.snapshot(),
            published_at: Utc::now(),
        })
    }

    /// Builds a substitution-request event from the current order state.
    pub fn substitution_requested(
        state: &OrderState,
        missing_ingredient: &str,
        category: IngredientCategory,
        available_substitutions: Vec<String>,
    ) -> Self {
        FulfilmentEvent::SubstitutionRequested(SubstitutionRequest {
            order_id: state.order_id().clone(),
            missing_ingredient: missing_ingredient.to_string(),
            category,
            available_substitutions,
            current_step: state.current_step().to_string(),
            step_statuses: stringify_statuses(state),
            order: state.snapshot(),
            published_at: Utc::now(),
        })
    }
}

fn stringify_statuses(state: &OrderState) -> BTreeMap<String, String> {
    state
        .step_statuses()
        .iter()
        .map(|(stage, status)| (stage.as_str().to_string(), status.as_str().to_string()))
        .collect()
}

/// Payload of a status-change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    /// Stage name, or the pseudo-steps `"error"` / `"completed"` /
    /// `"initialized"` for order-level transitions.
    pub step: String,
    pub status: String,
    pub message: Option<String>,
    pub current_step: String,
    pub step_statuses: BTreeMap<String, String>,
    pub is_completed: bool,
    pub error: Option<String>,
    pub order: OrderSnapshot,
    pub published_at: DateTime<Utc>,
}

/// Payload of a substitution-request event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionRequest {
    pub order_id: OrderId,
    pub missing_ingredient: String,
    pub category: IngredientCategory,
    pub available_substitutions: Vec<String>,
    pub current_step: String,
    pub step_statuses: BTreeMap<String, String>,
    pub order: OrderSnapshot,
    pub published_at: DateTime<Utc>,
}

/// Destination for fulfilment events.
///
/// Implementations must be cheap to call from the middle of stage handlers;
/// anything slow belongs behind a channel on the implementor's side.
pub trait EventSink: Send + Sync + std::fmt::Debug {
    fn publish(&self, event: FulfilmentEvent);
}

/// In-memory sink recording every published event, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<FulfilmentEvent>>>,
}

impl InMemoryEventSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events in publish order.
    pub fn events(&self) -> Vec<FulfilmentEvent> {
        self.events.read().unwrap().clone()
    }

    /// Returns all recorded status updates in publish order.
    pub fn status_updates(&self) -> Vec<StatusUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FulfilmentEvent::StatusChanged(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    /// Returns all recorded substitution requests in publish order.
    pub fn substitution_requests(&self) -> Vec<SubstitutionRequest> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                FulfilmentEvent::SubstitutionRequested(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Returns the statuses published for one step, in publish order.
    pub fn statuses_for_step(&self, step: &str) -> Vec<String> {
        self.status_updates()
            .into_iter()
            .filter(|update| update.step == step)
            .map(|update| update.status)
            .collect()
    }

    /// Returns the total number of recorded events.
    pub fn event_count(&self) -> usize {
        self.events.read().unwrap().len()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&self, event: FulfilmentEvent) {
        self.events.write().unwrap().push(event);
    }
}

/// Sink that logs every event through `tracing`, for wiring without a
/// real broadcast backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: FulfilmentEvent) {
        tracing::info!(
            topic = %event.topic(),
            event_type = event.event_type(),
            order_id = %event.order_id(),
            "fulfilment event published"
        );
    }
}
