//! Shared core of the sandwich fulfilment system.
//!
//! Both execution strategies (the synchronous pipeline and the durable
//! workflow) drive the same six stage handlers over the same mutable
//! [`OrderState`]. This crate holds that shared model:
//!
//! - the order value types and the per-order state aggregate,
//! - the six stage handlers plus the substitution and compensation logic,
//! - the chaos (fault-injection) configuration and the ingredient catalog,
//! - the event sink through which every state transition is observable.

pub mod catalog;
pub mod chaos;
pub mod env;
pub mod error;
pub mod events;
pub mod order;
pub mod stages;
pub mod state;

pub use catalog::IngredientCatalog;
pub use chaos::{ChaosConfig, FailureScenario, UnknownScenarioError};
pub use env::FulfilmentEnv;
pub use error::FulfilmentError;
pub use events::{
    EventSink, FulfilmentEvent, InMemoryEventSink, StatusUpdate, SubstitutionRequest,
    TracingEventSink,
};
pub use order::{IngredientSubstitution, OrderData, OrderSnapshot};
pub use stages::{StageOutcome, compensate_stage, run_stage, substitute_ingredients};
pub use state::{OrderState, Stage, StepStatus};
