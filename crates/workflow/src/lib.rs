//! Durable execution strategy for sandwich fulfilment.
//!
//! The same six stage handlers as the synchronous pipeline, exposed as
//! independently retryable activities and wrapped in a saga: one
//! compensating action per completed stage, run in reverse on terminal
//! failure, continuing even when a compensation fails. Ahead of the first
//! stage sits an asynchronous substitution loop that can suspend the
//! workflow indefinitely until an external actor signals a substitution.

pub mod engine;
pub mod error;
pub mod retry;
pub mod saga;
pub mod signal;
pub mod workflow;

pub use engine::{WorkflowEngine, WorkflowHandle};
pub use error::WorkflowError;
pub use retry::{RetryPolicy, START_TO_CLOSE_TIMEOUT};
pub use saga::{CompensationOutcome, Compensator, Saga};
pub use signal::SubstitutionSlot;
pub use workflow::OrderWorkflow;
