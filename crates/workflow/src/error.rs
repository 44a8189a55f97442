//! Workflow error types.

use common::OrderId;
use fulfillment::FulfilmentError;
use thiserror::Error;

/// Errors surfaced by the durable strategy.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow failed terminally after exhausting retries and running
    /// compensation.
    #[error("order processing failed: {0}")]
    Fulfilment(#[from] FulfilmentError),

    /// A signal was routed to an order with no running workflow instance.
    #[error("no running workflow for order {0}")]
    UnknownOrder(OrderId),

    /// The workflow task itself failed (panicked or was cancelled).
    #[error("workflow task failed: {0}")]
    Join(String),
}
