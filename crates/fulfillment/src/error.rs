//! Fulfilment error types.

use thiserror::Error;

use crate::state::Stage;

/// Errors raised by stage handlers.
#[derive(Debug, Clone, Error)]
pub enum FulfilmentError {
    /// A chaos-injected stage failure (equipment, workers, materials).
    #[error("{reason}")]
    StageFailed { stage: Stage, reason: String },

    /// The forced assembly defect; always fatal, bypasses the chaos
    /// probability path.
    #[error("Division by zero in ingredient calculation logic")]
    AssemblyDefect,

    /// The delivery-specific failure class. Never retried automatically.
    #[error("{0}")]
    DeliveryFailed(String),

    /// An activity attempt exceeded its start-to-close timeout.
    #[error("activity for stage '{stage}' timed out")]
    ActivityTimeout { stage: Stage },
}

impl FulfilmentError {
    /// Whether the durable engine may automatically retry this failure.
    ///
    /// Only the delivery failure class is non-retryable; everything else
    /// (including timeouts) follows the default retry policy.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FulfilmentError::DeliveryFailed(_))
    }

    /// The stage this error originated from, if attributable.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FulfilmentError::StageFailed { stage, .. } => Some(*stage),
            FulfilmentError::AssemblyDefect => Some(Stage::AssemblingSandwich),
            FulfilmentError::DeliveryFailed(_) => Some(Stage::Delivery),
            FulfilmentError::ActivityTimeout { stage } => Some(*stage),
        }
    }
}

/// Convenience type alias for fulfilment results.
pub type Result<T> = std::result::Result<T, FulfilmentError>;
