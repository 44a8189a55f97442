//! Compensation ledger with a continue-on-error runner.

use async_trait::async_trait;
use fulfillment::{FulfilmentError, Stage};

/// Runs the compensating action for one stage.
///
/// Seam between the saga ledger and the stage handlers, so tests can
/// substitute compensators that fail on demand.
#[async_trait]
pub trait Compensator: Send {
    async fn compensate(&mut self, stage: Stage) -> Result<(), FulfilmentError>;
}

/// Result of one compensation attempt.
#[derive(Debug)]
pub struct CompensationOutcome {
    pub stage: Stage,
    pub result: Result<(), FulfilmentError>,
}

/// Ordered ledger of stages whose forward activity has been issued.
///
/// A stage is registered immediately before its forward activity is
/// invoked; if that activity fails terminally the caller discards the
/// registration, so compensation covers exactly the completed stages.
/// Compensation always continues past individual failures.
#[derive(Debug, Default)]
pub struct Saga {
    registered: Vec<Stage>,
}

impl Saga {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage for compensation. Duplicate registrations (the
    /// ingredient preparation loop re-enters) are ignored.
    pub fn register(&mut self, stage: Stage) {
        if !self.registered.contains(&stage) {
            self.registered.push(stage);
        }
    }

    /// Drops a stage whose forward activity failed before completing.
    pub fn discard(&mut self, stage: Stage) {
        self.registered.retain(|registered| *registered != stage);
    }

    /// Stages currently registered, in registration order.
    pub fn registered(&self) -> &[Stage] {
        &self.registered
    }

    /// Compensates every registered stage in reverse registration order.
    ///
    /// A failing compensation is recorded and the chain continues; the
    /// returned outcomes preserve execution order.
    pub async fn compensate<C: Compensator>(&self, compensator: &mut C) -> Vec<CompensationOutcome> {
        let mut outcomes = Vec::with_capacity(self.registered.len());
        for stage in self.registered.iter().rev() {
            let result = compensator.compensate(*stage).await;
            if let Err(error) = &result {
                tracing::warn!(stage = %stage, %error, "compensation step failed, continuing");
            }
            outcomes.push(CompensationOutcome {
                stage: *stage,
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingCompensator {
        compensated: Vec<Stage>,
        fail_on: Option<Stage>,
    }

    #[async_trait]
    impl Compensator for RecordingCompensator {
        async fn compensate(&mut self, stage: Stage) -> Result<(), FulfilmentError> {
            self.compensated.push(stage);
            if self.fail_on == Some(stage) {
                return Err(FulfilmentError::StageFailed {
                    stage,
                    reason: "compensation backend unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn compensates_in_reverse_registration_order() {
        let mut saga = Saga::new();
        saga.register(Stage::PreparingIngredients);
        saga.register(Stage::ToastingBread);
        saga.register(Stage::AssemblingSandwich);

        let mut compensator = RecordingCompensator {
            compensated: Vec::new(),
            fail_on: None,
        };
        let outcomes = saga.compensate(&mut compensator).await;

        assert_eq!(
            compensator.compensated,
            [
                Stage::AssemblingSandwich,
                Stage::ToastingBread,
                Stage::PreparingIngredients,
            ]
        );
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
    }

    #[tokio::test]
    async fn continues_past_failing_compensation() {
        let mut saga = Saga::new();
        saga.register(Stage::PreparingIngredients);
        saga.register(Stage::ToastingBread);
        saga.register(Stage::Packaging);

        let mut compensator = RecordingCompensator {
            compensated: Vec::new(),
            fail_on: Some(Stage::ToastingBread),
        };
        let outcomes = saga.compensate(&mut compensator).await;

        // All three ran despite the middle one failing.
        assert_eq!(compensator.compensated.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(outcomes[2].result.is_ok());
        assert_eq!(outcomes[2].stage, Stage::PreparingIngredients);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut saga = Saga::new();
        saga.register(Stage::PreparingIngredients);
        saga.register(Stage::PreparingIngredients);
        saga.register(Stage::PreparingIngredients);
        assert_eq!(saga.registered(), [Stage::PreparingIngredients]);
    }

    #[test]
    fn discard_removes_failed_stage() {
        let mut saga = Saga::new();
        saga.register(Stage::PreparingIngredients);
        saga.register(Stage::ToastingBread);
        saga.discard(Stage::ToastingBread);
        assert_eq!(saga.registered(), [Stage::PreparingIngredients]);
    }

    #[tokio::test]
    async fn empty_ledger_compensates_nothing() {
        let saga = Saga::new();
        let mut compensator = RecordingCompensator {
            compensated: Vec::new(),
            fail_on: None,
        };
        let outcomes = saga.compensate(&mut compensator).await;
        assert!(outcomes.is_empty());
        assert!(compensator.compensated.is_empty());
    }
}
