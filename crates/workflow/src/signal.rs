//! Single-slot handoff for ingredient substitution signals.

use std::sync::Mutex;

use fulfillment::IngredientSubstitution;
use tokio::sync::Notify;

/// Holds at most one pending substitution for a workflow instance.
///
/// Storing overwrites any pending value: if several signals arrive before
/// the workflow observes them, only the latest survives (last write wins;
/// this is a slot, not a queue). Safe against signal-before-await: `Notify`
/// keeps a permit when nobody is waiting yet.
#[derive(Debug, Default)]
pub struct SubstitutionSlot {
    pending: Mutex<Option<IngredientSubstitution>>,
    notify: Notify,
}

impl SubstitutionSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a substitution, replacing any pending one, and wakes the
    /// waiting workflow.
    pub fn store(&self, substitution: IngredientSubstitution) {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_some() {
            tracing::debug!(
                order_id = %substitution.order_id,
                "pending substitution overwritten (last write wins)"
            );
        }
        *pending = Some(substitution);
        drop(pending);
        self.notify.notify_one();
    }

    /// True if a substitution is waiting to be consumed.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    /// Suspends until a substitution is pending, then takes it, clearing
    /// the slot. Suspension is indefinite: there is no timeout.
    pub async fn recv(&self) -> IngredientSubstitution {
        loop {
            if let Some(substitution) = self.pending.lock().unwrap().take() {
                return substitution;
            }
            self.notify.notified().await;
        }
    }
}
