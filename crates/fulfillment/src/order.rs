//! Order value types.

use common::{IngredientCategory, OrderId};
use serde::{Deserialize, Serialize};

/// The immutable contents of a sandwich order.
///
/// Never mutated in place: when a substitution is applied, the whole value
/// is rebuilt and replaces the previous one on the order state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderData {
    /// Caller-supplied order identifier.
    pub order_id: OrderId,
    /// The single bread of the sandwich.
    pub bread: String,
    /// Fillings in the order the customer listed them.
    pub fillings: Vec<String>,
    /// Condiments in the order the customer listed them.
    pub condiments: Vec<String>,
}

impl OrderData {
    /// Creates a new order.
    pub fn new(
        order_id: impl Into<OrderId>,
        bread: impl Into<String>,
        fillings: Vec<String>,
        condiments: Vec<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            bread: bread.into(),
            fillings,
            condiments,
        }
    }

    /// Returns the ingredients of the given category, bread as a one-element slice.
    pub fn ingredients(&self, category: IngredientCategory) -> Vec<&str> {
        match category {
            IngredientCategory::Bread => vec![self.bread.as_str()],
            IngredientCategory::Fillings => self.fillings.iter().map(String::as_str).collect(),
            IngredientCategory::Condiments => self.condiments.iter().map(String::as_str).collect(),
        }
    }
}

/// Payload of an ingredient substitution signal.
///
/// Delivered asynchronously into a running workflow instance (or applied
/// out-of-band before re-invoking the synchronous pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSubstitution {
    pub order_id: OrderId,
    pub original_ingredient: String,
    pub substituted_ingredient: String,
    pub category: IngredientCategory,
}

/// A single entry of the append-only substitution audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub original: String,
    pub substituted: String,
    pub category: IngredientCategory,
}

/// Serializable point-in-time projection of an order state.
///
/// Embedded in every published event so observers never need to reach back
/// into the executing strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub current_step: String,
    pub step_statuses: std::collections::BTreeMap<String, String>,
    pub error: Option<String>,
    pub is_completed: bool,
    pub ingredient_substitutions: Vec<SubstitutionRecord>,
    pub bread: String,
    pub fillings: Vec<String>,
    pub condiments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> OrderData {
        OrderData::new(
            "order-1",
            "sourdough",
            vec!["turkey".to_string(), "cheese".to_string()],
            vec!["mayo".to_string()],
        )
    }

    #[test]
    fn ingredients_by_category() {
        let order = sample_order();
        assert_eq!(order.ingredients(IngredientCategory::Bread), ["sourdough"]);
        assert_eq!(
            order.ingredients(IngredientCategory::Fillings),
            ["turkey", "cheese"]
        );
        assert_eq!(order.ingredients(IngredientCategory::Condiments), ["mayo"]);
    }

    #[test]
    fn serialization_roundtrip() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: OrderData = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }

    #[test]
    fn substitution_payload_roundtrip() {
        let sub = IngredientSubstitution {
            order_id: "order-1".into(),
            original_ingredient: "white".to_string(),
            substituted_ingredient: "wheat".to_string(),
            category: IngredientCategory::Bread,
        };
        let json = serde_json::to_string(&sub).unwrap();
        let deserialized: IngredientSubstitution = serde_json::from_str(&json).unwrap();
        assert_eq!(sub, deserialized);
    }
}
