use serde::{Deserialize, Serialize};

/// Unique identifier for a sandwich order.
///
/// Wraps the caller-supplied order id string to provide type safety and
/// prevent mixing up order ids with other string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates an order id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The three ingredient categories an order is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    /// The single bread of the sandwich.
    Bread,
    /// Fillings layered between the bread.
    Fillings,
    /// Condiments spread on top.
    Condiments,
}

impl IngredientCategory {
    /// All categories in order-form order.
    pub const ALL: [IngredientCategory; 3] = [
        IngredientCategory::Bread,
        IngredientCategory::Fillings,
        IngredientCategory::Condiments,
    ];

    /// Returns the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Bread => "bread",
            IngredientCategory::Fillings => "fillings",
            IngredientCategory::Condiments => "condiments",
        }
    }
}

impl std::fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl std::fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown ingredient category: {}", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl std::str::FromStr for IngredientCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bread" => Ok(IngredientCategory::Bread),
            "fillings" => Ok(IngredientCategory::Fillings),
            "condiments" => Ok(IngredientCategory::Condiments),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_preserves_value() {
        let id = OrderId::new("order-42");
        assert_eq!(id.as_str(), "order-42");
        assert_eq!(id.to_string(), "order-42");
    }

    #[test]
    fn order_id_serialization_roundtrip() {
        let id = OrderId::new("order-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"order-42\"");
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn category_as_str() {
        assert_eq!(IngredientCategory::Bread.as_str(), "bread");
        assert_eq!(IngredientCategory::Fillings.as_str(), "fillings");
        assert_eq!(IngredientCategory::Condiments.as_str(), "condiments");
    }

    #[test]
    fn category_from_str() {
        assert_eq!(
            "bread".parse::<IngredientCategory>().unwrap(),
            IngredientCategory::Bread
        );
        assert_eq!(
            "fillings".parse::<IngredientCategory>().unwrap(),
            IngredientCategory::Fillings
        );
        assert_eq!(
            "condiments".parse::<IngredientCategory>().unwrap(),
            IngredientCategory::Condiments
        );
        assert!("mayo".parse::<IngredientCategory>().is_err());
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&IngredientCategory::Condiments).unwrap();
        assert_eq!(json, "\"condiments\"");
    }
}
