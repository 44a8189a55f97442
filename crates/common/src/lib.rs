//! Shared types used across the fulfilment crates.

mod types;

pub use types::{IngredientCategory, OrderId, ParseCategoryError};
