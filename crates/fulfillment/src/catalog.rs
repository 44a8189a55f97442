//! Ingredient catalog with per-ingredient availability flags.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::IngredientCategory;

/// Catalog entries per category, in menu order.
const BREADS: &[(&str, &str)] = &[
    ("white", "White Bread"),
    ("wheat", "Wheat Bread"),
    ("sourdough", "Sourdough"),
    ("rye", "Rye Bread"),
    ("ciabatta", "Ciabatta Roll"),
    ("baguette", "Baguette"),
];

const FILLINGS: &[(&str, &str)] = &[
    ("turkey", "Turkey"),
    ("ham", "Ham"),
    ("roast-beef", "Roast Beef"),
    ("chicken", "Grilled Chicken"),
    ("tuna", "Tuna Salad"),
    ("salmon", "Smoked Salmon"),
    ("cheese", "Cheese"),
    ("lettuce", "Lettuce"),
    ("tomato", "Tomato"),
    ("onion", "Red Onion"),
    ("pickles", "Pickles"),
    ("cucumber", "Cucumber"),
    ("avocado", "Avocado"),
    ("bacon", "Bacon"),
];

const CONDIMENTS: &[(&str, &str)] = &[
    ("mayo", "Mayonnaise"),
    ("mustard", "Mustard"),
    ("ketchup", "Ketchup"),
    ("ranch", "Ranch Dressing"),
    ("italian", "Italian Dressing"),
    ("oil-vinegar", "Oil & Vinegar"),
    ("hot-sauce", "Hot Sauce"),
    ("bbq", "BBQ Sauce"),
    ("honey-mustard", "Honey Mustard"),
    ("garlic-aioli", "Garlic Aioli"),
];

/// Ingredient catalog with mutable availability flags.
///
/// Ingredients default to available; an absent flag means available, so
/// unknown ingredient ids are never treated as missing. Clones share the
/// same flags (injected collaborator, never global).
#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    unavailable: Arc<RwLock<HashMap<(IngredientCategory, String), bool>>>,
}

impl IngredientCatalog {
    /// Creates a catalog with everything available.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(category: IngredientCategory) -> &'static [(&'static str, &'static str)] {
        match category {
            IngredientCategory::Bread => BREADS,
            IngredientCategory::Fillings => FILLINGS,
            IngredientCategory::Condiments => CONDIMENTS,
        }
    }

    /// Returns the ids of all catalog ingredients in a category.
    pub fn ingredient_ids(&self, category: IngredientCategory) -> Vec<&'static str> {
        Self::entries(category).iter().map(|(id, _)| *id).collect()
    }

    /// Returns the display name for an ingredient, if it is in the catalog.
    pub fn display_name(&self, ingredient: &str, category: IngredientCategory) -> Option<&'static str> {
        Self::entries(category)
            .iter()
            .find(|(id, _)| *id == ingredient)
            .map(|(_, name)| *name)
    }

    /// Whether the ingredient is currently available.
    pub fn is_available(&self, ingredient: &str, category: IngredientCategory) -> bool {
        self.unavailable
            .read()
            .unwrap()
            .get(&(category, ingredient.to_string()))
            .copied()
            .unwrap_or(true)
    }

    /// Sets an ingredient's availability flag.
    pub fn set_availability(&self, ingredient: &str, category: IngredientCategory, available: bool) {
        self.unavailable
            .write()
            .unwrap()
            .insert((category, ingredient.to_string()), available);
    }

    /// Available same-category substitution candidates, excluding the
    /// original, in catalog order.
    pub fn substitutions_for(&self, ingredient: &str, category: IngredientCategory) -> Vec<String> {
        Self::entries(category)
            .iter()
            .filter(|(id, _)| *id != ingredient && self.is_available(id, category))
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// First available substitution candidate, if any.
    pub fn suggestion(&self, ingredient: &str, category: IngredientCategory) -> Option<String> {
        self.substitutions_for(ingredient, category).into_iter().next()
    }

    /// Returns the subset of the given ingredients that are unavailable.
    pub fn missing_of(&self, ingredients: &[&str], category: IngredientCategory) -> Vec<String> {
        ingredients
            .iter()
            .filter(|ingredient| !self.is_available(ingredient, category))
            .map(|ingredient| ingredient.to_string())
            .collect()
    }

    /// Marks every catalog ingredient available again.
    pub fn reset_all_available(&self) {
        self.unavailable.write().unwrap().clear();
    }
}
