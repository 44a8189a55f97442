//! Execution environment handed to stage handlers.

use std::sync::Arc;

use crate::catalog::IngredientCatalog;
use crate::chaos::ChaosConfig;
use crate::events::EventSink;

/// The collaborators every stage handler needs.
///
/// Built once per executor and cloned freely; all parts are shared handles.
#[derive(Debug, Clone)]
pub struct FulfilmentEnv {
    pub chaos: ChaosConfig,
    pub catalog: IngredientCatalog,
    pub sink: Arc<dyn EventSink>,
}

impl FulfilmentEnv {
    /// Bundles the given collaborators into an environment.
    pub fn new(chaos: ChaosConfig, catalog: IngredientCatalog, sink: Arc<dyn EventSink>) -> Self {
        Self {
            chaos,
            catalog,
            sink,
        }
    }
}
