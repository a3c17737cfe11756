use std::sync::Arc;

use crate::catalog::AssetCatalog;
use crate::client::ImpactSource;
use crate::narrative::{HeaderNarrativeParser, NarrativeParser};

/// Shared, read-only handler state. Nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ImpactSource>,
    pub parser: Arc<dyn NarrativeParser>,
    pub catalog: Arc<AssetCatalog>,
}

impl AppState {
    pub fn new(source: Arc<dyn ImpactSource>, catalog: AssetCatalog) -> Self {
        Self {
            source,
            parser: Arc::new(HeaderNarrativeParser),
            catalog: Arc::new(catalog),
        }
    }
}
