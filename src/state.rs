use std::sync::Arc;

use crate::engine::{ScoringContext, ScoringSettings};
use crate::geo::routing::RouteProvider;
use crate::observability::metrics::Metrics;
use crate::store::MemoryStore;

pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub scoring: ScoringContext,
    pub metrics: Metrics,
    pub default_rank_limit: usize,
}

impl AppState {
    pub fn new(
        routing: Option<Arc<dyn RouteProvider>>,
        settings: ScoringSettings,
        default_rank_limit: usize,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let scoring = ScoringContext::new(store.clone(), store.clone(), routing, settings);

        Self {
            store,
            scoring,
            metrics: Metrics::new(),
            default_rank_limit,
        }
    }
}
