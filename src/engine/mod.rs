pub mod loader;
pub mod ranking;
pub mod scoring;

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::geo::routing::RouteProvider;
use crate::store::{CompletionHistory, JobStore};

#[derive(Debug, Clone)]
pub struct ScoringSettings {
    /// Upper bound on a single routing lookup.
    pub routing_timeout: Duration,
    /// Operators scored concurrently within one ranking.
    pub concurrency: usize,
    /// Offset of the operating area; calendar days start at local midnight.
    pub day_offset: FixedOffset,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            routing_timeout: Duration::from_secs(2),
            concurrency: 8,
            day_offset: Utc.fix(),
        }
    }
}

/// Collaborators a scoring run reads from.
#[derive(Clone)]
pub struct ScoringContext {
    pub jobs: Arc<dyn JobStore>,
    pub history: Arc<dyn CompletionHistory>,
    pub routing: Option<Arc<dyn RouteProvider>>,
    pub settings: ScoringSettings,
}

impl ScoringContext {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        history: Arc<dyn CompletionHistory>,
        routing: Option<Arc<dyn RouteProvider>>,
        settings: ScoringSettings,
    ) -> Self {
        Self {
            jobs,
            history,
            routing,
            settings,
        }
    }
}
