//! Read contracts for the collaborators the scoring engine consumes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::job::JobRecord;
use crate::models::operator::Operator;

pub use memory::MemoryStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs whose scheduled date lies in `start..=end`.
    async fn jobs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JobRecord>, StoreError>;

    async fn job(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;
}

#[async_trait]
pub trait CompletionHistory: Send + Sync {
    /// Completed jobs at `property_id` that `operator_id` worked on.
    async fn completed_count(
        &self,
        property_id: &str,
        operator_id: &str,
    ) -> Result<u32, StoreError>;
}

#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    async fn operators(&self) -> Result<Vec<Operator>, StoreError>;
}
