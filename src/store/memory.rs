use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::engine::loader::extract_operator_ids;
use crate::error::StoreError;
use crate::models::job::JobRecord;
use crate::models::operator::Operator;
use crate::store::{CompletionHistory, JobStore, OperatorDirectory};

/// In-process store backing the HTTP service and tests.
///
/// Operators keep their registration order so rankings with equal totals
/// come back in a stable order.
#[derive(Default)]
pub struct MemoryStore {
    jobs: DashMap<String, JobRecord>,
    operators: DashMap<String, (u64, Operator)>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&self, job: JobRecord) {
        self.jobs.insert(job.id.clone(), job);
    }

    /// Inserts or replaces an operator. A replaced operator keeps its
    /// original registration position.
    pub fn insert_operator(&self, operator: Operator) {
        match self.operators.entry(operator.id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().1 = operator,
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert((seq, operator));
            }
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn jobs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JobRecord>, StoreError> {
        let mut jobs: Vec<JobRecord> = self
            .jobs
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .scheduled_date
                    .is_some_and(|at| at >= start && at <= end)
            })
            .map(|entry| entry.value().clone())
            .collect();

        jobs.sort_by(|a, b| {
            a.scheduled_date
                .cmp(&b.scheduled_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(jobs)
    }

    async fn job(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.get(id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl CompletionHistory for MemoryStore {
    async fn completed_count(
        &self,
        property_id: &str,
        operator_id: &str,
    ) -> Result<u32, StoreError> {
        let count = self
            .jobs
            .iter()
            .filter(|entry| {
                let job = entry.value();
                job.property_id == property_id
                    && job.is_completed()
                    && extract_operator_ids(job).contains(operator_id)
            })
            .count();

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl OperatorDirectory for MemoryStore {
    async fn operators(&self) -> Result<Vec<Operator>, StoreError> {
        let mut operators: Vec<(u64, Operator)> = self
            .operators
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        operators.sort_by_key(|(seq, _)| *seq);

        Ok(operators.into_iter().map(|(_, operator)| operator).collect())
    }
}
