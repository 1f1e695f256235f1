use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::models::job::{ExistingAssignment, JobRecord, JobStatus, OperatorRef};
use crate::store::JobStore;

/// Every operator id recorded on `job`, across the embedded `operator`,
/// the `operators` list and the legacy `operatorId` field.
pub fn extract_operator_ids(job: &JobRecord) -> BTreeSet<String> {
    let embedded = job.operator.iter().filter_map(OperatorRef::id);
    let listed = job.operators.iter().filter_map(OperatorRef::id);
    let legacy = job
        .operator_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    embedded
        .chain(listed)
        .chain(legacy)
        .map(str::to_string)
        .collect()
}

/// First and last instant of the local calendar day `date` in `offset`,
/// both inclusive.
pub fn day_bounds(date: NaiveDate, offset: &FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(NaiveTime::MIN).and_utc();
    let start = local_midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    let end = start + TimeDelta::days(1) - TimeDelta::milliseconds(1);
    (start, end)
}

/// Jobs scheduled on `date`. A failed read yields no jobs.
pub async fn load_day_records(
    jobs: &dyn JobStore,
    date: NaiveDate,
    offset: &FixedOffset,
) -> Vec<JobRecord> {
    let (start, end) = day_bounds(date, offset);

    match jobs.jobs_between(start, end).await {
        Ok(records) => records,
        Err(err) => {
            // Fail open: every operator looks free rather than blocking the ranking.
            warn!(%date, error = %err, "failed to load day jobs; treating all operators as free");
            Vec::new()
        }
    }
}

/// Groups the day's jobs by every operator recorded on them. A job staffed
/// by several operators appears under each. Cancelled jobs and
/// `exclude_job_id` are skipped.
pub fn group_by_operator(
    records: &[JobRecord],
    exclude_job_id: Option<&str>,
) -> HashMap<String, Vec<ExistingAssignment>> {
    let mut by_operator: HashMap<String, Vec<ExistingAssignment>> = HashMap::new();

    for record in records {
        if exclude_job_id == Some(record.id.as_str()) || record.status == JobStatus::Cancelled {
            continue;
        }

        for operator_id in extract_operator_ids(record) {
            by_operator
                .entry(operator_id)
                .or_default()
                .push(ExistingAssignment::from(record));
        }
    }

    by_operator
}

/// Per-operator assignments already scheduled on `date`.
pub async fn load_day_assignments(
    jobs: &dyn JobStore,
    date: NaiveDate,
    offset: &FixedOffset,
    exclude_job_id: Option<&str>,
) -> HashMap<String, Vec<ExistingAssignment>> {
    let records = load_day_records(jobs, date, offset).await;
    let by_operator = group_by_operator(&records, exclude_job_id);

    debug!(
        %date,
        jobs = records.len(),
        busy_operators = by_operator.len(),
        "loaded day assignments"
    );

    by_operator
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{day_bounds, extract_operator_ids, load_day_assignments};
    use crate::error::StoreError;
    use crate::models::job::{EmbeddedOperator, JobRecord, JobStatus, OperatorRef};
    use crate::store::{JobStore, MemoryStore};

    struct BrokenStore;

    #[async_trait]
    impl JobStore for BrokenStore {
        async fn jobs_between(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<JobRecord>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn job(&self, _id: &str) -> Result<Option<JobRecord>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn rome() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn job(id: &str, hour: u32) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            property_id: format!("property-{id}"),
            scheduled_date: Some(Utc.with_ymd_and_hms(2026, 10, 15, hour, 0, 0).unwrap()),
            ..JobRecord::default()
        }
    }

    fn embedded(id: &str) -> OperatorRef {
        OperatorRef::Embedded(EmbeddedOperator {
            id: Some(id.to_string()),
            name: None,
        })
    }

    #[test]
    fn merges_and_deduplicates_all_shapes() {
        let mut record = job("j1", 9);
        record.operator = Some(embedded("op-x"));
        record.operators = vec![OperatorRef::Id("op-x".to_string()), embedded("op-y")];
        record.operator_id = Some(" op-z ".to_string());

        let ids: Vec<String> = extract_operator_ids(&record).into_iter().collect();
        assert_eq!(ids, vec!["op-x", "op-y", "op-z"]);
    }

    #[test]
    fn unassigned_job_has_no_operators() {
        let mut record = job("j1", 9);
        record.operator_id = Some(String::new());
        record.operator = Some(OperatorRef::Embedded(EmbeddedOperator::default()));

        assert!(extract_operator_ids(&record).is_empty());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let (start, end) = day_bounds(day(), &utc());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2026, 10, 15, 23, 59, 59).unwrap());
    }

    #[tokio::test]
    async fn each_shape_is_discoverable_on_its_own() {
        let store = MemoryStore::new();

        let mut legacy = job("legacy", 8);
        legacy.operator_id = Some("op-x".to_string());
        let mut single = job("single", 11);
        single.operator = Some(embedded("op-x"));
        let mut multi = job("multi", 14);
        multi.operators = vec![OperatorRef::Id("op-x".to_string())];

        store.insert_job(legacy);
        store.insert_job(single);
        store.insert_job(multi);

        let by_operator = load_day_assignments(&store, day(), &utc(), None).await;
        let mut job_ids: Vec<&str> = by_operator["op-x"]
            .iter()
            .map(|assignment| assignment.job_id.as_str())
            .collect();
        job_ids.sort_unstable();

        assert_eq!(job_ids, vec!["legacy", "multi", "single"]);
    }

    #[tokio::test]
    async fn multi_staffed_job_counts_for_everyone() {
        let store = MemoryStore::new();
        let mut shared = job("shared", 10);
        shared.operators = vec![embedded("op-a"), OperatorRef::Id("op-b".to_string())];
        store.insert_job(shared);

        let by_operator = load_day_assignments(&store, day(), &utc(), None).await;
        assert_eq!(by_operator["op-a"].len(), 1);
        assert_eq!(by_operator["op-b"].len(), 1);
    }

    #[tokio::test]
    async fn excludes_the_job_being_scored_and_cancelled_jobs() {
        let store = MemoryStore::new();
        let mut target = job("target", 9);
        target.operator_id = Some("op-a".to_string());
        let mut cancelled = job("cancelled", 12);
        cancelled.operator_id = Some("op-a".to_string());
        cancelled.status = JobStatus::Cancelled;
        let mut other = job("other", 15);
        other.operator_id = Some("op-a".to_string());
        store.insert_job(target);
        store.insert_job(cancelled);
        store.insert_job(other);

        let by_operator = load_day_assignments(&store, day(), &utc(), Some("target")).await;
        let assignments = &by_operator["op-a"];
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].job_id, "other");
    }

    #[tokio::test]
    async fn ignores_other_days() {
        let store = MemoryStore::new();
        let mut tomorrow = job("tomorrow", 9);
        tomorrow.scheduled_date = Some(Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap());
        tomorrow.operator_id = Some("op-a".to_string());
        store.insert_job(tomorrow);

        assert!(load_day_assignments(&store, day(), &utc(), None).await.is_empty());
    }

    #[test]
    fn day_bounds_shift_with_the_offset() {
        let (start, end) = day_bounds(day(), &rome());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 14, 22, 0, 0).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2026, 10, 15, 22, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn just_after_local_midnight_belongs_to_the_local_day() {
        let store = MemoryStore::new();
        let mut early = job("early", 0);
        early.scheduled_date = Some(Utc.with_ymd_and_hms(2026, 10, 14, 22, 30, 0).unwrap());
        early.operator_id = Some("op-a".to_string());
        store.insert_job(early);

        let local = load_day_assignments(&store, day(), &rome(), None).await;
        assert_eq!(local["op-a"].len(), 1);
        assert!(load_day_assignments(&store, day(), &utc(), None).await.is_empty());
    }

    #[tokio::test]
    async fn read_failure_yields_empty_map() {
        let by_operator = load_day_assignments(&BrokenStore, day(), &utc(), None).await;
        assert!(by_operator.is_empty());
    }
}
