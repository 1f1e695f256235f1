use std::collections::HashMap;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::ScoringContext;
use crate::engine::loader::{
    extract_operator_ids, group_by_operator, load_day_assignments, load_day_records,
};
use crate::engine::scoring::{familiarity_score, performance_score, proximity_score, workload_score};
use crate::models::assignment::{AssignmentScore, ScoreBreakdown};
use crate::models::job::{CleaningJob, ExistingAssignment, JobRecord, JobStatus};
use crate::models::operator::Operator;

pub const RECOMMENDED_THRESHOLD: u32 = 70;

const HIGH_LOAD_JOBS: usize = 3;
const LONG_DISTANCE_KM: f64 = 10.0;
const LONG_TRAVEL_MIN: f64 = 30.0;

pub fn is_recommended(total_score: u32) -> bool {
    total_score >= RECOMMENDED_THRESHOLD
}

fn collect_warnings(breakdown: &ScoreBreakdown, today_jobs: usize) -> Vec<String> {
    let mut warnings = Vec::new();

    if today_jobs >= HIGH_LOAD_JOBS {
        warnings.push(format!("high load: already {today_jobs} jobs today"));
    }
    if let Some(distance_km) = breakdown.proximity.distance_km {
        if distance_km > LONG_DISTANCE_KM {
            warnings.push(format!("long distance: {distance_km:.1} km from nearest job"));
        }
    }
    if let Some(travel_min) = breakdown.proximity.travel_time_min {
        if travel_min > LONG_TRAVEL_MIN {
            warnings.push(format!("long travel: ~{travel_min:.0} min"));
        }
    }

    warnings
}

/// Scores one operator for `job` given what they already have on `today`.
pub async fn score_operator(
    ctx: &ScoringContext,
    job: &CleaningJob,
    operator: &Operator,
    today: &[ExistingAssignment],
) -> AssignmentScore {
    let proximity = proximity_score(
        job,
        today,
        ctx.routing.as_deref(),
        ctx.settings.routing_timeout,
    )
    .await;

    let previous_jobs = ctx
        .history
        .completed_count(&job.property_id, &operator.id)
        .await
        .inspect_err(|err| {
            warn!(
                job_id = %job.id,
                operator_id = %operator.id,
                error = %err,
                "failed to count completed jobs; familiarity scored as zero"
            );
        });

    let breakdown = ScoreBreakdown {
        proximity,
        familiarity: familiarity_score(previous_jobs),
        workload: workload_score(today.len()),
        performance: performance_score(operator.rating),
    };

    let total_score = breakdown.total();
    let warnings = collect_warnings(&breakdown, today.len());

    debug!(
        job_id = %job.id,
        operator_id = %operator.id,
        total_score,
        "operator scored"
    );

    AssignmentScore {
        operator_id: operator.id.clone(),
        operator_name: operator.name.clone(),
        total_score,
        breakdown,
        today_assignments: today.to_vec(),
        recommended: is_recommended(total_score),
        warnings,
    }
}

fn is_rankable(operator: &Operator) -> bool {
    if operator.id.trim().is_empty() {
        debug!(name = %operator.name, "skipping candidate without id");
        return false;
    }
    operator.is_active()
}

/// Scores active candidates against an already loaded day map and keeps the
/// best `limit`, highest total first. Equal totals keep input order.
pub async fn rank_with_assignments(
    ctx: &ScoringContext,
    job: &CleaningJob,
    operators: &[Operator],
    day: &HashMap<String, Vec<ExistingAssignment>>,
    limit: usize,
) -> Vec<AssignmentScore> {
    let candidates: Vec<&Operator> = operators.iter().filter(|op| is_rankable(op)).collect();

    let pending: Vec<_> = candidates
        .into_iter()
        .map(|operator| {
            let today = day.get(&operator.id).map(Vec::as_slice).unwrap_or_default();
            score_operator(ctx, job, operator, today)
        })
        .collect();

    let mut scores: Vec<AssignmentScore> = stream::iter(pending)
        .buffered(ctx.settings.concurrency.max(1))
        .collect()
        .await;

    scores.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    scores.truncate(limit);
    scores
}

/// Ranks `operators` for `job` on its scheduled day.
pub async fn rank_operators_for_job(
    ctx: &ScoringContext,
    job: &CleaningJob,
    operators: &[Operator],
    limit: usize,
) -> Vec<AssignmentScore> {
    let day = load_day_assignments(
        ctx.jobs.as_ref(),
        job.scheduled_date,
        &ctx.settings.day_offset,
        Some(job.id.as_str()),
    )
    .await;
    let ranked = rank_with_assignments(ctx, job, operators, &day, limit).await;

    info!(
        job_id = %job.id,
        candidates = operators.len(),
        returned = ranked.len(),
        top_score = ranked.first().map(|score| score.total_score),
        "operators ranked"
    );

    ranked
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSuggestion {
    pub job: CleaningJob,
    pub candidates: Vec<AssignmentScore>,
}

/// Candidate rankings for every unstaffed job on `date`.
///
/// The day is read once and shared by every job. Each job is ranked on its
/// own; no attempt is made to balance candidates across jobs.
pub async fn suggest_for_day(
    ctx: &ScoringContext,
    date: NaiveDate,
    operators: &[Operator],
    limit: usize,
) -> Vec<JobSuggestion> {
    let offset = ctx.settings.day_offset;
    let records = load_day_records(ctx.jobs.as_ref(), date, &offset).await;
    let day = group_by_operator(&records, None);

    let mut open_records: Vec<&JobRecord> = records
        .iter()
        .filter(|record| {
            record.status != JobStatus::Cancelled
                && !record.is_completed()
                && extract_operator_ids(record).is_empty()
        })
        .collect();
    // Jobs without any usable time go last.
    open_records.sort_by_key(|record| {
        let start = record.start_time(&offset);
        (start.is_none(), start, record.id.clone())
    });

    let open_jobs: Vec<CleaningJob> = open_records
        .into_iter()
        .filter_map(|record| record.to_cleaning_job(&offset))
        .collect();

    let mut suggestions = Vec::with_capacity(open_jobs.len());
    for job in open_jobs {
        let candidates = rank_with_assignments(ctx, &job, operators, &day, limit).await;
        suggestions.push(JobSuggestion { job, candidates });
    }

    info!(%date, open_jobs = suggestions.len(), "day suggestions built");
    suggestions
}
