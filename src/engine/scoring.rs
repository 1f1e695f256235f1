//! The four criterion scorers. Each returns a [`CriterionScore`] bounded by
//! its maximum; together the maxima add up to 100.

use std::time::Duration;

use crate::error::StoreError;
use crate::geo::routing::RouteProvider;
use crate::geo::{distance_to_proximity_score, estimate_road_distance, haversine_km};
use crate::models::assignment::CriterionScore;
use crate::models::job::{CleaningJob, ExistingAssignment};

pub const PROXIMITY_MAX: u32 = 30;
pub const FAMILIARITY_MAX: u32 = 25;
pub const WORKLOAD_MAX: u32 = 25;
pub const PERFORMANCE_MAX: u32 = 20;

const PROXIMITY_NO_TARGET_COORDINATES: u32 = 15;
const PROXIMITY_NO_ASSIGNMENT_COORDINATES: u32 = 20;

pub const DEFAULT_RATING: f64 = 4.0;
const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;

/// Rating used for scoring: 4.0 when absent or not a number, otherwise
/// clamped to the 1-5 scale.
pub fn resolve_rating(rating: Option<f64>) -> f64 {
    match rating {
        Some(value) if value.is_finite() => value.clamp(MIN_RATING, MAX_RATING),
        _ => DEFAULT_RATING,
    }
}

/// Proximity of the job to the operator's nearest other stop today.
///
/// The nearest stop is picked by great-circle distance; only that one goes
/// through [`estimate_road_distance`].
pub async fn proximity_score(
    job: &CleaningJob,
    today: &[ExistingAssignment],
    routing: Option<&dyn RouteProvider>,
    routing_timeout: Duration,
) -> CriterionScore {
    let Some(target) = job.location else {
        return CriterionScore::new(
            PROXIMITY_NO_TARGET_COORDINATES,
            PROXIMITY_MAX,
            "job has no coordinates; medium score applied",
        );
    };

    if today.is_empty() {
        let mut score = CriterionScore::new(
            PROXIMITY_MAX,
            PROXIMITY_MAX,
            "first job of the day, no travel needed",
        );
        score.distance_km = Some(0.0);
        score.travel_time_min = Some(0.0);
        return score;
    }

    let nearest = today
        .iter()
        .filter_map(|assignment| {
            let location = assignment.location?;
            Some((assignment, location, haversine_km(&location, &target)))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2));

    let Some((nearest, from, _)) = nearest else {
        return CriterionScore::new(
            PROXIMITY_NO_ASSIGNMENT_COORDINATES,
            PROXIMITY_MAX,
            "no coordinates on today's other jobs; default score applied",
        );
    };

    let road = estimate_road_distance(routing, &from, &target, routing_timeout).await;
    let label = if nearest.property_name.is_empty() {
        nearest.job_id.as_str()
    } else {
        nearest.property_name.as_str()
    };

    let mut score = CriterionScore::new(
        distance_to_proximity_score(road.distance_km),
        PROXIMITY_MAX,
        format!(
            "{:.1} km from {} (~{:.0} min){}",
            road.distance_km,
            label,
            road.duration_min,
            if road.is_estimate { ", estimated" } else { "" }
        ),
    );
    score.distance_km = Some(road.distance_km);
    score.travel_time_min = Some(road.duration_min);
    score.is_estimate = Some(road.is_estimate);
    score
}

pub fn familiarity_points(previous_jobs: u32) -> u32 {
    match previous_jobs {
        5.. => 25,
        3..=4 => 20,
        1..=2 => 15,
        0 => 0,
    }
}

/// Familiarity from the operator's completed jobs at the property. A failed
/// count scores zero.
pub fn familiarity_score(previous_jobs: Result<u32, StoreError>) -> CriterionScore {
    let previous_jobs = match previous_jobs {
        Ok(count) => count,
        Err(err) => {
            return CriterionScore::new(
                0,
                FAMILIARITY_MAX,
                format!("could not compute familiarity: {err}"),
            );
        }
    };

    let explanation = match previous_jobs {
        0 => "never cleaned this property".to_string(),
        1 => "cleaned this property once before".to_string(),
        n if n >= 5 => format!("expert: cleaned this property {n} times"),
        n => format!("cleaned this property {n} times"),
    };

    let mut score = CriterionScore::new(
        familiarity_points(previous_jobs),
        FAMILIARITY_MAX,
        explanation,
    );
    score.previous_jobs = Some(previous_jobs);
    score
}

pub fn workload_points(today_jobs: usize) -> u32 {
    match today_jobs {
        0 => 25,
        1 => 18,
        2 => 10,
        3 => 5,
        _ => 0,
    }
}

pub fn workload_score(today_jobs: usize) -> CriterionScore {
    let explanation = match today_jobs {
        0 => "no other jobs today".to_string(),
        1 => "1 other job today".to_string(),
        n => format!("{n} other jobs today"),
    };

    let mut score = CriterionScore::new(workload_points(today_jobs), WORKLOAD_MAX, explanation);
    score.today_jobs = Some(today_jobs);
    score
}

pub fn performance_points(rating: f64) -> u32 {
    (rating * 4.0).round() as u32
}

pub fn performance_score(rating: Option<f64>) -> CriterionScore {
    let resolved = resolve_rating(rating);
    let explanation = match rating {
        Some(_) => format!("rating {resolved:.1}/5"),
        None => format!("no rating yet, assuming {DEFAULT_RATING:.1}/5"),
    };

    let mut score =
        CriterionScore::new(performance_points(resolved), PERFORMANCE_MAX, explanation);
    score.rating = Some(resolved);
    score
}
