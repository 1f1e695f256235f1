use serde::{Deserialize, Serialize};

use crate::models::job::ExistingAssignment;

/// One criterion's share of the total, with the raw figures behind it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CriterionScore {
    pub score: u32,
    pub max_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_estimate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_jobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub explanation: String,
}

impl CriterionScore {
    /// Scores above `max_score` are capped.
    pub fn new(score: u32, max_score: u32, explanation: impl Into<String>) -> Self {
        Self {
            score: score.min(max_score),
            max_score,
            explanation: explanation.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub proximity: CriterionScore,
    pub familiarity: CriterionScore,
    pub workload: CriterionScore,
    pub performance: CriterionScore,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.proximity.score + self.familiarity.score + self.workload.score + self.performance.score
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentScore {
    pub operator_id: String,
    pub operator_name: String,
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub today_assignments: Vec<ExistingAssignment>,
    pub recommended: bool,
    pub warnings: Vec<String>,
}
