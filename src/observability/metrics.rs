use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::models::assignment::AssignmentScore;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub rankings_total: IntCounterVec,
    pub ranking_latency_seconds: HistogramVec,
    pub candidates_scored_total: IntCounter,
    pub recommended_candidates_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let rankings_total = IntCounterVec::new(
            Opts::new("rankings_total", "Total ranking requests by kind"),
            &["kind"],
        )
        .expect("valid rankings_total metric");

        let ranking_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "ranking_latency_seconds",
                "Latency of candidate ranking in seconds",
            ),
            &["kind"],
        )
        .expect("valid ranking_latency_seconds metric");

        let candidates_scored_total = IntCounter::new(
            "candidates_scored_total",
            "Candidates returned with a score",
        )
        .expect("valid candidates_scored_total metric");

        let recommended_candidates_total = IntCounter::new(
            "recommended_candidates_total",
            "Returned candidates flagged as recommended",
        )
        .expect("valid recommended_candidates_total metric");

        registry
            .register(Box::new(rankings_total.clone()))
            .expect("register rankings_total");
        registry
            .register(Box::new(ranking_latency_seconds.clone()))
            .expect("register ranking_latency_seconds");
        registry
            .register(Box::new(candidates_scored_total.clone()))
            .expect("register candidates_scored_total");
        registry
            .register(Box::new(recommended_candidates_total.clone()))
            .expect("register recommended_candidates_total");

        Self {
            registry,
            rankings_total,
            ranking_latency_seconds,
            candidates_scored_total,
            recommended_candidates_total,
        }
    }

    pub fn observe_ranking<'a>(
        &self,
        kind: &str,
        elapsed_secs: f64,
        scores: impl IntoIterator<Item = &'a AssignmentScore>,
    ) {
        self.rankings_total.with_label_values(&[kind]).inc();
        self.ranking_latency_seconds
            .with_label_values(&[kind])
            .observe(elapsed_secs);

        for score in scores {
            self.candidates_scored_total.inc();
            if score.recommended {
                self.recommended_candidates_total.inc();
            }
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
