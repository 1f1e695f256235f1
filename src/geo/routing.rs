//! Optional routing backends for real road distances.
//!
//! Lookups are best-effort: callers go through
//! [`estimate_road_distance`](crate::geo::estimate_road_distance), which
//! bounds every call with a timeout and falls back to the corrected
//! great-circle estimate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::RoutingError;
use crate::models::job::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Routing backends must be `Send + Sync` so one provider can serve
/// concurrent scoring tasks.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<RouteLeg, RoutingError>;
}

/// Routes via an OSRM HTTP endpoint (e.g. `http://localhost:5000`).
#[derive(Debug, Clone)]
pub struct OsrmRouteProvider {
    client: Client,
    endpoint: String,
    profile: String,
}

impl OsrmRouteProvider {
    pub fn new(endpoint: &str, profile: &str, timeout: Duration) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
        })
    }

    fn route_url(&self, from: &GeoPoint, to: &GeoPoint) -> Result<Url, RoutingError> {
        // OSRM takes lng,lat pairs.
        let raw = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.endpoint, self.profile, from.lng, from.lat, to.lng, to.lat
        );
        let mut url = Url::parse(&raw)
            .map_err(|err| RoutingError::Api(format!("failed to build OSRM URL: {err}")))?;
        url.query_pairs_mut().append_pair("overview", "false");
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64, // metres
    duration: f64, // seconds
}

fn parse_route_response(response: OsrmResponse) -> Result<RouteLeg, RoutingError> {
    if response.code != "Ok" {
        return match response.code.as_str() {
            "NoRoute" => Err(RoutingError::NoRoute),
            _ => Err(RoutingError::Api(format!(
                "{}: {}",
                response.code,
                response.message.unwrap_or_default()
            ))),
        };
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(RoutingError::NoRoute)?;

    let valid = |value: f64| value.is_finite() && value >= 0.0;
    if !valid(route.distance) || !valid(route.duration) {
        return Err(RoutingError::Api(format!(
            "invalid route leg: distance {} m, duration {} s",
            route.distance, route.duration
        )));
    }

    Ok(RouteLeg {
        distance_km: route.distance / 1000.0,
        duration_min: route.duration / 60.0,
    })
}

#[async_trait]
impl RouteProvider for OsrmRouteProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<RouteLeg, RoutingError> {
        let url = self.route_url(from, to)?;
        let response: OsrmResponse = self.client.get(url).send().await?.json().await?;
        parse_route_response(response)
    }
}
