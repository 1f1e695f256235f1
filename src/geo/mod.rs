pub mod routing;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RoutingError;
use crate::geo::routing::RouteProvider;
use crate::models::job::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Roads are never straight lines; great-circle distance is scaled by this.
pub const ROAD_CORRECTION_FACTOR: f64 = 1.4;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoadDistance {
    pub distance_km: f64,
    pub duration_min: f64,
    /// `true` when derived from the corrected great-circle distance rather
    /// than a routing service.
    pub is_estimate: bool,
}

impl RoadDistance {
    pub fn estimate(from: &GeoPoint, to: &GeoPoint) -> Self {
        let distance_km = haversine_km(from, to) * ROAD_CORRECTION_FACTOR;

        Self {
            distance_km,
            duration_min: travel_time_minutes(distance_km),
            is_estimate: true,
        }
    }
}

/// Road distance between two points.
///
/// Asks `routing` when one is configured, bounded by `timeout`. Any routing
/// failure degrades to [`RoadDistance::estimate`], so this never fails.
pub async fn estimate_road_distance(
    routing: Option<&dyn RouteProvider>,
    from: &GeoPoint,
    to: &GeoPoint,
    timeout: Duration,
) -> RoadDistance {
    let Some(provider) = routing else {
        return RoadDistance::estimate(from, to);
    };

    let result = match tokio::time::timeout(timeout, provider.route(from, to)).await {
        Ok(result) => result,
        Err(_) => Err(RoutingError::Timeout),
    };

    match result {
        Ok(leg) => {
            debug!(
                provider = provider.name(),
                distance_km = leg.distance_km,
                duration_min = leg.duration_min,
                "routing lookup succeeded"
            );
            RoadDistance {
                distance_km: leg.distance_km,
                duration_min: leg.duration_min,
                is_estimate: false,
            }
        }
        Err(err) => {
            warn!(
                provider = provider.name(),
                error = %err,
                "routing lookup failed; using corrected great-circle estimate"
            );
            RoadDistance::estimate(from, to)
        }
    }
}

/// Door-to-door minutes for a mix of walking and public transport.
///
/// Short hops are walked (12 min/km), mid-range trips mix modes (8 min/km),
/// anything from 3 km is transit at 5 min/km plus a 10 minute wait.
pub fn travel_time_minutes(distance_km: f64) -> f64 {
    if distance_km < 1.0 {
        distance_km * 12.0
    } else if distance_km < 3.0 {
        distance_km * 8.0
    } else {
        distance_km * 5.0 + 10.0
    }
}

/// Proximity points out of 30. Non-increasing in `distance_km`.
pub fn distance_to_proximity_score(distance_km: f64) -> u32 {
    const STEPS: [(f64, u32); 10] = [
        (0.5, 30),
        (1.0, 27),
        (1.5, 24),
        (2.0, 21),
        (3.0, 18),
        (4.0, 15),
        (5.0, 12),
        (7.0, 9),
        (10.0, 6),
        (15.0, 3),
    ];

    STEPS
        .iter()
        .find(|(limit, _)| distance_km < *limit)
        .map_or(0, |(_, points)| *points)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{
        distance_to_proximity_score, estimate_road_distance, haversine_km, travel_time_minutes,
        RoadDistance,
    };
    use crate::error::RoutingError;
    use crate::geo::routing::{RouteLeg, RouteProvider};
    use crate::models::job::GeoPoint;

    const ROME: GeoPoint = GeoPoint {
        lat: 41.90,
        lng: 12.49,
    };
    const ROME_NORTH: GeoPoint = GeoPoint {
        lat: 41.91,
        lng: 12.49,
    };

    struct FixedRoute(RouteLeg);

    #[async_trait]
    impl RouteProvider for FixedRoute {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn route(&self, _from: &GeoPoint, _to: &GeoPoint) -> Result<RouteLeg, RoutingError> {
            Ok(self.0)
        }
    }

    struct DownRoute;

    #[async_trait]
    impl RouteProvider for DownRoute {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn route(&self, _from: &GeoPoint, _to: &GeoPoint) -> Result<RouteLeg, RoutingError> {
            Err(RoutingError::Api("503 from upstream".to_string()))
        }
    }

    struct StalledRoute;

    #[async_trait]
    impl RouteProvider for StalledRoute {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn route(&self, _from: &GeoPoint, _to: &GeoPoint) -> Result<RouteLeg, RoutingError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(RoutingError::NoRoute)
        }
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 53.5511,
            lng: 9.9937,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn estimate_applies_road_correction() {
        let straight = haversine_km(&ROME, &ROME_NORTH);
        let road = RoadDistance::estimate(&ROME, &ROME_NORTH);

        assert!((road.distance_km - straight * 1.4).abs() < 1e-9);
        assert_eq!(road.duration_min, travel_time_minutes(road.distance_km));
        assert!(road.is_estimate);
    }

    #[test]
    fn travel_time_is_piecewise() {
        assert!((travel_time_minutes(0.5) - 6.0).abs() < 1e-9);
        assert!((travel_time_minutes(2.0) - 16.0).abs() < 1e-9);
        assert!((travel_time_minutes(4.0) - 30.0).abs() < 1e-9);
        assert!((travel_time_minutes(10.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn proximity_breakpoints() {
        let cases = [
            (0.0, 30),
            (0.49, 30),
            (0.5, 27),
            (0.99, 27),
            (1.0, 24),
            (1.5, 21),
            (2.0, 18),
            (3.0, 15),
            (4.0, 12),
            (5.0, 9),
            (7.0, 6),
            (10.0, 3),
            (14.99, 3),
            (15.0, 0),
            (120.0, 0),
        ];

        for (distance, expected) in cases {
            assert_eq!(
                distance_to_proximity_score(distance),
                expected,
                "distance {distance} km"
            );
        }
    }

    #[test]
    fn proximity_never_increases_with_distance() {
        let mut previous = distance_to_proximity_score(0.0);
        for step in 1..=400 {
            let current = distance_to_proximity_score(step as f64 * 0.05);
            assert!(current <= previous);
            assert!(current <= 30);
            previous = current;
        }
    }

    #[tokio::test]
    async fn uses_routing_service_when_it_answers() {
        let provider = FixedRoute(RouteLeg {
            distance_km: 2.3,
            duration_min: 9.0,
        });

        let routing: &dyn RouteProvider = &provider;
        let road =
            estimate_road_distance(Some(routing), &ROME, &ROME_NORTH, Duration::from_secs(1)).await;

        assert_eq!(road.distance_km, 2.3);
        assert_eq!(road.duration_min, 9.0);
        assert!(!road.is_estimate);
    }

    #[tokio::test]
    async fn routing_error_falls_back_to_estimate() {
        let routing: &dyn RouteProvider = &DownRoute;
        let road =
            estimate_road_distance(Some(routing), &ROME, &ROME_NORTH, Duration::from_secs(1)).await;

        assert_eq!(road, RoadDistance::estimate(&ROME, &ROME_NORTH));
    }

    #[tokio::test]
    async fn routing_timeout_falls_back_to_estimate() {
        let routing: &dyn RouteProvider = &StalledRoute;
        let road = estimate_road_distance(
            Some(routing),
            &ROME,
            &ROME_NORTH,
            Duration::from_millis(200),
        )
        .await;

        assert!(road.is_estimate);
    }

    #[tokio::test]
    async fn no_routing_service_means_estimate() {
        let road = estimate_road_distance(None, &ROME, &ROME_NORTH, Duration::from_secs(1)).await;
        assert!(road.is_estimate);
    }
}
