use futures::future::BoxFuture;
use geo::Point;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use hub_search::geometry::{distance_km, GeoError};

/// What the routing collaborator reports for a routable pair of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: u32,
}

#[derive(Debug)]
pub enum RouterError {
    Unavailable(String),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::Unavailable(detail) => write!(f, "routing unavailable: {}", detail),
        }
    }
}

impl std::error::Error for RouterError {}

/// Road-routing collaborator (OSRM behind the proxy). `Ok(None)` means the
/// provider answered but found no road between the points.
pub trait Router {
    fn route(
        &self,
        from: Point<f64>,
        to: Point<f64>,
    ) -> BoxFuture<'_, Result<Option<RouteSummary>, RouterError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoadRoute {
    pub distance_km: f64,
    pub duration_seconds: u32,
}

/// Result of a two-point measurement. The straight line is always present,
/// the road leg only when the routing collaborator produced one in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceReport {
    pub straight_line_km: f64,
    pub road: Option<RoadRoute>,
}

/// Measures between two points: great-circle locally, road distance via the
/// routing collaborator bounded by `limit`. Provider failure, no-route and
/// timeout all come back as a missing road leg, never as an error, so the
/// measurement works offline. Only invalid coordinates fail.
pub async fn measure(
    from: Point<f64>,
    to: Point<f64>,
    router: Option<&(dyn Router + Send + Sync)>,
    limit: Duration,
) -> Result<DistanceReport, GeoError> {
    let straight_line_km = distance_km(from, to)?;
    let road = match router {
        None => None,
        Some(router) => match tokio::time::timeout(limit, router.route(from, to)).await {
            Ok(Ok(Some(summary))) => Some(RoadRoute {
                distance_km: summary.distance_meters / 1000.0,
                duration_seconds: summary.duration_seconds,
            }),
            Ok(Ok(None)) => {
                eprintln!(
                    "distance: no road route between {:?} and {:?}",
                    (from.x(), from.y()),
                    (to.x(), to.y())
                );
                None
            }
            Ok(Err(err)) => {
                eprintln!("distance: routing failed: {}", err);
                None
            }
            Err(_elapsed) => {
                eprintln!("distance: routing gave no answer within {:?}", limit);
                None
            }
        },
    };
    Ok(DistanceReport {
        straight_line_km,
        road,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const BERLIN: (f64, f64) = (13.4050, 52.5200);
    const HAMBURG: (f64, f64) = (9.9937, 53.5511);

    struct StubRouter(Result<Option<RouteSummary>, ()>);

    impl Router for StubRouter {
        fn route(
            &self,
            _from: Point<f64>,
            _to: Point<f64>,
        ) -> BoxFuture<'_, Result<Option<RouteSummary>, RouterError>> {
            let answer = match &self.0 {
                Ok(summary) => Ok(*summary),
                Err(()) => Err(RouterError::Unavailable("stub is down".to_owned())),
            };
            Box::pin(async move { answer })
        }
    }

    /// Pretends to route but never answers, for exercising the timeout
    struct BlackHoleRouter;

    impl Router for BlackHoleRouter {
        fn route(
            &self,
            _from: Point<f64>,
            _to: Point<f64>,
        ) -> BoxFuture<'_, Result<Option<RouteSummary>, RouterError>> {
            Box::pin(futures::future::pending())
        }
    }

    fn points() -> (Point<f64>, Point<f64>) {
        (
            Point::new(BERLIN.0, BERLIN.1),
            Point::new(HAMBURG.0, HAMBURG.1),
        )
    }

    #[tokio::test]
    async fn road_leg_reported_when_routing_answers() {
        let (a, b) = points();
        let router = StubRouter(Ok(Some(RouteSummary {
            distance_meters: 289_000.0,
            duration_seconds: 11_100,
        })));
        let report = measure(a, b, Some(&router), Duration::from_secs(5))
            .await
            .unwrap();
        let road = report.road.unwrap();
        assert!((road.distance_km - 289.0).abs() < f64::EPSILON);
        assert_eq!(road.duration_seconds, 11_100);
        // road distance exceeds the great circle
        assert!(road.distance_km > report.straight_line_km);
    }

    #[tokio::test]
    async fn straight_line_survives_router_failure() {
        let (a, b) = points();
        let router = StubRouter(Err(()));
        let report = measure(a, b, Some(&router), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(report.straight_line_km > 200.0 && report.straight_line_km < 300.0);
        assert!(report.road.is_none());
    }

    #[tokio::test]
    async fn no_route_is_not_an_error() {
        let (a, b) = points();
        let router = StubRouter(Ok(None));
        let report = measure(a, b, Some(&router), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(report.road.is_none());
    }

    #[tokio::test]
    async fn routing_is_cut_off_at_the_deadline() {
        let (a, b) = points();
        let report = measure(a, b, Some(&BlackHoleRouter), Duration::from_millis(20))
            .await
            .unwrap();
        assert!(report.road.is_none());
        assert!(report.straight_line_km > 0.0);
    }

    #[tokio::test]
    async fn works_without_a_router() {
        let (a, b) = points();
        let report = measure(a, b, None, Duration::from_secs(5)).await.unwrap();
        assert!(report.road.is_none());
        assert!(report.straight_line_km > 0.0);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_an_error() {
        let report = measure(
            Point::new(0.0, 120.0),
            Point::new(0.0, 0.0),
            None,
            Duration::from_secs(5),
        )
        .await;
        assert!(report.is_err());
    }
}
