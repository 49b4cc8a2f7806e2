//! Unit tests for rn-route.
//!
//! The fixture network sits at (0°, 0°); `deg(m)` converts metres along a
//! meridian to degrees.

#[cfg(test)]
mod fixtures {
    use geo::line_string;

    use rn_core::{EARTH_RADIUS_M, GeoPoint, RoutingConfig};
    use rn_graph::Segment;

    use crate::RouteService;

    pub fn deg(m: f64) -> f64 {
        m / EARTH_RADIUS_M.to_radians()
    }

    pub const A: (f64, f64) = (0.0, 0.0);

    pub fn b() -> (f64, f64) {
        (0.0, deg(100.0))
    }

    pub fn c() -> (f64, f64) {
        (0.0, deg(150.0))
    }

    pub fn point(p: (f64, f64)) -> GeoPoint {
        GeoPoint::new(p.0, p.1)
    }

    pub fn config() -> RoutingConfig {
        let mut config = RoutingConfig::default();
        config.speeds.classes.insert("fast".into(), 36.0);
        config.speeds.classes.insert("c18".into(), 18.0);
        config
    }

    /// A --100 m, 36 km/h, two-way-- B --50 m, 18 km/h, one-way--> C.
    /// Vertex ids are A = 0, B = 1, C = 2.
    pub fn abc() -> Vec<Segment> {
        let (b, c) = (b(), c());
        vec![
            Segment::new(line_string![(x: A.0, y: A.1), (x: b.0, y: b.1)])
                .with_source_id(101)
                .with_class("fast"),
            Segment::new(line_string![(x: b.0, y: b.1), (x: c.0, y: c.1)])
                .with_source_id(102)
                .with_class("c18")
                .with_oneway_tag("yes"),
        ]
    }

    /// `n` two-way 10 m segments along the equator.
    pub fn chain(n: usize) -> Vec<Segment> {
        let step = deg(10.0);
        (0..n)
            .map(|i| {
                let (x0, x1) = (i as f64 * step, (i + 1) as f64 * step);
                Segment::new(line_string![(x: x0, y: 0.0), (x: x1, y: 0.0)])
            })
            .collect()
    }

    pub fn service() -> RouteService {
        let service = RouteService::new(config()).unwrap();
        service.rebuild(abc()).unwrap();
        service
    }
}

// ── Request validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod request {
    use crate::{RawRouteQuery, RouteError, RouteRequest};

    fn full() -> RouteRequest {
        RouteRequest {
            start_lon: Some(106.70),
            start_lat: Some(10.77),
            end_lon:   Some(-180.0),
            end_lat:   Some(90.0),
        }
    }

    #[test]
    fn valid_request() {
        let (s, e) = full().validate().unwrap();
        assert_eq!((s.lon, s.lat), (106.70, 10.77));
        assert_eq!((e.lon, e.lat), (-180.0, 90.0));
    }

    #[test]
    fn missing_parameter_named() {
        let req = RouteRequest { end_lon: None, ..full() };
        assert_eq!(req.validate().unwrap_err(), RouteError::MissingParameter { name: "end_lon" });
        assert_eq!(
            RouteRequest::default().validate().unwrap_err(),
            RouteError::MissingParameter { name: "start_lon" }
        );
    }

    #[test]
    fn out_of_range_and_non_finite() {
        let req = RouteRequest { start_lat: Some(91.0), ..full() };
        assert!(matches!(
            req.validate(),
            Err(RouteError::InvalidCoordinate { name: "start_lat", .. })
        ));

        let req = RouteRequest { end_lon: Some(180.5), ..full() };
        assert!(matches!(req.validate(), Err(RouteError::InvalidCoordinate { name: "end_lon", .. })));

        let req = RouteRequest { start_lon: Some(f64::NAN), ..full() };
        assert!(matches!(req.validate(), Err(RouteError::InvalidCoordinate { name: "start_lon", .. })));
    }

    #[test]
    fn raw_query_parsing() {
        let raw = RawRouteQuery {
            start_lon: Some("106.7".into()),
            start_lat: Some(" 10.77 ".into()),
            end_lon:   Some("".into()),
            end_lat:   None,
        };
        let req = RouteRequest::try_from(raw).unwrap();
        assert_eq!(req.start_lat, Some(10.77));
        assert_eq!(req.end_lon, None);
        assert_eq!(req.validate().unwrap_err(), RouteError::MissingParameter { name: "end_lon" });
    }

    fn raw(values: [Option<&str>; 4]) -> RawRouteQuery {
        let [start_lon, start_lat, end_lon, end_lat] = values.map(|v| v.map(str::to_owned));
        RawRouteQuery { start_lon, start_lat, end_lon, end_lat }
    }

    /// Missing-or-invalid, whichever comes first in parameter order.
    fn first_problem(raw: RawRouteQuery) -> RouteError {
        RouteRequest::try_from(raw).and_then(|req| req.validate()).unwrap_err()
    }

    #[test]
    fn raw_query_non_number() {
        let q = raw([Some("106.7"), Some("10.77"), Some("106.8"), Some("north")]);
        assert_eq!(
            RouteRequest::try_from(q).unwrap_err(),
            RouteError::InvalidCoordinate { name: "end_lat", value: "north".into() }
        );
    }

    #[test]
    fn pairs_collect_known_keys() {
        let pairs = [("end_lat", "1"), ("units", "metric"), ("start_lon", "2"), ("start_lon", "3")]
            .map(|(k, v)| (k.to_owned(), v.to_owned()));
        let q = RawRouteQuery::from_pairs(pairs);
        assert_eq!(q.start_lon.as_deref(), Some("2,3"));
        assert_eq!(q.start_lat, None);
        assert_eq!(q.end_lat.as_deref(), Some("1"));
        assert!(matches!(
            RouteRequest::try_from(q),
            Err(RouteError::InvalidCoordinate { name: "start_lon", .. })
        ));
    }

    #[test]
    fn earlier_missing_outranks_later_non_number() {
        let q = raw([None, Some("10.77"), Some("106.8"), Some("abc")]);
        assert_eq!(first_problem(q), RouteError::MissingParameter { name: "start_lon" });

        let q = raw([Some("106.7"), Some("10.77"), Some(""), Some("abc")]);
        assert_eq!(first_problem(q), RouteError::MissingParameter { name: "end_lon" });
    }

    #[test]
    fn earlier_non_number_outranks_later_missing() {
        let q = raw([Some("106.7"), Some("x"), None, None]);
        assert_eq!(
            first_problem(q),
            RouteError::InvalidCoordinate { name: "start_lat", value: "x".into() }
        );
    }
}

// ── Routing through the service ───────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use geo::Coord;

    use rn_core::VertexId;

    use super::fixtures::{A, b, c, config, deg, point, service};
    use crate::{RouteError, RouteRequest, RouteService};

    #[test]
    fn abc_forward_route() {
        let service = service();
        let req = RouteRequest::new(point(A), point(c()));
        let res = service.route(&req, None).unwrap();

        assert_eq!(res.segment_count, 2);
        assert_eq!(res.start_vertex, VertexId(0));
        assert_eq!(res.end_vertex, VertexId(2));
        assert!((res.total_cost_s - 20.0).abs() < 1e-6);
        assert_eq!(res.total_distance_km, 0.15);
        assert_eq!(res.duration_minutes, 0.3);
        assert_eq!(res.start_distance_m, 0.0);

        assert_eq!(res.features[0].length_m, 100.0);
        assert_eq!(res.features[1].length_m, 50.0);
        assert_eq!(res.features[0].source_id, Some(101));
        assert_eq!(res.features[0].coordinates[0], Coord { x: A.0, y: A.1 });
        assert_eq!(*res.features[1].coordinates.last().unwrap(), Coord { x: c().0, y: c().1 });
    }

    #[test]
    fn oneway_blocks_return_trip() {
        let service = service();
        let req = RouteRequest::new(point(c()), point(A));
        assert_eq!(
            service.route(&req, None).unwrap_err(),
            RouteError::NoRouteFound { start_vertex: VertexId(2), end_vertex: VertexId(0) }
        );
    }

    #[test]
    fn reverse_traversal_reorients_geometry() {
        let service = service();
        let res = service.route(&RouteRequest::new(point(b()), point(A)), None).unwrap();
        assert_eq!(res.segment_count, 1);
        let coords = &res.features[0].coordinates;
        assert_eq!(coords[0], Coord { x: b().0, y: b().1 });
        assert_eq!(coords[1], Coord { x: A.0, y: A.1 });
    }

    #[test]
    fn same_vertex_is_empty_route() {
        let service = service();
        // Both points snap to A.
        let req = RouteRequest::new(point((0.0, deg(10.0))), point((deg(5.0), 0.0)));
        let res = service.route(&req, None).unwrap();
        assert_eq!(res.segment_count, 0);
        assert!(res.features.is_empty());
        assert_eq!(res.total_cost_s, 0.0);
        assert!((res.start_distance_m - 10.0).abs() <= 0.1);
    }

    #[test]
    fn snap_threshold_5km_vs_15km() {
        let service = service();

        let near = RouteRequest::new(point(A), point((0.0, deg(5_150.0))));
        let res = service.route(&near, None).unwrap();
        assert_eq!(res.end_vertex, VertexId(2));
        assert!((res.end_distance_m - 5_000.0).abs() < 1.0);

        let far = RouteRequest::new(point(A), point((0.0, deg(15_150.0))));
        match service.route(&far, None).unwrap_err() {
            RouteError::PointUnroutable { start_distance_m, end_distance_m, max_distance_m } => {
                assert_eq!(start_distance_m, Some(0.0));
                let d = end_distance_m.unwrap();
                assert!((d - 15_000.0).abs() < 1.0, "got {d}");
                assert_eq!(max_distance_m, 11_000.0);
            }
            other => panic!("expected PointUnroutable, got {other:?}"),
        }
    }

    #[test]
    fn both_points_too_far_report_both() {
        let service = service();
        let req = RouteRequest::new(point((0.0, -0.5)), point((0.0, 0.5)));
        let Err(RouteError::PointUnroutable { start_distance_m, end_distance_m, .. }) =
            service.route(&req, None)
        else {
            panic!("expected PointUnroutable");
        };
        assert!(start_distance_m.unwrap() > 50_000.0);
        assert!(end_distance_m.unwrap() > 50_000.0);
    }

    #[test]
    fn empty_graph_is_unroutable() {
        let service = RouteService::new(config()).unwrap();
        let err = service.route(&RouteRequest::new(point(A), point(c())), None).unwrap_err();
        assert_eq!(
            err,
            RouteError::PointUnroutable {
                start_distance_m: None,
                end_distance_m:   None,
                max_distance_m:   11_000.0,
            }
        );
    }

    #[test]
    fn separate_components_no_route() {
        use geo::line_string;
        use rn_graph::Segment;

        let service = RouteService::new(config()).unwrap();
        let mut segments = super::fixtures::abc();
        let (x, y) = (deg(1_000.0), deg(1_000.0));
        segments.push(Segment::new(line_string![(x: x, y: y), (x: x, y: y + deg(10.0))]));
        service.rebuild(segments).unwrap();

        let req = RouteRequest::new(point(A), point((x, y)));
        assert!(matches!(service.route(&req, None), Err(RouteError::NoRouteFound { .. })));
    }

    #[test]
    fn settled_budget_is_timeout() {
        let mut cfg = config();
        cfg.search.max_settled = 1;
        let service = RouteService::new(cfg).unwrap();
        service.rebuild(super::fixtures::abc()).unwrap();

        let req = RouteRequest::new(point(A), point(c()));
        assert_eq!(service.route(&req, None).unwrap_err(), RouteError::RouteTimeout);
    }

    #[test]
    fn cancelled_search_is_timeout() {
        let service = RouteService::new(config()).unwrap();
        service.rebuild(super::fixtures::chain(600)).unwrap();

        let req = RouteRequest::new(point(A), point((600.0 * deg(10.0), 0.0)));
        let cancel = Arc::new(AtomicBool::new(true));
        assert_eq!(service.route(&req, Some(cancel)).unwrap_err(), RouteError::RouteTimeout);

        // Without the flag the same query succeeds.
        assert_eq!(service.route(&req, None).unwrap().segment_count, 600);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = config();
        cfg.snap.max_distance_m = 0.0;
        assert!(RouteService::new(cfg).is_err());
    }
}

// ── Snapshots & rebuilds ──────────────────────────────────────────────────────

#[cfg(test)]
mod rebuild {
    use std::thread;

    use rn_core::RoutingConfig;
    use rn_graph::build_graph;

    use super::fixtures::{A, abc, c, chain, config, point, service};
    use crate::{RouteRequest, RouteService};

    #[test]
    fn generations_increase() {
        let service = RouteService::new(config()).unwrap();
        assert_eq!(service.snapshot().generation, 0);

        let rebuilt = service.rebuild(abc()).unwrap();
        assert_eq!(rebuilt.generation, 1);
        assert_eq!(rebuilt.report.accepted, 2);
        assert_eq!(rebuilt.report.oneway, 1);
        assert_eq!(service.snapshot().generation, 1);

        assert_eq!(service.rebuild(abc()).unwrap().generation, 2);
        assert_eq!(service.snapshot().generation, 2);
    }

    #[test]
    fn concurrent_rebuilds_report_their_own_generation() {
        let service = service();
        let mut seen: Vec<u64> = thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        (0..5).map(|_| service.rebuild(abc()).unwrap().generation).collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });

        seen.sort_unstable();
        // The fixture service starts at generation 1.
        assert_eq!(seen, (2..=21).collect::<Vec<u64>>());
    }

    #[test]
    fn held_snapshot_survives_replacement() {
        let service = service();
        let held = service.snapshot();
        service.rebuild(chain(5)).unwrap();

        assert_eq!(held.graph.vertex_count(), 3);
        assert_eq!(held.index.len(), 3);
        assert_eq!(service.snapshot().graph.vertex_count(), 6);
    }

    #[test]
    fn with_graph_installs() {
        let out = build_graph(&config(), abc()).unwrap();
        let service = RouteService::new(config()).unwrap().with_graph(out.graph);
        assert_eq!(service.snapshot().generation, 1);
        assert!(service.route(&RouteRequest::new(point(A), point(c())), None).is_ok());
    }

    #[test]
    fn queries_during_rebuild_see_whole_graphs() {
        let service = service();
        let req = RouteRequest::new(point(A), point(c()));

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let res = service.route(&req, None).expect("route during rebuild");
                        assert_eq!(res.segment_count, 2);
                        assert!((res.total_cost_s - 20.0).abs() < 1e-6);
                    }
                });
            }
            for _ in 0..10 {
                service.rebuild(abc()).unwrap();
            }
        });

        assert_eq!(service.snapshot().generation, 11);
    }

    #[test]
    fn default_config_service_builds() {
        let service = RouteService::new(RoutingConfig::default()).unwrap();
        let rebuilt = service.rebuild(chain(3)).unwrap();
        assert_eq!(rebuilt.report.accepted, 3);
        assert!(service.health().is_healthy());
    }
}

// ── Documents ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod documents {
    use geojson::GeometryValue;
    use serde_json::json;

    use rn_core::VertexId;

    use super::fixtures::{A, c, config, point, service};
    use crate::{RouteError, RouteRequest, RouteService};

    #[test]
    fn response_is_feature_collection() {
        let res = service().route(&RouteRequest::new(point(A), point(c())), None).unwrap();
        let v = serde_json::to_value(&res).unwrap();

        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["features"].as_array().unwrap().len(), 2);
        assert_eq!(v["features"][0]["type"], "Feature");
        assert_eq!(v["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(v["features"][0]["properties"]["id"], 0);
        assert_eq!(v["features"][0]["properties"]["source_id"], 101);
        assert_eq!(v["features"][1]["properties"]["length_m"], 50.0);
        assert_eq!(v["total_distance_km"], 0.15);
        assert_eq!(v["duration_minutes"], 0.3);
        assert_eq!(v["segment_count"], 2);
        assert_eq!(v["start_vertex"], 0);
        assert_eq!(v["end_vertex"], 2);
    }

    #[test]
    fn feature_geometry_is_line_string() {
        let res = service().route(&RouteRequest::new(point(A), point(c())), None).unwrap();
        let feature = res.features[1].to_feature();
        let geometry = feature.geometry.expect("feature has geometry");
        let GeometryValue::LineString { coordinates } = geometry.value else {
            panic!("expected a LineString, got {:?}", geometry.value);
        };
        assert_eq!(coordinates.len(), res.features[1].coordinates.len());
    }

    #[test]
    fn error_codes_are_distinct() {
        let errors = [
            RouteError::MissingParameter { name: "start_lon" },
            RouteError::InvalidCoordinate { name: "start_lat", value: "x".into() },
            RouteError::PointUnroutable { start_distance_m: None, end_distance_m: None, max_distance_m: 1.0 },
            RouteError::NoRouteFound { start_vertex: VertexId(0), end_vertex: VertexId(1) },
            RouteError::RouteTimeout,
            RouteError::Internal("boom".into()),
        ];
        let codes: Vec<_> = errors.iter().map(RouteError::code).collect();
        assert_eq!(
            codes,
            [
                "MISSING_PARAMETER",
                "INVALID_COORDINATE",
                "POINT_UNROUTABLE",
                "NO_ROUTE_FOUND",
                "ROUTE_TIMEOUT",
                "INTERNAL_ERROR"
            ]
        );
    }

    #[test]
    fn unroutable_body_carries_distances() {
        let err = RouteError::PointUnroutable {
            start_distance_m: Some(12.345),
            end_distance_m:   Some(15_000.04),
            max_distance_m:   11_000.0,
        };
        let v = serde_json::to_value(err.body()).unwrap();
        assert_eq!(v["code"], "POINT_UNROUTABLE");
        assert_eq!(v["start_distance_m"], 12.3);
        assert_eq!(v["end_distance_m"], 15_000.0);
        assert_eq!(v["max_distance_m"], 11_000.0);
        assert!(v["hint"].is_string());
    }

    #[test]
    fn plain_body_omits_distances() {
        let v = serde_json::to_value(RouteError::RouteTimeout.body()).unwrap();
        assert_eq!(v, json!({ "error": "route search exceeded its budget", "code": "ROUTE_TIMEOUT" }));
    }

    #[test]
    fn internal_details_not_exposed() {
        let body = RouteError::Internal("vertex VertexId(9) not found in graph".into()).body();
        assert_eq!(body.error, "internal error");
        assert_eq!(body.code, "INTERNAL_ERROR");
    }

    #[test]
    fn health_report() {
        let empty = RouteService::new(config()).unwrap().health();
        assert_eq!(empty.status, "empty");
        assert!(!empty.is_healthy());
        assert_eq!(empty.generation, 0);

        let h = service().health();
        assert!(h.is_healthy());
        assert_eq!((h.vertices, h.edges, h.components, h.generation), (3, 2, 1, 1));
        assert!(h.built_at > 0);
    }
}
