//! Route response document.
//!
//! Serialized as a GeoJSON `FeatureCollection`: one `LineString` feature per
//! traversed edge, in travel order, with the route totals as foreign members.
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "features": [
//!     { "type": "Feature",
//!       "geometry": { "type": "LineString", "coordinates": [[..], [..]] },
//!       "properties": { "id": 0, "source_id": 17, "length_m": 100.0 } }
//!   ],
//!   "total_distance_km": 0.15,
//!   "duration_minutes": 0.3,
//!   "total_cost_s": 20.0,
//!   "segment_count": 2,
//!   "start_vertex": 0,
//!   "end_vertex": 2,
//!   "start_distance_m": 3.2,
//!   "end_distance_m": 0.0
//! }
//! ```

use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue, json};

use rn_core::{EdgeId, VertexId};
use rn_graph::{RoadGraph, Route, Snap};

/// One traversed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFeature {
    pub edge_id:     EdgeId,
    pub source_id:   Option<i64>,
    /// Lon/lat points oriented in the direction of travel.
    pub coordinates: Vec<Coord<f64>>,
    /// Rounded to 2 decimals.
    pub length_m:    f64,
}

impl RouteFeature {
    pub fn to_feature(&self) -> Feature {
        let line = LineString::new(self.coordinates.clone());
        let mut properties = Map::<String, JsonValue>::new();
        properties.insert("id".into(), json!(self.edge_id));
        properties.insert("source_id".into(), json!(self.source_id));
        properties.insert("length_m".into(), json!(self.length_m));

        Feature {
            bbox:            None,
            geometry:        Some(Geometry::new(GeometryValue::from(&line))),
            id:              None,
            properties:      Some(properties),
            foreign_members: None,
        }
    }
}

/// A successful route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub features:          Vec<RouteFeature>,
    /// Sum of edge lengths, rounded to 3 decimals.
    pub total_distance_km: f64,
    /// Aggregate cost in minutes, rounded to 1 decimal.
    pub duration_minutes:  f64,
    pub total_cost_s:      f64,
    pub segment_count:     usize,
    pub start_vertex:      VertexId,
    pub end_vertex:        VertexId,
    /// Snap distances of the two query points, rounded to 1 decimal.
    pub start_distance_m:  f64,
    pub end_distance_m:    f64,
}

impl RouteResponse {
    pub fn from_route(graph: &RoadGraph, route: &Route, start: Snap, end: Snap) -> Self {
        let features: Vec<RouteFeature> = route
            .steps
            .iter()
            .map(|step| {
                let edge = graph.edge(step.edge);
                let mut coordinates = edge.geometry.0.clone();
                if !step.forward {
                    coordinates.reverse();
                }
                RouteFeature {
                    edge_id: step.edge,
                    source_id: edge.source_id,
                    coordinates,
                    length_m: round_to(edge.length_m, 2),
                }
            })
            .collect();

        Self {
            segment_count:     features.len(),
            total_distance_km: round_to(route.length_m(graph) / 1000.0, 3),
            duration_minutes:  round_to(route.total_cost_s / 60.0, 1),
            total_cost_s:      route.total_cost_s,
            start_vertex:      start.vertex,
            end_vertex:        end.vertex,
            start_distance_m:  round_to(start.distance_m, 1),
            end_distance_m:    round_to(end.distance_m, 1),
            features,
        }
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        let mut members = Map::<String, JsonValue>::new();
        members.insert("total_distance_km".into(), json!(self.total_distance_km));
        members.insert("duration_minutes".into(), json!(self.duration_minutes));
        members.insert("total_cost_s".into(), json!(self.total_cost_s));
        members.insert("segment_count".into(), json!(self.segment_count));
        members.insert("start_vertex".into(), json!(self.start_vertex));
        members.insert("end_vertex".into(), json!(self.end_vertex));
        members.insert("start_distance_m".into(), json!(self.start_distance_m));
        members.insert("end_distance_m".into(), json!(self.end_distance_m));

        FeatureCollection {
            bbox:            None,
            features:        self.features.iter().map(RouteFeature::to_feature).collect(),
            foreign_members: Some(members),
        }
    }
}

impl Serialize for RouteResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}
