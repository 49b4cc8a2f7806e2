//! Route request parameters and their validation.
//!
//! Parameters are checked in the order `start_lon`, `start_lat`, `end_lon`,
//! `end_lat`; the first problem found is reported.

use serde::Deserialize;

use rn_core::GeoPoint;

use crate::error::{RouteError, RouteResult};

const NAMES: [&str; 4] = ["start_lon", "start_lat", "end_lon", "end_lat"];

/// A route query as four optional numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteRequest {
    pub start_lon: Option<f64>,
    pub start_lat: Option<f64>,
    pub end_lon:   Option<f64>,
    pub end_lat:   Option<f64>,
}

impl RouteRequest {
    pub fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self {
            start_lon: Some(start.lon),
            start_lat: Some(start.lat),
            end_lon:   Some(end.lon),
            end_lat:   Some(end.lat),
        }
    }

    /// Start and end points, or the first missing / invalid parameter.
    pub fn validate(&self) -> RouteResult<(GeoPoint, GeoPoint)> {
        let values = [self.start_lon, self.start_lat, self.end_lon, self.end_lat];
        let mut checked = [0.0; 4];

        for (i, (name, value)) in NAMES.into_iter().zip(values).enumerate() {
            let v = value.ok_or(RouteError::MissingParameter { name })?;
            let limit = if i % 2 == 0 { 180.0 } else { 90.0 };
            if !v.is_finite() || v.abs() > limit {
                return Err(RouteError::InvalidCoordinate { name, value: v.to_string() });
            }
            checked[i] = v;
        }

        Ok((
            GeoPoint::new(checked[0], checked[1]),
            GeoPoint::new(checked[2], checked[3]),
        ))
    }
}

/// Query-string form: every parameter as optional text.
///
/// An empty value counts as missing; text that is not a number is an
/// `InvalidCoordinate` rather than a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRouteQuery {
    pub start_lon: Option<String>,
    pub start_lat: Option<String>,
    pub end_lon:   Option<String>,
    pub end_lat:   Option<String>,
}

impl RawRouteQuery {
    /// Collect from decoded `key=value` pairs.  Unknown keys are ignored; a
    /// repeated key keeps every value, comma-joined, so it fails to parse as
    /// one number and surfaces as that parameter's `InvalidCoordinate`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "start_lon" => &mut raw.start_lon,
                "start_lat" => &mut raw.start_lat,
                "end_lon" => &mut raw.end_lon,
                "end_lat" => &mut raw.end_lat,
                _ => continue,
            };
            if let Some(existing) = slot.as_mut() {
                existing.push(',');
                existing.push_str(&value);
            } else {
                *slot = Some(value);
            }
        }
        raw
    }
}

impl TryFrom<RawRouteQuery> for RouteRequest {
    type Error = RouteError;

    fn try_from(raw: RawRouteQuery) -> RouteResult<Self> {
        let texts = [raw.start_lon, raw.start_lat, raw.end_lon, raw.end_lat];
        let mut values = [None; 4];

        for (i, (name, text)) in NAMES.into_iter().zip(texts).enumerate() {
            match parse_param(name, text) {
                Ok(v) => values[i] = v,
                // An earlier missing parameter outranks this one; `validate`
                // reports it.
                Err(_) if values[..i].iter().any(Option::is_none) => {}
                Err(e) => return Err(e),
            }
        }

        let [start_lon, start_lat, end_lon, end_lat] = values;
        Ok(Self { start_lon, start_lat, end_lon, end_lat })
    }
}

fn parse_param(name: &'static str, raw: Option<String>) -> RouteResult<Option<f64>> {
    let Some(text) = raw else { return Ok(None) };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| RouteError::InvalidCoordinate { name, value: text.to_owned() })
}
