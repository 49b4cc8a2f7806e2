//! Geographic coordinate type, distances, and planar projections.
//!
//! Coordinates are double precision.  Vertex deduplication compares
//! coordinates bit for bit, so nothing here rounds or snaps.
//!
//! Two projections are used:
//!
//! - **Local equirectangular** for segment lengths ([`planar_length_m`]).
//!   The plane is centred on the line's mean latitude, which keeps
//!   city-scale segments within a fraction of a percent of their true length.
//! - **Web Mercator** (EPSG:3857) for the spatial tree.  It is conformal, so
//!   nearest-neighbour ordering is preserved locally; reported snap distances
//!   are always haversine metres, never Mercator units.

use std::fmt;

use geo::{Coord, LineString};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Web Mercator sphere radius (EPSG:3857).
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Half the Web Mercator world width: `x` spans `[-W, W]` and wraps at the
/// antimeridian.
pub const MERCATOR_HALF_WIDTH_M: f64 = std::f64::consts::PI * MERCATOR_RADIUS_M;

/// Web Mercator is undefined at the poles; latitudes are clamped to this.
const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// A WGS-84 coordinate, longitude first (GeoJSON order).
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` if both components are finite and inside the WGS-84 range.
    pub fn is_valid(self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Exact-equality key.  `-0.0` and `0.0` are distinct keys.
    #[inline]
    pub fn bits(self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Project to Web Mercator `[x, y]` metres.
    pub fn to_web_mercator(self) -> [f64; 2] {
        let lat = self.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
        let x = MERCATOR_RADIUS_M * self.lon.to_radians();
        let y = MERCATOR_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat * 0.5).tan().ln();
        [x, y]
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(c: Coord<f64>) -> Self {
        Self { lon: c.x, lat: c.y }
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Coord { x: p.lon, y: p.lat }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Length of a lon/lat polyline in metres, measured in a local
/// equirectangular plane centred on the line's mean latitude.
///
/// Longitude steps take the short way round, so a segment crossing the
/// antimeridian is measured across it.  Returns `0.0` for lines with fewer
/// than two points.
pub fn planar_length_m(line: &LineString<f64>) -> f64 {
    let n = line.0.len();
    if n < 2 {
        return 0.0;
    }

    let mean_lat = line.0.iter().map(|c| c.y).sum::<f64>() / n as f64;
    let m_per_deg = EARTH_RADIUS_M.to_radians();
    let kx = m_per_deg * mean_lat.to_radians().cos();
    let ky = m_per_deg;

    line.lines()
        .map(|l| (wrap_lon_delta(l.dx()) * kx).hypot(l.dy() * ky))
        .sum()
}

/// Fold a longitude difference into `[-180, 180)`.
#[inline]
pub fn wrap_lon_delta(d_lon: f64) -> f64 {
    (d_lon + 180.0).rem_euclid(360.0) - 180.0
}
