//! Routing configuration.
//!
//! A [`RoutingConfig`] is usually read from a TOML file:
//!
//! ```toml
//! [speeds]
//! default_kmh = 30.0
//!
//! [speeds.classes]
//! primary     = 60.0
//! residential = 30.0
//!
//! [oneway]
//! precedence = "tag_first"
//!
//! [snap]
//! max_distance_m = 11000.0
//!
//! [search]
//! max_settled     = 1000000
//! max_duration_ms = 2000
//! ```
//!
//! Every section and field is optional; missing values fall back to the
//! defaults documented on each type.  Call [`RoutingConfig::validate`] (the
//! loaders do) before handing the config to the cost model.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Top-level configuration for graph building and route queries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    pub speeds: SpeedConfig,
    pub oneway: OnewayConfig,
    pub snap:   SnapConfig,
    pub search: SearchConfig,
}

impl RoutingConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: RoutingConfig =
            toml::from_str(s).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations that would produce zero, negative, or
    /// non-finite costs, or an unusable search budget.
    pub fn validate(&self) -> CoreResult<()> {
        self.speeds.validate()?;
        if !(self.snap.max_distance_m.is_finite() && self.snap.max_distance_m > 0.0) {
            return Err(CoreError::Config(format!(
                "snap.max_distance_m must be a positive number, got {}",
                self.snap.max_distance_m
            )));
        }
        if self.search.max_settled == 0 {
            return Err(CoreError::Config("search.max_settled must be at least 1".into()));
        }
        Ok(())
    }
}

// ── Speeds ────────────────────────────────────────────────────────────────────

/// Road class → travel speed lookup with an explicit default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeedConfig {
    /// Speed for classes missing from `classes` (and segments with no class).
    pub default_kmh: f64,
    /// Per-class speeds in km/h.  Keys are matched case-sensitively.
    pub classes: BTreeMap<String, f64>,
}

impl SpeedConfig {
    /// Resolve the speed for a road class.
    pub fn speed_kmh(&self, class: Option<&str>) -> f64 {
        class
            .and_then(|c| self.classes.get(c))
            .copied()
            .unwrap_or(self.default_kmh)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let check = |name: &str, kmh: f64| {
            if kmh.is_finite() && kmh > 0.0 {
                Ok(())
            } else {
                Err(CoreError::Config(format!(
                    "speed for {name} must be a positive number of km/h, got {kmh}"
                )))
            }
        };
        check("default", self.default_kmh)?;
        for (class, &kmh) in &self.classes {
            check(&format!("class {class:?}"), kmh)?;
        }
        Ok(())
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        let classes = [
            ("motorway", 100.0),
            ("trunk", 80.0),
            ("primary", 60.0),
            ("secondary", 50.0),
            ("tertiary", 40.0),
            ("residential", 30.0),
            ("living_street", 10.0),
            ("service", 20.0),
            ("unclassified", 30.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();

        Self { default_kmh: 30.0, classes }
    }
}

// ── One-way resolution ────────────────────────────────────────────────────────

/// Segments can carry a one-way indicator in two raw attributes: a textual
/// tag (`"yes"`, `"no"`, `"-1"`, …) and a boolean flag.  When both are
/// present and disagree, this rule decides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnewayPrecedence {
    /// Use the tag when it is recognised; otherwise the flag.
    #[default]
    TagFirst,
    /// Use the flag when present; otherwise the tag.
    FlagFirst,
    /// One-way if either attribute says so.
    Either,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OnewayConfig {
    pub precedence: OnewayPrecedence,
}

// ── Snapping ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapConfig {
    /// Query points farther than this from every vertex are unroutable.
    /// Default 11 km (≈ 0.1° of latitude).
    pub max_distance_m: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self { max_distance_m: 11_000.0 }
    }
}

// ── Search budget ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Maximum number of vertices a single search may settle.
    pub max_settled: usize,
    /// Optional wall-clock limit per search.
    pub max_duration_ms: Option<u64>,
}

impl SearchConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_settled: 1_000_000, max_duration_ms: None }
    }
}
