//! Edge cost model: length and road class → traversal time.
//!
//! ```text
//! forward_cost = length_m / (speed_kmh × 1000 / 3600)      seconds
//! reverse_cost = forward_cost          (two-way)
//!              = REVERSE_SENTINEL      (one-way, forward only)
//! ```
//!
//! Backward one-way segments never reach the cost model as such: the
//! topology builder reverses their geometry first, so they are costed as
//! forward one-ways.

use rn_core::{CoreResult, SpeedConfig};

use crate::segment::Direction;

/// Reverse cost of an edge that may not be traversed end → start.
pub const REVERSE_SENTINEL: f64 = -1.0;

/// Forward and reverse traversal costs of one edge, in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeCost {
    pub forward_s: f64,
    pub reverse_s: f64,
}

impl EdgeCost {
    /// Usable start → end.
    #[inline]
    pub fn forward_usable(self) -> bool {
        self.forward_s > 0.0
    }

    /// Usable end → start.
    #[inline]
    pub fn reverse_usable(self) -> bool {
        self.reverse_s != REVERSE_SENTINEL && self.reverse_s > 0.0
    }
}

/// Validated class → speed lookup.
#[derive(Clone, Debug)]
pub struct CostModel {
    speeds: SpeedConfig,
}

impl CostModel {
    /// Fails with `CoreError::Config` if any configured speed is not a
    /// positive finite number.
    pub fn new(speeds: SpeedConfig) -> CoreResult<Self> {
        speeds.validate()?;
        Ok(Self { speeds })
    }

    pub fn speed_kmh(&self, class: Option<&str>) -> f64 {
        self.speeds.speed_kmh(class)
    }

    /// Costs for an edge of `length_m` metres.
    ///
    /// `direction` must already be normalised to `Both` or `Forward`.
    pub fn costs(&self, length_m: f64, class: Option<&str>, direction: Direction) -> EdgeCost {
        let speed_mps = self.speed_kmh(class) * 1000.0 / 3600.0;
        let forward_s = length_m / speed_mps;
        let reverse_s = if direction.is_oneway() { REVERSE_SENTINEL } else { forward_s };
        EdgeCost { forward_s, reverse_s }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self { speeds: SpeedConfig::default() }
    }
}
