//! Raw street segments, the input of the topology builder.

use geo::Geometry;

use rn_core::OnewayPrecedence;

/// One street segment as supplied by the upstream data store.
///
/// Transient: consumed once by [`TopologyBuilder`](crate::TopologyBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Identifier in the upstream store, carried through to the response.
    pub source_id:   Option<i64>,
    /// Lon/lat geometry.  `LineString` and `MultiLineString` are accepted.
    pub geometry:    Geometry<f64>,
    /// Road class / subtype used for the speed lookup.
    pub class:       Option<String>,
    /// Textual one-way tag (`yes`, `no`, `-1`, …).
    pub oneway_tag:  Option<String>,
    /// Boolean one-way flag from a second attribute.
    pub oneway_flag: Option<bool>,
}

impl Segment {
    /// A two-way segment with no class and no source id.
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            source_id:   None,
            geometry:    geometry.into(),
            class:       None,
            oneway_tag:  None,
            oneway_flag: None,
        }
    }

    pub fn with_source_id(mut self, id: i64) -> Self {
        self.source_id = Some(id);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_oneway_tag(mut self, tag: impl Into<String>) -> Self {
        self.oneway_tag = Some(tag.into());
        self
    }

    pub fn with_oneway_flag(mut self, flag: bool) -> Self {
        self.oneway_flag = Some(flag);
        self
    }

    /// Traversal direction after applying `precedence` to the two raw
    /// one-way attributes.
    pub fn direction(&self, precedence: OnewayPrecedence) -> Direction {
        resolve_direction(self.oneway_tag.as_deref(), self.oneway_flag, precedence)
    }
}

/// Which way a segment may be traversed relative to its digitised order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Both,
    /// Start → end only.
    Forward,
    /// End → start only.  Stored reversed by the builder.
    Backward,
}

impl Direction {
    pub fn is_oneway(self) -> bool {
        !matches!(self, Direction::Both)
    }
}

/// Interpret a textual one-way tag.  Unknown values are `None`.
fn parse_tag(tag: &str) -> Option<Direction> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "forward" => Some(Direction::Forward),
        "-1" | "reverse" | "backward" => Some(Direction::Backward),
        "no" | "false" | "0" | "both" => Some(Direction::Both),
        _ => None,
    }
}

/// Combine the tag and the flag under `precedence`.
///
/// `Either` is one-way if either source says so; a backward tag keeps its
/// direction even when the flag is also set, since the flag cannot express
/// direction.
pub fn resolve_direction(
    tag: Option<&str>,
    flag: Option<bool>,
    precedence: OnewayPrecedence,
) -> Direction {
    let from_tag = tag.and_then(parse_tag);
    let from_flag = flag.map(|f| if f { Direction::Forward } else { Direction::Both });

    match precedence {
        OnewayPrecedence::TagFirst => from_tag.or(from_flag).unwrap_or_default(),
        OnewayPrecedence::FlagFirst => from_flag.or(from_tag).unwrap_or_default(),
        OnewayPrecedence::Either => match (from_tag, from_flag) {
            (Some(Direction::Backward), _) => Direction::Backward,
            (Some(Direction::Forward), _) | (_, Some(Direction::Forward)) => Direction::Forward,
            _ => Direction::Both,
        },
    }
}
