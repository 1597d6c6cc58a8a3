//! Core data models for the obstacle conversion pipeline.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

/// Raw survey attributes keyed by their normalized source field names.
pub type Attributes = HashMap<String, String>;

/// Output tags, ordered so writers and tests are deterministic.
pub type Tags = BTreeMap<String, String>;

/// Well-known attribute field names from the obstacle register schema.
pub mod fields {
    pub const STATUS: &str = "status";
    pub const NAME: &str = "navn";
    pub const LOCAL_ID: &str = "lokalId";
    /// Declared vertical extent of the object, in meters.
    pub const VERTICAL_EXTENT: &str = "vertikalAvstand";
    /// Whether the surveyed elevation refers to the top or the foot of the object.
    pub const HEIGHT_REFERENCE: &str = "høydereferanse";
    pub const LIGHTING: &str = "luftfartshinderlyssetting";
    pub const DATE_SURVEY: &str = "datafangstdato";
    pub const DATE_REGISTERED: &str = "registreringsdato";
    pub const DATE_UPDATED: &str = "oppdateringsdato";
}

/// Lifecycle status values that pass the assembly filter.
pub const STATUS_EXISTING: &str = "eksisterende";
pub const STATUS_PLANNED: &str = "planlagtOppført";

/// Height reference value meaning the elevation was surveyed at the top of the object.
pub const HEIGHT_REFERENCE_TOP: &str = "topp";

/// Source geometry with elevation, in the dataset's projected coordinates.
///
/// Coordinates are `(easting, northing, elevation)` triples; the elevation is
/// the terrain surface at the vertex, in meters.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point([f64; 3]),
    LineString(Vec<[f64; 3]>),
}

impl Geometry {
    pub fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString(_))
    }

    /// Elevation of the highest vertex.
    pub fn top_elevation(&self) -> Option<f64> {
        match self {
            Geometry::Point(p) => Some(p[2]),
            Geometry::LineString(vertices) => vertices
                .iter()
                .map(|v| v[2])
                .fold(None, |top: Option<f64>, z| match top {
                    Some(t) if t >= z => Some(t),
                    _ => Some(z),
                }),
        }
    }

    /// Drop elevations, leaving 2-D output geometry.
    pub fn strip_elevation(&self) -> FlatGeometry {
        match self {
            Geometry::Point(p) => FlatGeometry::Point([p[0], p[1]]),
            Geometry::LineString(vertices) => {
                FlatGeometry::LineString(vertices.iter().map(|v| [v[0], v[1]]).collect())
            }
        }
    }
}

/// Two-dimensional output geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FlatGeometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

/// One decoded feature from the source dataset. Read-only input to the core.
#[derive(Debug, Clone)]
pub struct RawFeature {
    pub geometry: Geometry,
    pub attributes: Attributes,
}

impl RawFeature {
    pub fn new(geometry: Geometry, attributes: Attributes) -> Self {
        Self { geometry, attributes }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr(fields::LOCAL_ID)
    }

    pub fn name(&self) -> Option<&str> {
        self.attr(fields::NAME)
    }

    pub fn status(&self) -> Option<&str> {
        self.attr(fields::STATUS)
    }

    /// Declared vertical extent in meters, if present and numeric.
    pub fn height(&self) -> Option<f64> {
        self.attr(fields::VERTICAL_EXTENT)?.parse().ok()
    }

    pub fn height_reference(&self) -> Option<&str> {
        self.attr(fields::HEIGHT_REFERENCE)
    }

    pub fn light_code(&self) -> Option<&str> {
        self.attr(fields::LIGHTING)
    }
}

/// Output feature: 2-D geometry plus OSM-ready tags.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedFeature {
    pub geometry: FlatGeometry,
    pub tags: Tags,
}

/// Aggregation cell distinguishing "never seen", "one consistent value" and
/// disagreement between constituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uniform<T> {
    #[default]
    Unset,
    Value(T),
    Mixed,
}

impl<T: PartialEq> Uniform<T> {
    pub fn observe(&mut self, value: T) {
        *self = match std::mem::replace(self, Uniform::Mixed) {
            Uniform::Unset => Uniform::Value(value),
            Uniform::Value(seen) if seen == value => Uniform::Value(seen),
            _ => Uniform::Mixed,
        };
    }

    /// Force disagreement, e.g. when a constituent lacks the value entirely.
    pub fn invalidate(&mut self) {
        *self = Uniform::Mixed;
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Uniform::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Uniform::Unset)
    }
}

/// Errors from the conversion core.
///
/// Missing optional attributes are never errors; the only hard failure is
/// geometry the upstream decoder should have rejected.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed geometry: {reason}")]
    MalformedGeometry { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_elevation_picks_highest_vertex() {
        let line = Geometry::LineString(vec![
            [0.0, 0.0, 12.0],
            [1.0, 0.0, 47.5],
            [2.0, 0.0, 31.0],
        ]);
        assert_eq!(line.top_elevation(), Some(47.5));

        let point = Geometry::Point([5.0, 5.0, 99.0]);
        assert_eq!(point.top_elevation(), Some(99.0));
    }

    #[test]
    fn test_strip_elevation() {
        let line = Geometry::LineString(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(
            line.strip_elevation(),
            FlatGeometry::LineString(vec![[1.0, 2.0], [4.0, 5.0]])
        );
    }

    #[test]
    fn test_uniform_observation() {
        let mut cell = Uniform::default();
        assert!(cell.is_unset());

        cell.observe(15.0);
        assert_eq!(cell.value(), Some(&15.0));

        cell.observe(15.0);
        assert_eq!(cell.value(), Some(&15.0));

        cell.observe(20.0);
        assert_eq!(cell.value(), None);
        assert_eq!(cell, Uniform::Mixed);
    }

    #[test]
    fn test_uniform_invalidate() {
        let mut cell = Uniform::Value("topp".to_string());
        cell.invalidate();
        assert_eq!(cell.value(), None);
    }
}
