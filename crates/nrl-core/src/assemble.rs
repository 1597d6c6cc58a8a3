//! Assembly flows: filter one dataset batch by lifecycle status, route
//! points through the tagging engine and lines through the merge engine,
//! and collect the output feature list plus diagnostics.

use std::collections::BTreeMap;

use tracing::debug;

use crate::classify::classify;
use crate::merge::merge_group;
use crate::models::{
    fields, CoreError, Geometry, RawFeature, TaggedFeature, Tags, STATUS_EXISTING, STATUS_PLANNED,
};
use crate::tagging::{tag_feature, truncate_date};

/// Power infrastructure is handled by the power-grid flow, never as plain
/// obstacles.
const POWER_LINE_TYPES: &[&str] = &["høyspent", "lavspent"];
const POWER_MAST_TYPES: &[&str] = &["høyspentmast", "lavspentmast"];

/// Tag keys a power mast keeps from the general tagging engine output.
const POWER_MAST_KEYS: &[&str] = &["power", "height", "ele", "top_ele"];

/// Diagnostics accumulated over one assembly pass.
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    /// Type codes with no tagging-table entry, with occurrence counts.
    pub unknown_types: BTreeMap<String, usize>,
}

impl AssemblyReport {
    fn record(&mut self, unknown_type: Option<String>) {
        if let Some(code) = unknown_type {
            *self.unknown_types.entry(code).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unknown_types.is_empty()
    }
}

/// Result of one assembly pass.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub features: Vec<TaggedFeature>,
    pub report: AssemblyReport,
}

fn passes_status(feature: &RawFeature) -> bool {
    matches!(feature.status(), Some(STATUS_EXISTING) | Some(STATUS_PLANNED))
}

fn is_power_type(code: &str) -> bool {
    POWER_LINE_TYPES.contains(&code) || POWER_MAST_TYPES.contains(&code)
}

/// Obstacle flow: everything except the power network.
///
/// Points are tagged directly. Line segments are grouped by
/// (family, type code, identifier) so fragments of one surveyed element
/// merge back together, then tagged from the group's representative record
/// with the merge-aggregated elevation tags taking precedence.
pub fn assemble_obstacles(features: &[RawFeature]) -> Result<Assembly, CoreError> {
    let mut out = Vec::new();
    let mut report = AssemblyReport::default();
    let mut groups: BTreeMap<(&str, String, String), Vec<RawFeature>> = BTreeMap::new();

    for feature in features {
        if !passes_status(feature) {
            continue;
        }
        let classified = classify(&feature.attributes);
        if classified.is_some_and(|c| is_power_type(c.code)) {
            continue;
        }

        if feature.geometry.is_line() {
            let key = (
                classified.map_or("", |c| c.family.type_key()),
                classified.map_or(String::new(), |c| c.code.to_string()),
                feature.id().unwrap_or_default().to_string(),
            );
            groups.entry(key).or_default().push(feature.clone());
        } else {
            let result = tag_feature(feature);
            report.record(result.unknown_type);
            out.push(TaggedFeature {
                geometry: feature.geometry.strip_elevation(),
                tags: result.tags,
            });
        }
    }

    debug!(line_groups = groups.len(), "assembling obstacle flow");

    for (_, segments) in groups {
        for line in merge_group(segments)? {
            let representative = RawFeature::new(
                Geometry::LineString(line.vertices),
                line.representative,
            );
            let mut result = tag_feature(&representative);
            report.record(result.unknown_type);
            if line.summary.saw_anything() {
                for key in ["height", "ele", "top_ele"] {
                    result.tags.remove(key);
                }
                result.tags.extend(line.summary.derived_tags());
            }
            out.push(TaggedFeature {
                geometry: representative.geometry.strip_elevation(),
                tags: result.tags,
            });
        }
    }

    Ok(Assembly { features: out, report })
}

/// Power-network flow: high/low-voltage masts and spans only.
///
/// Masts keep a curated subset of the engine output. Spans are grouped by
/// declared network name (unnamed spans fall back to their identifier) and
/// merged chains get a fixed minimal tag set instead of the general engine
/// output.
pub fn assemble_power_grid(features: &[RawFeature]) -> Result<Assembly, CoreError> {
    let mut out = Vec::new();
    let mut report = AssemblyReport::default();
    let mut groups: BTreeMap<String, Vec<RawFeature>> = BTreeMap::new();

    for feature in features {
        if !passes_status(feature) {
            continue;
        }
        let Some(classified) = classify(&feature.attributes) else {
            continue;
        };

        if POWER_MAST_TYPES.contains(&classified.code) && !feature.geometry.is_line() {
            let result = tag_feature(feature);
            report.record(result.unknown_type);
            let mut tags = result.tags;
            tags.retain(|key, _| {
                POWER_MAST_KEYS.contains(&key.as_str()) || key.starts_with("aeroway:light")
            });
            out.push(TaggedFeature {
                geometry: feature.geometry.strip_elevation(),
                tags,
            });
        } else if POWER_LINE_TYPES.contains(&classified.code) && feature.geometry.is_line() {
            let key = feature
                .name()
                .filter(|name| !name.is_empty())
                .or(feature.id())
                .unwrap_or_default()
                .to_string();
            groups.entry(key).or_default().push(feature.clone());
        }
    }

    debug!(networks = groups.len(), "assembling power-grid flow");

    for (_, segments) in groups {
        for line in merge_group(segments)? {
            let representative =
                RawFeature::new(Geometry::LineString(line.vertices), line.representative);
            let mut tags = Tags::new();
            tags.insert("power".to_string(), "line".to_string());
            if let Some(name) = representative.name() {
                if !name.is_empty() && Some(name) != representative.id() {
                    tags.insert("name".to_string(), name.to_string());
                }
            }
            if let Some(classified) = classify(&representative.attributes) {
                tags.insert("OBSTACLE_TYPE".to_string(), classified.code.to_string());
            }
            if let Some(status) = representative.status() {
                tags.insert("STATUS".to_string(), status.to_string());
            }
            for (field, tag) in [
                (fields::DATE_SURVEY, "DATE_SURVEY"),
                (fields::DATE_REGISTERED, "DATE_CREATE"),
                (fields::DATE_UPDATED, "DATE_UPDATE"),
            ] {
                if let Some(value) = representative.attr(field) {
                    tags.insert(tag.to_string(), truncate_date(value));
                }
            }
            tags.extend(line.summary.derived_tags());
            out.push(TaggedFeature {
                geometry: representative.geometry.strip_elevation(),
                tags,
            });
        }
    }

    Ok(Assembly { features: out, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, FlatGeometry};

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn point(pairs: &[(&str, &str)]) -> RawFeature {
        RawFeature::new(Geometry::Point([100.0, 200.0, 30.0]), attrs(pairs))
    }

    fn line(vertices: Vec<[f64; 3]>, pairs: &[(&str, &str)]) -> RawFeature {
        RawFeature::new(Geometry::LineString(vertices), attrs(pairs))
    }

    #[test]
    fn test_status_filter_drops_removed_features() {
        let features = vec![
            point(&[("punktType", "tårn"), ("status", "eksisterende")]),
            point(&[("punktType", "tårn"), ("status", "planlagtOppført")]),
            point(&[("punktType", "tårn"), ("status", "fjernet")]),
            point(&[("punktType", "tårn")]),
        ];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(assembly.features.len(), 2);
    }

    #[test]
    fn test_power_types_excluded_from_obstacle_flow() {
        let features = vec![
            point(&[("mastType", "høyspentmast"), ("status", "eksisterende")]),
            line(
                vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
                &[("luftspennType", "høyspent"), ("status", "eksisterende")],
            ),
            point(&[("mastType", "telemast"), ("status", "eksisterende")]),
        ];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(assembly.features.len(), 1);
        assert_eq!(
            assembly.features[0].tags.get("OBSTACLE_TYPE").map(String::as_str),
            Some("telemast")
        );
    }

    #[test]
    fn test_point_geometry_is_flattened() {
        let features = vec![point(&[("punktType", "tårn"), ("status", "eksisterende")])];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(
            assembly.features[0].geometry,
            FlatGeometry::Point([100.0, 200.0])
        );
    }

    #[test]
    fn test_line_fragments_merge_within_identifier_group() {
        let shared = &[
            ("luftspennType", "taubane"),
            ("status", "eksisterende"),
            ("lokalId", "abc-1"),
        ][..];
        let features = vec![
            line(vec![[0.0, 0.0, 10.0], [1.0, 0.0, 12.0]], shared),
            line(vec![[1.0, 0.0, 12.0], [2.0, 0.0, 14.0]], shared),
            // Different identifier: stays its own line even though adjacent.
            line(
                vec![[2.0, 0.0, 14.0], [3.0, 0.0, 16.0]],
                &[
                    ("luftspennType", "taubane"),
                    ("status", "eksisterende"),
                    ("lokalId", "abc-2"),
                ],
            ),
        ];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(assembly.features.len(), 2);
    }

    #[test]
    fn test_merged_line_elevation_overrides_representative() {
        let features = vec![
            line(
                vec![[0.0, 0.0, 10.0], [1.0, 0.0, 12.0]],
                &[
                    ("luftspennType", "taubane"),
                    ("status", "eksisterende"),
                    ("lokalId", "abc-1"),
                    ("vertikalAvstand", "8"),
                ],
            ),
            line(
                vec![[1.0, 0.0, 12.0], [2.0, 0.0, 40.0]],
                &[
                    ("luftspennType", "taubane"),
                    ("status", "eksisterende"),
                    ("lokalId", "abc-1"),
                    ("vertikalAvstand", "11"),
                ],
            ),
        ];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(assembly.features.len(), 1);
        let tags = &assembly.features[0].tags;
        // Heights disagree across the chain, so no height survives even
        // though the representative record declares one.
        assert!(!tags.contains_key("height"));
        assert_eq!(tags.get("ele").map(String::as_str), Some("40"));
    }

    #[test]
    fn test_unknown_type_counted_once_per_occurrence() {
        let features = vec![
            point(&[("punktType", "romheis"), ("status", "eksisterende")]),
            point(&[("punktType", "romheis"), ("status", "eksisterende")]),
        ];
        let assembly = assemble_obstacles(&features).unwrap();
        assert_eq!(assembly.report.unknown_types.get("romheis"), Some(&2));
        assert_eq!(assembly.features.len(), 2);
    }

    #[test]
    fn test_power_mast_keeps_curated_keys_only() {
        let features = vec![point(&[
            ("mastType", "høyspentmast"),
            ("status", "eksisterende"),
            ("lokalId", "m-1"),
            ("navn", "Mast 42"),
            ("vertikalAvstand", "31"),
            ("luftfartshinderlyssetting", "fastRødt"),
        ])];
        let assembly = assemble_power_grid(&features).unwrap();
        assert_eq!(assembly.features.len(), 1);
        let tags = &assembly.features[0].tags;
        assert_eq!(tags.get("power").map(String::as_str), Some("tower"));
        assert_eq!(tags.get("height").map(String::as_str), Some("31"));
        assert_eq!(tags.get("aeroway:light").map(String::as_str), Some("obstacle"));
        assert!(!tags.contains_key("ref:nrl"));
        assert!(!tags.contains_key("description"));
        assert!(!tags.contains_key("STATUS"));
        assert!(!tags.contains_key("OBSTACLE_TYPE"));
    }

    #[test]
    fn test_power_lines_group_by_name_across_identifiers() {
        let features = vec![
            line(
                vec![[0.0, 0.0, 100.0], [1.0, 0.0, 110.0]],
                &[
                    ("luftspennType", "høyspent"),
                    ("status", "eksisterende"),
                    ("navn", "Nettlinje Vest"),
                    ("lokalId", "s-1"),
                    ("oppdateringsdato", "2024-05-01T00:00:00"),
                ],
            ),
            line(
                vec![[1.0, 0.0, 110.0], [2.0, 0.0, 120.0]],
                &[
                    ("luftspennType", "høyspent"),
                    ("status", "eksisterende"),
                    ("navn", "Nettlinje Vest"),
                    ("lokalId", "s-2"),
                    ("oppdateringsdato", "2024-05-01T00:00:00"),
                ],
            ),
        ];
        let assembly = assemble_power_grid(&features).unwrap();
        assert_eq!(assembly.features.len(), 1);
        let tags = &assembly.features[0].tags;
        assert_eq!(tags.get("power").map(String::as_str), Some("line"));
        assert_eq!(tags.get("name").map(String::as_str), Some("Nettlinje Vest"));
        assert_eq!(tags.get("STATUS").map(String::as_str), Some("eksisterende"));
        assert_eq!(
            tags.get("OBSTACLE_TYPE").map(String::as_str),
            Some("høyspent")
        );
        assert_eq!(tags.get("DATE_UPDATE").map(String::as_str), Some("2024-05-01"));
        assert_eq!(tags.get("ele").map(String::as_str), Some("120"));
        // The fixed tag set leaves the general engine's category tags out.
        assert!(!tags.contains_key("ref:nrl"));
    }

    #[test]
    fn test_power_flow_ignores_non_power_features() {
        let features = vec![
            point(&[("punktType", "tårn"), ("status", "eksisterende")]),
            line(
                vec![[0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
                &[("luftspennType", "taubane"), ("status", "eksisterende")],
            ),
        ];
        let assembly = assemble_power_grid(&features).unwrap();
        assert!(assembly.features.is_empty());
    }
}
