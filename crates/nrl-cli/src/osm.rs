//! OSM XML writer: renders tagged features as an .osm document.
//!
//! Points become tagged nodes; lines become a run of bare vertex nodes plus
//! one tagged way referencing them. Ids count down from -1000, the usual
//! convention for objects that do not exist upstream yet.

use std::fmt::Write;

use nrl_core::{FlatGeometry, TaggedFeature, Tags};
use quick_xml::escape::escape;

const GENERATOR: &str = concat!("nrl2osm v", env!("CARGO_PKG_VERSION"));
const FIRST_ID: i64 = -1000;

/// Render a full OSM document. Geometry must already be in
/// `[longitude, latitude]` order (see [`crate::projection::reproject`]).
pub fn to_osm_xml(features: &[TaggedFeature]) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<osm version=\"0.6\" generator=\"{}\" upload=\"false\">",
        GENERATOR
    );

    let mut next_id = FIRST_ID;
    let mut node_id = || {
        next_id -= 1;
        next_id
    };

    // Ways reference nodes, so vertex nodes are written as they are handed
    // out and way elements are collected for the tail of the document.
    let mut ways = String::new();

    for feature in features {
        match &feature.geometry {
            FlatGeometry::Point([lon, lat]) => {
                let id = node_id();
                let _ = writeln!(out, "  <node id=\"{id}\" lat=\"{lat:.7}\" lon=\"{lon:.7}\">");
                write_tags(&mut out, &feature.tags);
                out.push_str("  </node>\n");
            }
            FlatGeometry::LineString(vertices) => {
                let mut refs = Vec::with_capacity(vertices.len());
                for [lon, lat] in vertices {
                    let id = node_id();
                    let _ = writeln!(
                        out,
                        "  <node id=\"{id}\" lat=\"{lat:.7}\" lon=\"{lon:.7}\" />"
                    );
                    refs.push(id);
                }
                let id = node_id();
                let _ = writeln!(ways, "  <way id=\"{id}\">");
                for node_ref in refs {
                    let _ = writeln!(ways, "    <nd ref=\"{node_ref}\" />");
                }
                write_tags(&mut ways, &feature.tags);
                ways.push_str("  </way>\n");
            }
        }
    }

    out.push_str(&ways);
    out.push_str("</osm>\n");
    out
}

fn write_tags(out: &mut String, tags: &Tags) {
    for (key, value) in tags {
        if value.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "    <tag k=\"{}\" v=\"{}\" />",
            escape(key.as_str()),
            escape(value.trim())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_point_rendered_as_tagged_node() {
        let xml = to_osm_xml(&[TaggedFeature {
            geometry: FlatGeometry::Point([10.75, 59.91]),
            tags: tags(&[("man_made", "mast"), ("height", "42")]),
        }]);
        assert!(xml.contains("<node id=\"-1001\" lat=\"59.9100000\" lon=\"10.7500000\">"));
        assert!(xml.contains("<tag k=\"man_made\" v=\"mast\" />"));
        assert!(xml.contains("<tag k=\"height\" v=\"42\" />"));
        assert!(xml.ends_with("</osm>\n"));
    }

    #[test]
    fn test_line_rendered_as_way_with_vertex_nodes() {
        let xml = to_osm_xml(&[TaggedFeature {
            geometry: FlatGeometry::LineString(vec![[10.0, 60.0], [10.1, 60.1]]),
            tags: tags(&[("power", "line")]),
        }]);
        assert!(xml.contains("<node id=\"-1001\""));
        assert!(xml.contains("<node id=\"-1002\""));
        assert!(xml.contains("<way id=\"-1003\">"));
        assert!(xml.contains("<nd ref=\"-1001\" />"));
        assert!(xml.contains("<nd ref=\"-1002\" />"));
        assert!(xml.contains("<tag k=\"power\" v=\"line\" />"));
    }

    #[test]
    fn test_tag_values_escaped() {
        let xml = to_osm_xml(&[TaggedFeature {
            geometry: FlatGeometry::Point([10.0, 60.0]),
            tags: tags(&[("description", "Li & Sønn <AS>")]),
        }]);
        assert!(xml.contains("v=\"Li &amp; Sønn &lt;AS&gt;\""));
    }

    #[test]
    fn test_empty_tag_values_skipped() {
        let xml = to_osm_xml(&[TaggedFeature {
            geometry: FlatGeometry::Point([10.0, 60.0]),
            tags: tags(&[("description", "")]),
        }]);
        assert!(!xml.contains("description"));
    }
}
