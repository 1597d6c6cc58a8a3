//! GML decoding: pull-parses the register's feature collection into the raw
//! features the core consumes.
//!
//! Namespace prefixes are stripped; every leaf element's text lands in the
//! attribute map under its local name, which is exactly the normalized field
//! naming the core expects. Geometry arrives through `gml:pos` (points) and
//! `gml:posList` (lines/rings) as space-separated coordinate triples.

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use nrl_core::{Attributes, Geometry, RawFeature};

/// Feature elements recognised in the collection, one per schema family.
const FEATURE_ELEMENTS: &[&str] = &["NrlPunkt", "NrlMast", "NrlLuftspenn", "NrlLinje", "NrlFlate"];

#[derive(Debug, Default)]
struct Builder {
    element: String,
    attributes: Attributes,
    vertices: Vec<[f64; 3]>,
    is_line: bool,
}

/// Decode a feature collection, dropping features whose validity date has
/// passed.
pub fn parse_features(xml: &str) -> Result<Vec<RawFeature>> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    parse_features_at(xml, &today)
}

/// Decoding with an explicit "today", so the expiry filter is testable.
pub fn parse_features_at(xml: &str, today: &str) -> Result<Vec<RawFeature>> {
    let mut reader = Reader::from_str(xml);
    let mut features = Vec::new();
    let mut current: Option<Builder> = None;
    let mut leaf: Option<String> = None;
    let mut in_position = false;

    loop {
        match reader.read_event().context("reading GML event")? {
            Event::Start(e) => {
                let name = local_name(e.local_name().as_ref());
                if current.is_none() {
                    if FEATURE_ELEMENTS.contains(&name.as_str()) {
                        current = Some(Builder {
                            element: name,
                            ..Builder::default()
                        });
                    }
                } else if name == "pos" || name == "posList" {
                    in_position = true;
                    if let Some(builder) = current.as_mut() {
                        builder.is_line |= name == "posList";
                    }
                } else {
                    leaf = Some(name);
                }
            }
            Event::Text(t) => {
                let text = t.unescape().context("decoding GML text")?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if let Some(builder) = current.as_mut() {
                    if in_position {
                        parse_positions(text, &mut builder.vertices)?;
                    } else if let Some(key) = leaf.as_ref() {
                        builder.attributes.insert(key.clone(), text.to_string());
                    }
                }
            }
            Event::End(e) => {
                let name = local_name(e.local_name().as_ref());
                if name == "pos" || name == "posList" {
                    in_position = false;
                } else if leaf.as_deref() == Some(name.as_str()) {
                    leaf = None;
                }
                if current.as_ref().is_some_and(|b| b.element == name) {
                    let builder = current.take().unwrap_or_default();
                    if let Some(feature) = finish(builder, today) {
                        features.push(feature);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(features)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// GML positions are space-separated (easting, northing, elevation) triples.
fn parse_positions(text: &str, vertices: &mut Vec<[f64; 3]>) -> Result<()> {
    let values: Vec<f64> = text
        .split_whitespace()
        .map(|v| v.parse::<f64>().context("non-numeric coordinate"))
        .collect::<Result<_>>()?;
    if values.is_empty() || values.len() % 3 != 0 {
        bail!("coordinate list of length {} is not made of triples", values.len());
    }
    vertices.extend(values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]));
    Ok(())
}

fn finish(builder: Builder, today: &str) -> Option<RawFeature> {
    // Features past their validity date are gone from the terrain already.
    if let Some(valid_until) = builder.attributes.get("gyldigTil") {
        if valid_until.get(..10).unwrap_or(valid_until) <= today {
            return None;
        }
    }

    if builder.vertices.is_empty() {
        warn!(element = %builder.element, "feature without geometry skipped");
        return None;
    }

    let geometry = if builder.is_line {
        Geometry::LineString(builder.vertices)
    } else {
        Geometry::Point(builder.vertices[0])
    };
    Some(RawFeature::new(geometry, builder.attributes))
}
