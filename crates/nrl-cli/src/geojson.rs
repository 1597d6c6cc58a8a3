//! GeoJSON writer: renders tagged features as a FeatureCollection.

use anyhow::Result;
use serde_json::{json, Value};

use nrl_core::TaggedFeature;

/// Render a FeatureCollection. Geometry must already be in
/// `[longitude, latitude]` order.
pub fn to_geojson(features: &[TaggedFeature]) -> Result<String> {
    let features: Vec<Value> = features
        .iter()
        .map(|feature| {
            json!({
                "type": "Feature",
                "geometry": &feature.geometry,
                "properties": &feature.tags,
            })
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    Ok(serde_json::to_string_pretty(&collection)?)
}
