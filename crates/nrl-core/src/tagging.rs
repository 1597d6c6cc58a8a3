//! Tagging engine: maps one raw record to its OSM output tags.
//!
//! Every step is independent and optional; a missing source field suppresses
//! only the tags derived from it. The one diagnostic condition is a
//! classified type code with no entry in the tagging table, surfaced through
//! [`TagResult::unknown_type`] so the caller can report it.

use crate::classify::classify;
use crate::models::{fields, RawFeature, Tags, HEIGHT_REFERENCE_TOP};

/// Static tagging per obstacle type code. Pure domain data, shared by all
/// five schema families.
const TAGGING_TABLE: &[(&str, &[(&str, &str)])] = &[
    // Point obstacles
    ("bru", &[("man_made", "tower"), ("tower:type", "bridge")]),
    ("bygning", &[("building", "yes")]),
    ("demning", &[("waterway", "dam")]),
    ("flaggstang", &[("man_made", "flagpole")]),
    ("forankretBallong", &[]),
    ("fornøyelsesparkinnretning", &[("man_made", "tower")]),
    ("fyrtårn", &[("man_made", "lighthouse")]),
    ("hopptårn", &[("man_made", "tower"), ("piste:type", "ski_jump")]),
    ("kjøletårn", &[("man_made", "tower"), ("tower:type", "cooling")]),
    ("kontrolltårn", &[("man_made", "tower"), ("tower:type", "airport_control")]),
    ("kran", &[("man_made", "crane")]),
    ("kraftverk", &[("power", "plant")]),
    ("kuppel", &[("man_made", "tower"), ("tower:construction", "dome")]),
    ("landbruksutstyr", &[]),
    ("monument", &[("man_made", "tower"), ("tower:type", "monument")]),
    ("navigasjonshjelpemiddel", &[("aeroway", "navigationaid")]),
    ("nettstasjon", &[("power", "substation")]),
    ("petroleumsinnretning", &[]),
    ("pipe", &[("man_made", "chimney")]),
    ("raffineri", &[("man_made", "tower")]),
    ("silo", &[("man_made", "silo")]),
    ("skilt", &[]),
    ("tank", &[("man_made", "storage_tank")]),
    ("terrengpunkt", &[("natural", "peak")]),
    ("tre", &[("natural", "tree")]),
    ("tårn", &[("man_made", "tower")]),
    ("vanntårn", &[("man_made", "storage_tank"), ("content", "water")]),
    (
        "vindturbin",
        &[
            ("power", "generator"),
            ("generator:source", "wind"),
            ("generator:method", "wind_turbine"),
            ("generator:type", "horizontal_axis"),
        ],
    ),
    // Masts
    ("belysningsmast", &[("man_made", "mast"), ("tower:type", "lighting")]),
    ("høyspentmast", &[("power", "tower")]),
    ("lavspentmast", &[("power", "pole")]),
    ("målemast", &[("man_made", "mast"), ("tower:type", "monitoring")]),
    ("radiomast", &[("man_made", "mast"), ("tower:type", "communication")]),
    ("stolpe", &[("man_made", "mast")]),
    ("telemast", &[("man_made", "mast"), ("tower:type", "communication")]),
    // Aerial spans
    ("bardun", &[]),
    ("gondolbane", &[("aerialway", "gondola")]),
    ("høyspent", &[("power", "line")]),
    ("lavspent", &[("power", "minor_line")]),
    ("løypestreng", &[("aerialway", "goods")]),
    ("skitrekk", &[("aerialway", "draglift")]),
    ("stolheis", &[("aerialway", "chairlift")]),
    ("taubane", &[("aerialway", "cable_car")]),
    ("vaier", &[]),
    ("zipline", &[("aerialway", "zip_line")]),
    // Other lines
    ("gjerde", &[("barrier", "fence")]),
    ("ledning", &[]),
    // Areas
    ("skog", &[("natural", "wood")]),
    (
        "vindkraftverk",
        &[("type", "site"), ("power", "plant"), ("plant:source", "wind")],
    ),
    // Catch-all used by several families
    ("annet", &[]),
];

/// Light signature codes meaning "no lighting" or "lighting unknown".
const LIGHT_NONE: &[&str] = &["ingenLyssetting", "ukjentLyssetting"];

const LIGHT_RED: &[&str] = &[
    "fastRødt",
    "blinkendeRødt",
    "lavintensitetTypeA",
    "lavintensitetTypeB",
    "mellomintensitetTypeB",
    "mellomintensitetTypeC",
];

const LIGHT_WHITE: &[&str] = &[
    "fastHvitt",
    "blinkendeHvitt",
    "mellomintensitetTypeA",
    "høyintensitetTypeA",
    "høyintensitetTypeB",
];

const LIGHT_FIXED: &[&str] = &[
    "fastRødt",
    "fastHvitt",
    "lavintensitetTypeA",
    "lavintensitetTypeB",
    "mellomintensitetTypeC",
];

const LIGHT_FLASHING: &[&str] = &[
    "blinkendeRødt",
    "blinkendeHvitt",
    "mellomintensitetTypeA",
    "mellomintensitetTypeB",
    "høyintensitetTypeA",
    "høyintensitetTypeB",
];

const LIGHT_FLOODLIGHT: &str = "flomlys";

/// Result of tagging a single feature.
#[derive(Debug, Clone)]
pub struct TagResult {
    pub tags: Tags,
    /// Classified type code with no tagging-table entry, if any.
    pub unknown_type: Option<String>,
}

/// Derive output tags from a raw record. Pure; the input is never mutated.
pub fn tag_feature(feature: &RawFeature) -> TagResult {
    let mut tags = Tags::new();
    let mut unknown_type = None;

    if let Some(id) = feature.id() {
        tags.insert("ref:nrl".to_string(), id.to_string());
    }

    // Names equal to the identifier carry no information. All-caps names are
    // assumed to be typed in as shouting and are title-cased.
    if let Some(name) = feature.name() {
        if !name.is_empty() && Some(name) != feature.id() {
            let description = if name == name.to_uppercase() {
                title_case(name)
            } else {
                name.to_string()
            };
            tags.insert("description".to_string(), description);
        }
    }

    if let Some(classified) = classify(&feature.attributes) {
        tags.insert("OBSTACLE_TYPE".to_string(), classified.code.to_string());
        match category_tags(classified.code) {
            Some(pairs) => {
                for (key, value) in pairs {
                    tags.insert(key.to_string(), value.to_string());
                }
            }
            None => unknown_type = Some(classified.code.to_string()),
        }
    }

    if let Some(status) = feature.status() {
        tags.insert("STATUS".to_string(), status.to_string());
    }

    if let Some(height) = feature.height() {
        height_tag(height, &mut tags);
    }
    ele_tags(
        feature.geometry.top_elevation(),
        feature.height(),
        feature.height_reference() == Some(HEIGHT_REFERENCE_TOP),
        &mut tags,
    );

    date_tags(feature, &mut tags);

    if let Some(light) = feature.light_code() {
        light_tags(light, &mut tags);
    }

    TagResult { tags, unknown_type }
}

/// Category tags for a type code, or `None` when the code is not in the table.
pub fn category_tags(code: &str) -> Option<&'static [(&'static str, &'static str)]> {
    TAGGING_TABLE
        .iter()
        .find(|(entry, _)| *entry == code)
        .map(|(_, pairs)| *pairs)
}

/// Declared heights are whole meters in the output, truncated not rounded.
pub(crate) fn height_tag(height: f64, tags: &mut Tags) {
    tags.insert("height".to_string(), format!("{}", height.trunc() as i64));
}

/// Elevation reconciliation.
///
/// With a "top" height reference the surveyed elevation sits at the object's
/// top: subtracting the declared height recovers the base elevation. Without
/// a declared height there is no way back to the base, so the top elevation
/// itself is emitted as `top_ele` instead. Exactly one of `ele`/`top_ele` is
/// ever emitted.
pub(crate) fn ele_tags(
    top: Option<f64>,
    height: Option<f64>,
    top_reference: bool,
    tags: &mut Tags,
) {
    let Some(top) = top else { return };
    if top_reference {
        match height {
            Some(height) => {
                tags.insert("ele".to_string(), format_elevation(top - height));
            }
            None => {
                tags.insert("top_ele".to_string(), format_elevation(top));
            }
        }
    } else {
        tags.insert("ele".to_string(), format_elevation(top));
    }
}

/// Whole-meter elevations print without decimals, others with one.
pub(crate) fn format_elevation(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

const DATE_TAGS: &[(&str, &str)] = &[
    (fields::DATE_SURVEY, "DATE_SURVEY"),
    (fields::DATE_REGISTERED, "DATE_CREATE"),
    (fields::DATE_UPDATED, "DATE_UPDATE"),
];

fn date_tags(feature: &RawFeature, tags: &mut Tags) {
    for (field, tag) in DATE_TAGS {
        if let Some(value) = feature.attr(field) {
            tags.insert((*tag).to_string(), truncate_date(value));
        }
    }
}

/// Source timestamps carry the calendar date in their first ten characters.
pub(crate) fn truncate_date(value: &str) -> String {
    value.get(..10).unwrap_or(value).to_string()
}

/// Decompose a light signature code into its orthogonal facets. Facets are
/// independent; each is emitted only when the code matches.
fn light_tags(code: &str, tags: &mut Tags) {
    if LIGHT_NONE.contains(&code) {
        return;
    }

    tags.insert("aeroway:light".to_string(), "obstacle".to_string());

    if LIGHT_RED.contains(&code) {
        tags.insert("aeroway:light:colour".to_string(), "red".to_string());
    } else if LIGHT_WHITE.contains(&code) {
        tags.insert("aeroway:light:colour".to_string(), "white".to_string());
    }

    if LIGHT_FIXED.contains(&code) {
        tags.insert("aeroway:light:character".to_string(), "fixed".to_string());
    } else if LIGHT_FLASHING.contains(&code) {
        tags.insert("aeroway:light:character".to_string(), "flashing".to_string());
    } else if code == LIGHT_FLOODLIGHT {
        tags.insert(
            "aeroway:light:character".to_string(),
            "floodlight".to_string(),
        );
    }

    if code.contains("lavintensitet") {
        tags.insert("aeroway:light:intensity".to_string(), "low".to_string());
    } else if code.contains("mellomintensitet") {
        tags.insert("aeroway:light:intensity".to_string(), "medium".to_string());
    } else if code.contains("høyintensitet") {
        tags.insert("aeroway:light:intensity".to_string(), "high".to_string());
    }

    if code.contains("TypeA") {
        tags.insert("aeroway:light:icao_type".to_string(), "A".to_string());
    } else if code.contains("TypeB") {
        tags.insert("aeroway:light:icao_type".to_string(), "B".to_string());
    } else if code.contains("TypeC") {
        tags.insert("aeroway:light:icao_type".to_string(), "C".to_string());
    }
}

/// Uppercase the first letter of each word, lowercase the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
