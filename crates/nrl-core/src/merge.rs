//! Line-merge engine: fuses fragmented line segments that share endpoints
//! into maximal continuous polylines.
//!
//! Operates on one network group at a time; the caller partitions segments
//! by network identity before calling in here.

use tracing::debug;

use crate::classify::classify;
use crate::models::{Attributes, CoreError, Geometry, RawFeature, Tags, Uniform};
use crate::tagging;

/// Type codes that never continue into a neighbouring segment. A guy-wire is
/// its own obstacle even when it touches the span it anchors.
const NON_MERGEABLE_TYPES: &[&str] = &["bardun"];

/// Elevation and height aggregation across a chain's constituent segments.
#[derive(Debug, Clone, Default)]
pub struct ElevationSummary {
    /// Lowest per-segment top elevation seen.
    pub min_top: Option<f64>,
    /// Highest per-segment top elevation seen; governs the merged obstacle.
    pub max_top: Option<f64>,
    pub height: Uniform<f64>,
    /// Uniform over `Option` so "absent on every constituent" (ordinary,
    /// elevation still usable) stays distinct from disagreement.
    pub height_reference: Uniform<Option<String>>,
}

impl ElevationSummary {
    fn observe(&mut self, segment: &RawFeature) {
        if let Some(z) = segment.geometry.top_elevation() {
            self.min_top = Some(self.min_top.map_or(z, |m| m.min(z)));
            self.max_top = Some(self.max_top.map_or(z, |m| m.max(z)));
        }
        match segment.height() {
            Some(height) => self.height.observe(height),
            None => self.height.invalidate(),
        }
        self.height_reference
            .observe(segment.height_reference().map(str::to_string));
    }

    /// Whether any observation was made at all. When false, callers fall
    /// back to the representative record's own elevation tags.
    pub fn saw_anything(&self) -> bool {
        self.max_top.is_some() || !self.height.is_unset() || !self.height_reference.is_unset()
    }

    /// Merge-level elevation tags, replacing the per-record ones.
    ///
    /// A `height` is only emitted when every constituent declared the same
    /// value; a mixed height reference suppresses `ele`/`top_ele` entirely
    /// rather than emit a value computed from disagreeing surveys.
    pub fn derived_tags(&self) -> Tags {
        let mut tags = Tags::new();
        if let Some(height) = self.height.value() {
            tagging::height_tag(*height, &mut tags);
        }
        if self.height_reference != Uniform::Mixed {
            let top_reference = matches!(
                self.height_reference.value(),
                Some(Some(r)) if r == crate::models::HEIGHT_REFERENCE_TOP
            );
            tagging::ele_tags(
                self.max_top,
                self.height.value().copied(),
                top_reference,
                &mut tags,
            );
        }
        tags
    }
}

/// One fused chain: the merged vertex sequence, the seed segment's raw
/// attributes (meaningful for shared fields only), and the aggregation
/// summary across all constituents.
#[derive(Debug, Clone)]
pub struct MergedLine {
    pub vertices: Vec<[f64; 3]>,
    pub representative: Attributes,
    pub summary: ElevationSummary,
}

/// Fuse a group of line segments into maximal chains.
///
/// Segments are seeded in input order; each chain greedily pulls the first
/// remaining segment (in pool order) whose endpoint matches either chain end,
/// restarting the scan after every splice. Endpoints compare on `(x, y)`
/// only, since surveyed elevations can disagree slightly between adjacent
/// segments. The first-match rule makes the result deterministic for a given
/// input order; at branch points (three or more segments meeting in one
/// vertex) the decomposition is valid but not canonical.
pub fn merge_group(segments: Vec<RawFeature>) -> Result<Vec<MergedLine>, CoreError> {
    let mut pool = Vec::with_capacity(segments.len());
    for segment in segments {
        pool.push(validated(segment)?);
    }

    let total = pool.len();
    let mut merged = Vec::new();

    while !pool.is_empty() {
        let seed = pool.remove(0);
        let mut summary = ElevationSummary::default();
        summary.observe(&seed);

        let Geometry::LineString(mut chain) = seed.geometry else {
            unreachable!("validated() only admits line strings");
        };

        if mergeable(&seed.attributes) {
            loop {
                let matched = pool.iter().position(|candidate| {
                    mergeable(&candidate.attributes) && touches(&chain, candidate)
                });
                let Some(index) = matched else { break };
                let candidate = pool.remove(index);
                summary.observe(&candidate);
                if let Geometry::LineString(vertices) = candidate.geometry {
                    splice(&mut chain, &vertices);
                }
            }
        }

        merged.push(MergedLine {
            vertices: chain,
            representative: seed.attributes,
            summary,
        });
    }

    debug!(segments = total, chains = merged.len(), "merged line group");
    Ok(merged)
}

fn validated(segment: RawFeature) -> Result<RawFeature, CoreError> {
    match &segment.geometry {
        Geometry::LineString(vertices) if vertices.len() >= 2 => Ok(segment),
        Geometry::LineString(vertices) => Err(CoreError::MalformedGeometry {
            reason: format!("line segment with {} vertices", vertices.len()),
        }),
        Geometry::Point(_) => Err(CoreError::MalformedGeometry {
            reason: "point geometry in a line group".to_string(),
        }),
    }
}

fn mergeable(attributes: &Attributes) -> bool {
    classify(attributes).map_or(true, |c| !NON_MERGEABLE_TYPES.contains(&c.code))
}

/// Endpoint equality ignores z.
fn xy_eq(a: [f64; 3], b: [f64; 3]) -> bool {
    a[0] == b[0] && a[1] == b[1]
}

fn touches(chain: &[[f64; 3]], candidate: &RawFeature) -> bool {
    let Geometry::LineString(vertices) = &candidate.geometry else {
        return false;
    };
    let (chain_first, chain_last) = (chain[0], chain[chain.len() - 1]);
    let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
    xy_eq(first, chain_last)
        || xy_eq(last, chain_last)
        || xy_eq(first, chain_first)
        || xy_eq(last, chain_first)
}

/// Splice a matching segment onto the chain, reversing it when needed so the
/// orientation stays continuous. The shared vertex is kept exactly once.
fn splice(chain: &mut Vec<[f64; 3]>, vertices: &[[f64; 3]]) {
    let chain_first = chain[0];
    let chain_last = chain[chain.len() - 1];
    let first = vertices[0];
    let last = vertices[vertices.len() - 1];

    if xy_eq(first, chain_last) {
        chain.extend_from_slice(&vertices[1..]);
    } else if xy_eq(last, chain_last) {
        chain.extend(vertices[..vertices.len() - 1].iter().rev());
    } else if xy_eq(last, chain_first) {
        let mut joined = vertices[..vertices.len() - 1].to_vec();
        joined.extend_from_slice(chain);
        *chain = joined;
    } else if xy_eq(first, chain_first) {
        let mut joined: Vec<[f64; 3]> = vertices[1..].iter().rev().copied().collect();
        joined.extend_from_slice(chain);
        *chain = joined;
    }
}
