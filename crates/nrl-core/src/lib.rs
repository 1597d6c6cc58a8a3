//! Core conversion engines for the national aviation-obstacle register.
//!
//! Pure, synchronous transforms from decoded survey features to tagged map
//! features: classification, tagging, line merging and the two assembly
//! flows. No I/O happens in this crate; decoding and serialization live in
//! the CLI crate.

pub mod assemble;
pub mod classify;
pub mod merge;
pub mod models;
pub mod tagging;

pub use assemble::{assemble_obstacles, assemble_power_grid, Assembly, AssemblyReport};
pub use classify::{classify, Classified, Family};
pub use merge::{merge_group, ElevationSummary, MergedLine};
pub use models::{
    Attributes, CoreError, FlatGeometry, Geometry, RawFeature, TaggedFeature, Tags, Uniform,
};
pub use tagging::{category_tags, tag_feature, TagResult};
