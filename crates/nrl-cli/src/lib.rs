//! Pipeline collaborators around the conversion core: county registry
//! lookup, dataset download, GML decoding, reprojection and output writers.

pub mod counties;
pub mod download;
pub mod geojson;
pub mod gml;
pub mod osm;
pub mod projection;
