//! Inverse UTM zone 33 north → WGS84 conversion.
//!
//! The whole dataset is delivered in EPSG:25833, so a single fixed-zone
//! inverse transverse-Mercator conversion covers it. The core merges in the
//! projected coordinates, where endpoint equality is exact; output geometry
//! is converted here just before writing.

use nrl_core::{FlatGeometry, TaggedFeature};

/// WGS84 ellipsoid.
const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor at the central meridian.
const K0: f64 = 0.9996;
/// Central meridian of zone 33, in degrees.
const LON_ORIGIN: f64 = 15.0;
const FALSE_EASTING: f64 = 500_000.0;

/// Convert one projected coordinate to (latitude, longitude) in degrees.
pub fn utm33_to_wgs84(easting: f64, northing: f64) -> (f64, f64) {
    let e2 = F * (2.0 - F);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let x = easting - FALSE_EASTING;
    let m = northing / K0;
    let mu = m / (A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lon = (d
        - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
            / 120.0)
        / cos_phi1;

    (lat.to_degrees(), LON_ORIGIN + lon.to_degrees())
}

/// Reproject output geometry in place. Resulting coordinates are
/// `[longitude, latitude]`, the GeoJSON axis order.
pub fn reproject(features: Vec<TaggedFeature>) -> Vec<TaggedFeature> {
    features
        .into_iter()
        .map(|mut feature| {
            feature.geometry = match feature.geometry {
                FlatGeometry::Point(p) => FlatGeometry::Point(to_lon_lat(p)),
                FlatGeometry::LineString(vertices) => {
                    FlatGeometry::LineString(vertices.into_iter().map(to_lon_lat).collect())
                }
            };
            feature
        })
        .collect()
}

fn to_lon_lat([easting, northing]: [f64; 2]) -> [f64; 2] {
    let (lat, lon) = utm33_to_wgs84(easting, northing);
    [lon, lat]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_meridian_maps_to_fifteen_degrees() {
        let (lat, lon) = utm33_to_wgs84(500_000.0, 6_650_000.0);
        assert!((lon - 15.0).abs() < 1e-6);
        assert!(lat > 59.5 && lat < 60.5, "latitude {lat} out of range");
    }

    #[test]
    fn test_coordinates_move_in_expected_direction() {
        let (lat_south, _) = utm33_to_wgs84(500_000.0, 6_650_000.0);
        let (lat_north, _) = utm33_to_wgs84(500_000.0, 6_750_000.0);
        assert!(lat_north > lat_south);

        let (_, lon_west) = utm33_to_wgs84(400_000.0, 6_650_000.0);
        let (_, lon_east) = utm33_to_wgs84(600_000.0, 6_650_000.0);
        assert!(lon_west < 15.0 && lon_east > 15.0);
    }

    #[test]
    fn test_reproject_outputs_lon_lat_order() {
        let features = vec![TaggedFeature {
            geometry: FlatGeometry::Point([500_000.0, 6_650_000.0]),
            tags: Default::default(),
        }];
        let reprojected = reproject(features);
        let FlatGeometry::Point([lon, lat]) = reprojected[0].geometry else {
            panic!("expected a point");
        };
        assert!((lon - 15.0).abs() < 1e-6);
        assert!(lat > 59.0 && lat < 61.0);
    }
}
