//! WGS84 → OSGB36 national grid conversion.
//!
//! Two stages, both using the published Ordnance Survey constants: a Helmert
//! datum shift from WGS84 onto the Airy 1830 ellipsoid, then a transverse
//! Mercator projection onto the National Grid. The Helmert shift is accurate
//! to a few metres across Great Britain, which is ample for site reports.
//!
//! Grid references are an enrichment, not a required field: positions outside
//! the grid's useful domain produce `None`, never an error.

use std::sync::OnceLock;

use serde::Serialize;

use crate::Coordinate;

/// Projected OSGB36 position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridRef {
    pub easting: f64,
    pub northing: f64,
}

// Ellipsoid semi-axes.
const WGS84_A: f64 = 6_378_137.0;
const WGS84_B: f64 = 6_356_752.3142;
const AIRY_A: f64 = 6_377_563.396;
const AIRY_B: f64 = 6_356_256.909;

// National Grid projection: scale factor and true origin.
const SCALE_F0: f64 = 0.999_601_271_7;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const EASTING0: f64 = 400_000.0;
const NORTHING0: f64 = -100_000.0;

// Rough bounding box of the grid's useful domain.
const MIN_LAT: f64 = 49.0;
const MAX_LAT: f64 = 61.5;
const MIN_LON: f64 = -9.0;
const MAX_LON: f64 = 2.5;

/// Derived constants shared by every conversion, computed once per process.
struct Transform {
    wgs84_e2: f64,
    airy_e2: f64,
    // Helmert shift, WGS84 -> OSGB36: translation in metres, rotation in
    // radians, scale as a ratio.
    tx: f64,
    ty: f64,
    tz: f64,
    rx: f64,
    ry: f64,
    rz: f64,
    s: f64,
}

fn transform() -> &'static Transform {
    static TRANSFORM: OnceLock<Transform> = OnceLock::new();
    TRANSFORM.get_or_init(|| {
        let arcsec = |v: f64| (v / 3600.0).to_radians();
        Transform {
            wgs84_e2: 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A),
            airy_e2: 1.0 - (AIRY_B * AIRY_B) / (AIRY_A * AIRY_A),
            tx: -446.448,
            ty: 125.157,
            tz: -542.060,
            rx: arcsec(-0.1502),
            ry: arcsec(-0.2470),
            rz: arcsec(-0.8421),
            s: 20.4894e-6,
        }
    })
}

/// Converts a WGS84 coordinate to an OSGB36 national grid reference.
///
/// Returns `None` when the position lies outside the grid's useful domain
/// (roughly Great Britain and nearby waters).
#[must_use]
pub fn to_national_grid(coord: Coordinate) -> Option<GridRef> {
    let (lat, lon) = (coord.lat(), coord.lon());
    if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(MIN_LON..=MAX_LON).contains(&lon) {
        return None;
    }

    let t = transform();
    let (x, y, z) = geodetic_to_cartesian(lat.to_radians(), lon.to_radians(), WGS84_A, t.wgs84_e2);

    // Helmert seven-parameter shift with the small-angle rotation matrix.
    let xs = t.tx + (1.0 + t.s) * x - t.rz * y + t.ry * z;
    let ys = t.ty + t.rz * x + (1.0 + t.s) * y - t.rx * z;
    let zs = t.tz - t.ry * x + t.rx * y + (1.0 + t.s) * z;

    let (lat_osgb, lon_osgb) = cartesian_to_geodetic(xs, ys, zs, AIRY_A, t.airy_e2);
    let (easting, northing) = project_osgb(lat_osgb, lon_osgb);
    Some(GridRef { easting, northing })
}

/// Geodetic (radians, height zero) to geocentric cartesian coordinates.
fn geodetic_to_cartesian(lat: f64, lon: f64, a: f64, e2: f64) -> (f64, f64, f64) {
    let nu = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    (
        nu * lat.cos() * lon.cos(),
        nu * lat.cos() * lon.sin(),
        nu * (1.0 - e2) * lat.sin(),
    )
}

/// Geocentric cartesian back to geodetic latitude/longitude in radians.
fn cartesian_to_geodetic(x: f64, y: f64, z: f64, a: f64, e2: f64) -> (f64, f64) {
    let lon = y.atan2(x);
    let p = x.hypot(y);
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        let next = (z + e2 * nu * lat.sin()).atan2(p);
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    (lat, lon)
}

/// Transverse Mercator projection of OSGB36-datum latitude/longitude
/// (radians) to grid easting/northing, per the Ordnance Survey formulas.
fn project_osgb(lat: f64, lon: f64) -> (f64, f64) {
    let t = transform();
    let e2 = t.airy_e2;
    let lat0 = LAT0_DEG.to_radians();
    let lon0 = LON0_DEG.to_radians();

    let n = (AIRY_A - AIRY_B) / (AIRY_A + AIRY_B);
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let nu = AIRY_A * SCALE_F0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let rho = AIRY_A * SCALE_F0 * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let m = AIRY_B
        * SCALE_F0
        * ((1.0 + n + 1.25 * n * n + 1.25 * n * n * n) * (lat - lat0)
            - (3.0 * n + 3.0 * n * n + 21.0 / 8.0 * n * n * n)
                * (lat - lat0).sin()
                * (lat + lat0).cos()
            + (15.0 / 8.0 * n * n + 15.0 / 8.0 * n * n * n)
                * (2.0 * (lat - lat0)).sin()
                * (2.0 * (lat + lat0)).cos()
            - 35.0 / 24.0 * n * n * n * (3.0 * (lat - lat0)).sin() * (3.0 * (lat + lat0)).cos());

    let i = m + NORTHING0;
    let ii = nu / 2.0 * sin_lat * cos_lat;
    let iii = nu / 24.0 * sin_lat * cos_lat.powi(3) * (5.0 - tan_lat * tan_lat + 9.0 * eta2);
    let iiia = nu / 720.0
        * sin_lat
        * cos_lat.powi(5)
        * (61.0 - 58.0 * tan_lat * tan_lat + tan_lat.powi(4));
    let iv = nu * cos_lat;
    let v = nu / 6.0 * cos_lat.powi(3) * (nu / rho - tan_lat * tan_lat);
    let vi = nu / 120.0
        * cos_lat.powi(5)
        * (5.0 - 18.0 * tan_lat * tan_lat
            + tan_lat.powi(4)
            + 14.0 * eta2
            - 58.0 * tan_lat * tan_lat * eta2);

    let dl = lon - lon0;
    let northing = i + ii * dl * dl + iii * dl.powi(4) + iiia * dl.powi(6);
    let easting = EASTING0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
    (easting, northing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_matches_ordnance_survey_worked_example() {
        // OS guide worked example, already in the OSGB36 datum:
        // 52°39'27.2531"N 1°43'4.5177"E -> E 651409.903, N 313177.270
        let lat = (52.0_f64 + 39.0 / 60.0 + 27.2531 / 3600.0).to_radians();
        let lon = (1.0_f64 + 43.0 / 60.0 + 4.5177 / 3600.0).to_radians();
        let (easting, northing) = project_osgb(lat, lon);
        assert!(
            (easting - 651_409.903).abs() < 0.01,
            "easting off: {easting}"
        );
        assert!(
            (northing - 313_177.270).abs() < 0.01,
            "northing off: {northing}"
        );
    }

    #[test]
    fn central_london_lands_in_the_right_square() {
        // Trafalgar Square area is around E 530000, N 180400. The Helmert
        // shift is only metre-accurate, so assert a generous window.
        let coord = Coordinate::new(51.5074, -0.1278).unwrap();
        let grid = to_national_grid(coord).expect("London is on the grid");
        assert!(
            (529_000.0..=531_500.0).contains(&grid.easting),
            "easting: {}",
            grid.easting
        );
        assert!(
            (179_000.0..=181_500.0).contains(&grid.northing),
            "northing: {}",
            grid.northing
        );
    }

    #[test]
    fn edinburgh_northing_exceeds_london() {
        let london = to_national_grid(Coordinate::new(51.5074, -0.1278).unwrap()).unwrap();
        let edinburgh = to_national_grid(Coordinate::new(55.9533, -3.1883).unwrap()).unwrap();
        assert!(edinburgh.northing > london.northing);
    }

    #[test]
    fn positions_off_the_grid_yield_none() {
        // New York
        assert!(to_national_grid(Coordinate::new(40.7128, -74.0060).unwrap()).is_none());
        // Paris is east of the domain cut-off
        assert!(to_national_grid(Coordinate::new(48.8566, 2.6522).unwrap()).is_none());
        // Equator
        assert!(to_national_grid(Coordinate::new(0.0, 0.0).unwrap()).is_none());
    }

    #[test]
    fn round_trip_of_datum_helpers_is_stable() {
        let t = transform();
        let lat = 53.0_f64.to_radians();
        let lon = (-1.5_f64).to_radians();
        let (x, y, z) = geodetic_to_cartesian(lat, lon, AIRY_A, t.airy_e2);
        let (lat2, lon2) = cartesian_to_geodetic(x, y, z, AIRY_A, t.airy_e2);
        assert!((lat - lat2).abs() < 1e-10);
        assert!((lon - lon2).abs() < 1e-10);
    }
}
