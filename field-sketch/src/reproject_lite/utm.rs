//! Projection Transverse Mercator en fuseaux de 6° (UTM, MGA)
//!
//! Séries de Snyder, précision millimétrique dans le fuseau.

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::{bail, Result};

/// Facteur d'échelle au méridien central
const K0: f64 = 0.9996;

/// False easting
const X0: f64 = 500000.0;

/// False northing de l'hémisphère sud
const Y0_SOUTH: f64 = 10000000.0;

/// Fuseau UTM paramétré par son ellipsoïde
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmZone {
    pub zone: u32,
    pub south: bool,
    pub ellipsoid: Ellipsoid,
}

impl UtmZone {
    pub fn new(zone: u32, south: bool, ellipsoid: Ellipsoid) -> Self {
        Self {
            zone,
            south,
            ellipsoid,
        }
    }

    /// Longitude du méridien central en radians
    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(&self) -> f64 {
        if self.south {
            Y0_SOUTH
        } else {
            0.0
        }
    }

    /// Longueur de l'arc de méridien depuis l'équateur
    fn meridian_arc(&self, phi: f64) -> f64 {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Coordonnées géographiques vers (easting, northing)
    pub fn forward(&self, geo: Geographic) -> Result<(f64, f64)> {
        if geo.lat.abs() > 84.0_f64.to_radians() {
            bail!("Latitude {:.4}° outside the UTM domain", geo.lat.to_degrees());
        }

        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();
        let phi = geo.lat;

        let n = a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let t = phi.tan().powi(2);
        let c = ep2 * phi.cos().powi(2);
        let big_a = phi.cos() * (geo.lon - self.central_meridian());
        let m = self.meridian_arc(phi);

        let x = K0
            * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
            + X0;

        let y = K0
            * (m + n
                * phi.tan()
                * (big_a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                        / 720.0))
            + self.false_northing();

        Ok((x, y))
    }

    /// (easting, northing) vers coordonnées géographiques
    pub fn inverse(&self, x: f64, y: f64) -> Result<Geographic> {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        let x = x - X0;
        let y = y - self.false_northing();

        // Latitude du pied de la perpendiculaire
        let m = y / K0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        let lon = self.central_meridian()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2
                    + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        if !lat.is_finite() || !lon.is_finite() {
            bail!("Coordinates ({}, {}) outside zone {}", x + X0, y, self.zone);
        }

        Ok(Geographic::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::super::ellipsoid::{GRS80, WGS84};
    use super::*;

    #[test]
    fn test_sydney_mga56() {
        // Opéra de Sydney, MGA zone 56
        let zone = UtmZone::new(56, true, GRS80);
        let (x, y) = zone
            .forward(Geographic::from_degrees(151.2153, -33.8568))
            .unwrap();

        assert!((x - 334900.6).abs() < 1.0, "x={}", x);
        assert!((y - 6252288.8).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_central_meridian() {
        let zone = UtmZone::new(55, true, GRS80);
        let (x, _) = zone
            .forward(Geographic::from_degrees(147.0, -42.0))
            .unwrap();
        assert!((x - 500000.0).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        let zone = UtmZone::new(50, true, WGS84);
        let (x, y) = zone
            .forward(Geographic::from_degrees(115.8575, -31.9505))
            .unwrap();
        let (lon, lat) = zone.inverse(x, y).unwrap().to_degrees();

        assert!((lon - 115.8575).abs() < 1e-7, "lon={}", lon);
        assert!((lat - (-31.9505)).abs() < 1e-7, "lat={}", lat);
    }

    #[test]
    fn test_polar_latitude_rejected() {
        let zone = UtmZone::new(33, false, WGS84);
        assert!(zone.forward(Geographic::from_degrees(15.0, 88.0)).is_err());
    }
}
