//! Projection Web Mercator (EPSG:3857)
//!
//! Modèle sphérique au rayon équatorial WGS84.

use super::ellipsoid::WGS84;
use super::Geographic;
use anyhow::Result;

/// Latitude limite du carré Web Mercator
const MAX_LAT_DEG: f64 = 85.06;

/// Convertit coordonnées géographiques vers Web Mercator
pub fn geographic_to_web_mercator(geo: Geographic) -> Result<(f64, f64)> {
    let r = WGS84.a;
    let lat = geo
        .lat
        .clamp(-MAX_LAT_DEG.to_radians(), MAX_LAT_DEG.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    Ok((x, y))
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    let r = WGS84.a;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Ok(Geographic::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canberra_to_web_mercator() {
        let geo = Geographic::from_degrees(149.13, -35.28);
        let (x, y) = geographic_to_web_mercator(geo).unwrap();

        assert!((x - 16_601_075.7).abs() < 1.0, "x={}", x);
        assert!((y - (-4_201_997.4)).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(149.13, -35.28);
        let (x, y) = geographic_to_web_mercator(geo).unwrap();
        let (lon, lat) = web_mercator_to_geographic(x, y).unwrap().to_degrees();

        assert!((lon - 149.13).abs() < 1e-9, "lon={}", lon);
        assert!((lat - (-35.28)).abs() < 1e-9, "lat={}", lat);
    }
}
