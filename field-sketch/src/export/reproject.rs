//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

#[cfg(feature = "reproject")]
use anyhow::{Context, Result};
#[cfg(feature = "reproject")]
use geo::{Coord, Geometry, MapCoords};
#[cfg(feature = "reproject")]
use proj::Proj;
#[cfg(feature = "reproject")]
use sketch::Crs;

/// Reprojection de géométries entre deux systèmes de coordonnées
#[cfg(feature = "reproject")]
pub struct Reprojector {
    proj: Proj,
    source: Crs,
    target: Crs,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        let from = source.to_string();
        let to = target.to_string();

        let proj = Proj::new_known_crs(&from, &to, None)
            .context(format!("Failed to create projection from {} to {}", from, to))?;

        Ok(Self {
            proj,
            source,
            target,
        })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        if self.source == self.target {
            return Ok(geom.clone());
        }
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self
                .proj
                .convert((c.x, c.y))
                .context("Coordinate transformation failed")?;
            Ok(Coord { x, y })
        })
    }
}

#[cfg(feature = "reproject")]
#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_wgs84_to_mga94() {
        let reprojector = Reprojector::new(Crs::WGS84, Crs::new(28356)).unwrap();

        let opera = Geometry::Point(Point::new(151.2153, -33.8568));
        let Geometry::Point(p) = reprojector.transform_geometry(&opera).unwrap() else {
            panic!("Expected Point geometry");
        };
        assert!((p.x() - 334900.0).abs() < 10.0, "x={}", p.x());
        assert!((p.y() - 6252288.0).abs() < 10.0, "y={}", p.y());
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(Crs::new(99999), Crs::WGS84).is_err());
    }
}

/// Vérifie si la reprojection PROJ est disponible
pub fn is_available() -> bool {
    cfg!(feature = "reproject")
}
