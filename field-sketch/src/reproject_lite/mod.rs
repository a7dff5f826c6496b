//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Systèmes supportés, en source comme en cible :
//! - Géographiques : WGS84 (EPSG:4326), GDA94 (EPSG:4283), GDA2020 (EPSG:7844)
//! - Web Mercator (EPSG:3857)
//! - UTM WGS84 nord et sud (EPSG:32601-32660, 32701-32760)
//! - MGA94 (EPSG:28348-28358) et MGA2020 (EPSG:7846-7859)
//!
//! Les datums GDA94 et GDA2020 sont assimilés à WGS84 (écart inférieur à 2 m).

mod ellipsoid;
mod mercator;
mod smart;
mod utm;

pub use smart::SmartReprojector;

use anyhow::{anyhow, bail, Result};
use geo::{Coord, Geometry, MapCoords};
use sketch::{Crs, SketchError};

pub use ellipsoid::{Ellipsoid, GRS80, WGS84};
pub use utm::UtmZone;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Famille de projection d'un CRS supporté
#[derive(Debug, Clone, Copy, PartialEq)]
enum Projection {
    Geographic,
    WebMercator,
    Utm(UtmZone),
}

impl Projection {
    fn for_crs(crs: Crs) -> Option<Self> {
        match crs.epsg() {
            4326 | 4283 | 7844 => Some(Self::Geographic),
            3857 => Some(Self::WebMercator),
            code @ 32601..=32660 => Some(Self::Utm(UtmZone::new(code - 32600, false, WGS84))),
            code @ 32701..=32760 => Some(Self::Utm(UtmZone::new(code - 32700, true, WGS84))),
            code @ 28348..=28358 => Some(Self::Utm(UtmZone::new(code - 28300, true, GRS80))),
            code @ 7846..=7859 => Some(Self::Utm(UtmZone::new(code - 7800, true, GRS80))),
            _ => None,
        }
    }

    fn unproject(self, x: f64, y: f64) -> Result<Geographic> {
        match self {
            Self::Geographic => {
                if !(-90.0..=90.0).contains(&y) {
                    bail!("Latitude {} outside [-90, 90]", y);
                }
                Ok(Geographic::from_degrees(x, y))
            }
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::Utm(zone) => zone.inverse(x, y),
        }
    }

    fn project(self, geo: Geographic) -> Result<(f64, f64)> {
        match self {
            Self::Geographic => Ok(geo.to_degrees()),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
            Self::Utm(zone) => zone.forward(geo),
        }
    }
}

/// Reprojection légère entre deux CRS supportés
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Projection,
    target: Projection,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        let source = Projection::for_crs(source)
            .ok_or_else(|| anyhow!("{} is not supported by the built-in transforms", source))?;
        let target = Projection::for_crs(target)
            .ok_or_else(|| anyhow!("{} is not supported by the built-in transforms", target))?;
        Ok(Self { source, target })
    }

    /// Vérifie si le CRS est supporté
    pub fn is_supported_crs(crs: Crs) -> bool {
        Projection::for_crs(crs).is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: Crs, target: Crs) -> bool {
        Self::is_supported_crs(source) && Self::is_supported_crs(target)
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            bail!("Non-finite coordinate ({}, {})", x, y);
        }
        // Pivot géographique
        let geo = self.source.unproject(x, y)?;
        self.target.project(geo)
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

/// Reprojette une géométrie du CRS de saisie vers le CRS de la couche
///
/// Retourne la géométrie inchangée si les deux CRS sont identiques.
pub fn reproject(geometry: &Geometry, source: Crs, target: Crs) -> Result<Geometry, SketchError> {
    SmartReprojector::new(source, target)
        .map_err(|e| SketchError::reprojection(source, target, e.to_string()))?
        .reproject(geometry)
}
