//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::ReprojectorLite;
use anyhow::{bail, Result};
use geo::Geometry;
use sketch::{Crs, SketchError};
use tracing::debug;

/// Reprojection intelligente
///
/// Essaie d'abord reproject_lite (pure Rust), puis fallback sur proj si disponible.
pub enum SmartReprojector {
    /// Pas de reprojection (source == cible)
    Identity { crs: Crs },
    /// Reprojection légère (pure Rust)
    Lite {
        source: Crs,
        target: Crs,
        lite: ReprojectorLite,
    },
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::Reprojector),
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        if source == target {
            return Ok(Self::Identity { crs: source });
        }

        if ReprojectorLite::is_supported(source, target) {
            let lite = ReprojectorLite::new(source, target)?;
            return Ok(Self::Lite {
                source,
                target,
                lite,
            });
        }

        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::Reprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        bail!(
            "Reprojection {} → {} not supported.\n\
             Built-in transforms: 4326/4283/7844 (geographic), 3857 (Web Mercator), \
             326xx/327xx (UTM), 28348-28358 (MGA94), 7846-7859 (MGA2020).\n\
             For other systems, build with: cargo build --features reproject",
            source,
            target
        );
    }

    /// CRS source
    pub fn source(&self) -> Crs {
        match self {
            Self::Identity { crs } => *crs,
            Self::Lite { source, .. } => *source,
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.source(),
        }
    }

    /// CRS cible
    pub fn target(&self) -> Crs {
        match self {
            Self::Identity { crs } => *crs,
            Self::Lite { target, .. } => *target,
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.target(),
        }
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match self {
            Self::Identity { .. } => Ok(geom.clone()),
            Self::Lite { lite, .. } => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Transforme une géométrie, les échecs deviennent des erreurs par feature
    pub fn reproject(&self, geom: &Geometry) -> Result<Geometry, SketchError> {
        self.transform_geometry(geom).map_err(|e| {
            debug!(from = %self.source(), to = %self.target(), error = %e, "Reprojection failed");
            SketchError::reprojection(self.source(), self.target(), e.to_string())
        })
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity { .. } => "identity (no reprojection)",
            Self::Lite { .. } => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_identity() {
        let r = SmartReprojector::new(Crs::new(28355), Crs::new(28355)).unwrap();
        assert!(matches!(r, SmartReprojector::Identity { .. }));
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::new(Crs::WGS84, Crs::new(7855)).unwrap();
        assert!(matches!(r, SmartReprojector::Lite { .. }));
        assert_eq!(r.target(), Crs::new(7855));
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_without_proj() {
        assert!(SmartReprojector::new(Crs::new(2154), Crs::WGS84).is_err());
    }

    #[test]
    fn test_failure_is_per_feature_error() {
        let r = SmartReprojector::new(Crs::WGS84, Crs::WEB_MERCATOR).unwrap();
        let err = r
            .reproject(&Geometry::Point(Point::new(0.0, -100.0)))
            .unwrap_err();
        assert!(err.is_per_feature());
    }
}
