//! Calcul des attributs persistés d'une feature
//!
//! LAT/LON viennent du point lui-même ou du centroïde de la géométrie.
//! Date et heure sont écrites dans un format fixe, indépendant de la locale.

use chrono::{Local, NaiveDateTime};
use geo::{Centroid, Geometry};
use serde::{Deserialize, Serialize};

use crate::colour::Colour;
use crate::types::{AttributeBundle, FeatureAttributes, PendingFeature, ShapeKind, StampedFeature};
use crate::SketchError;

/// Format de l'attribut `Date` (ISO 8601)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format de l'attribut `Time` (24h)
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Écriture de l'attribut `colour` des polygones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColourNaming {
    /// Valeur fournie, telle quelle
    #[default]
    Hex,
    /// Nom de la couleur nommée la plus proche
    ClosestName,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeStamper {
    naming: ColourNaming,
}

impl AttributeStamper {
    pub fn new(naming: ColourNaming) -> Self {
        Self { naming }
    }

    /// Attributs horodatés avec l'heure locale courante
    pub fn stamp(
        &self,
        feature: &PendingFeature,
        shape: ShapeKind,
        attributes: &AttributeBundle,
    ) -> Result<StampedFeature, SketchError> {
        self.stamp_at(feature, shape, attributes, Local::now().naive_local())
    }

    pub fn stamp_at(
        &self,
        feature: &PendingFeature,
        shape: ShapeKind,
        attributes: &AttributeBundle,
        at: NaiveDateTime,
    ) -> Result<StampedFeature, SketchError> {
        let geometry = feature.geometry.as_ref().ok_or(SketchError::NullGeometry)?;
        let (lon, lat) = reference_lon_lat(geometry, shape).ok_or(SketchError::NullGeometry)?;

        let colour = match shape {
            ShapeKind::Polygon => self.colour_value(&attributes.colour),
            ShapeKind::Point | ShapeKind::Line => String::new(),
        };

        Ok(StampedFeature {
            geometry: geometry.clone(),
            attributes: FeatureAttributes {
                colour,
                shape: shape.layer_type().to_string(),
                code: attributes.code.clone(),
                lat: lat as f32,
                lon: lon as f32,
                surveyor: attributes.surveyor.clone(),
                type_txt: attributes.type_txt.clone(),
                date: at.format(DATE_FORMAT).to_string(),
                time: at.format(TIME_FORMAT).to_string(),
            },
        })
    }

    fn colour_value(&self, raw: &str) -> String {
        match self.naming {
            ColourNaming::Hex => raw.to_string(),
            ColourNaming::ClosestName => match Colour::parse(raw) {
                Ok(colour) => colour.closest_name().to_string(),
                Err(_) => raw.to_string(),
            },
        }
    }
}

/// Coordonnée de référence (lon, lat) : le point lui-même ou le centroïde
fn reference_lon_lat(geometry: &Geometry, shape: ShapeKind) -> Option<(f64, f64)> {
    match (shape, geometry) {
        (ShapeKind::Point, Geometry::Point(p)) => Some((p.x(), p.y())),
        _ => geometry.centroid().map(|c| (c.x(), c.y())),
    }
}
