//! Types de données pour le crate sketch

use std::fmt;

use geo::Geometry;
use serde::{Deserialize, Serialize};

/// Forme d'une couche de croquis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Polygon,
    Line,
}

impl ShapeKind {
    /// Nombre minimal de sommets pour une géométrie valide
    pub fn min_points(self) -> usize {
        match self {
            ShapeKind::Point => 1,
            ShapeKind::Line => 2,
            ShapeKind::Polygon => 3,
        }
    }

    /// Nom utilisé dans les couches et dans l'attribut `Shape`
    pub fn layer_type(self) -> &'static str {
        match self {
            ShapeKind::Point => "points",
            ShapeKind::Polygon => "polygons",
            ShapeKind::Line => "lines",
        }
    }

    pub fn from_layer_type(name: &str) -> Option<Self> {
        match name {
            "points" | "point" => Some(ShapeKind::Point),
            "polygons" | "polygon" => Some(ShapeKind::Polygon),
            "lines" | "line" => Some(ShapeKind::Line),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Point => "point",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Line => "line",
        };
        f.write_str(name)
    }
}

/// Rôle d'une couche dans un conteneur de croquis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRole {
    Points,
    Polygons,
    Lines,
    Notes,
}

/// Préfixe commun des couches de croquis
pub const LAYER_PREFIX: &str = "sketch-";

impl LayerRole {
    pub const CORE: [LayerRole; 3] = [LayerRole::Points, LayerRole::Polygons, LayerRole::Lines];

    /// Nom de la couche dans le conteneur (ex: `sketch-points`)
    pub fn layer_name(self) -> &'static str {
        match self {
            LayerRole::Points => "sketch-points",
            LayerRole::Polygons => "sketch-polygons",
            LayerRole::Lines => "sketch-lines",
            LayerRole::Notes => "sketch-notes",
        }
    }

    /// Forme des géométries de la couche (les notes sont des points)
    pub fn shape(self) -> ShapeKind {
        match self {
            LayerRole::Points | LayerRole::Notes => ShapeKind::Point,
            LayerRole::Polygons => ShapeKind::Polygon,
            LayerRole::Lines => ShapeKind::Line,
        }
    }

    /// Retrouve le rôle d'une couche existante depuis son nom
    ///
    /// Toute couche contenant le marqueur de rôle est reconnue, ce qui
    /// accepte aussi les couches renommées avec un préfixe de projet.
    pub fn from_layer_name(name: &str) -> Option<Self> {
        [
            LayerRole::Points,
            LayerRole::Polygons,
            LayerRole::Lines,
            LayerRole::Notes,
        ]
        .into_iter()
        .find(|role| name.contains(role.layer_name()))
    }
}

/// Système de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(u32);

impl Crs {
    pub const WGS84: Crs = Crs(4326);
    pub const WEB_MERCATOR: Crs = Crs(3857);

    pub const fn new(epsg: u32) -> Self {
        Self(epsg)
    }

    pub fn epsg(self) -> u32 {
        self.0
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Attributs fournis par l'opérateur au moment de l'enregistrement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBundle {
    pub surveyor: String,
    pub type_txt: String,
    /// Couleur de remplissage (utilisée uniquement pour les polygones)
    #[serde(default)]
    pub colour: String,
    #[serde(default)]
    pub code: String,
}

/// Attributs persistés d'une feature
///
/// Les noms sérialisés sont ceux des champs des couches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttributes {
    pub colour: String,
    #[serde(rename = "Shape")]
    pub shape: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "LAT")]
    pub lat: f32,
    #[serde(rename = "LON")]
    pub lon: f32,
    #[serde(rename = "Surveyor")]
    pub surveyor: String,
    #[serde(rename = "Type")]
    pub type_txt: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
}

/// Géométrie finalisée en attente de commit
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFeature {
    /// Géométrie en CRS de saisie (`None` si la feature a été vidée)
    pub geometry: Option<Geometry>,

    /// Forme de la couche d'origine
    pub shape: ShapeKind,

    /// Attributs provisoires, calculés au commit s'ils sont absents
    pub attributes: Option<FeatureAttributes>,
}

impl PendingFeature {
    pub fn new(shape: ShapeKind, geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            shape,
            attributes: None,
        }
    }

    /// Feature sans géométrie (ignorée au commit)
    pub fn empty(shape: ShapeKind) -> Self {
        Self {
            geometry: None,
            shape,
            attributes: None,
        }
    }
}

/// Feature prête à être écrite dans une couche
#[derive(Debug, Clone, PartialEq)]
pub struct StampedFeature {
    pub geometry: Geometry,
    pub attributes: FeatureAttributes,
}
