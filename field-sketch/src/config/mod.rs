//! Configuration du projet de croquis

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sketch::{AttributeBundle, AttributeStamper, ColourNaming, Crs};
use tracing::debug;

/// Paramètres de saisie et de stockage
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Nom du projet (nom du fichier GeoPackage, sans extension)
    pub project_name: String,

    /// Dossier de sortie des projets
    pub output_folder: PathBuf,

    /// Initiales de l'observateur
    pub surveyor: String,

    /// Type de relevé (ex: Aerial, Ground)
    pub type_txt: String,

    /// Couleur de remplissage des polygones
    pub colour: String,

    /// Écriture de l'attribut `colour`
    pub colour_naming: ColourNaming,

    /// Intervalle de mise à jour GPS, en secondes
    pub gps_interval_secs: u64,

    /// EPSG du canevas de saisie
    pub capture_epsg: u32,

    /// EPSG de stockage des couches
    pub layer_epsg: u32,

    /// Base SQLite du keypad
    pub keypad_db: PathBuf,

    /// Créer aussi la couche de notes
    pub with_notes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: "sketch".into(),
            output_folder: PathBuf::from("."),
            surveyor: String::new(),
            type_txt: "Aerial".into(),
            colour: "#FF0000".into(),
            colour_naming: ColourNaming::Hex,
            gps_interval_secs: 10,
            capture_epsg: 4326,
            layer_epsg: 4326,
            keypad_db: PathBuf::from("keypad.sqlite"),
            with_notes: false,
        }
    }
}

impl Settings {
    /// Charge les paramètres depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse settings JSON")
    }

    /// Charge le fichier s'il est fourni, sinon les valeurs par défaut, puis
    /// applique les variables d'environnement
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Surcharge depuis les variables d'environnement `SKETCH_*`
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
        if let Some(surveyor) = var("SKETCH_SURVEYOR") {
            self.surveyor = surveyor;
        }
        if let Some(type_txt) = var("SKETCH_TYPE") {
            self.type_txt = type_txt;
        }
        if let Some(epsg) = var("SKETCH_CAPTURE_EPSG").and_then(|s| s.parse().ok()) {
            self.capture_epsg = epsg;
        }
        if let Some(epsg) = var("SKETCH_LAYER_EPSG").and_then(|s| s.parse().ok()) {
            self.layer_epsg = epsg;
        }
        if let Some(path) = var("SKETCH_KEYPAD_DB") {
            self.keypad_db = PathBuf::from(path);
        }
        debug!(
            surveyor = %self.surveyor,
            capture_epsg = self.capture_epsg,
            layer_epsg = self.layer_epsg,
            "Settings resolved"
        );
    }

    pub fn capture_crs(&self) -> Crs {
        Crs::new(self.capture_epsg)
    }

    pub fn layer_crs(&self) -> Crs {
        Crs::new(self.layer_epsg)
    }

    pub fn stamper(&self) -> AttributeStamper {
        AttributeStamper::new(self.colour_naming)
    }

    /// Attributs opérateur pour un enregistrement
    pub fn attribute_bundle(&self, code: &str) -> AttributeBundle {
        AttributeBundle {
            surveyor: self.surveyor.clone(),
            type_txt: self.type_txt.clone(),
            colour: self.colour.clone(),
            code: code.to_string(),
        }
    }

    /// Chemin du GeoPackage du projet
    pub fn project_path(&self) -> PathBuf {
        crate::export::gpkg::project_path(&self.output_folder, &self.project_name)
    }
}
