//! Types d'erreurs pour le crate sketch

use thiserror::Error;

use crate::types::{Crs, ShapeKind};

/// Erreurs pouvant survenir pendant la numérisation, le commit ou l'édition du keypad
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SketchError {
    /// Tracé trop court pour former une géométrie
    #[error("Degenerate {shape} geometry: {points} point(s), at least {required} required")]
    DegenerateGeometry {
        shape: ShapeKind,
        points: usize,
        required: usize,
    },

    /// Feature arrivée au commit sans géométrie
    #[error("Feature has no geometry")]
    NullGeometry,

    /// Échec de transformation entre deux CRS
    #[error("Reprojection from {from} to {to} failed: {reason}")]
    ReprojectionError { from: Crs, to: Crs, reason: String },

    /// Échec d'écriture dans la couche (rollback complet)
    #[error("Commit to layer {layer} failed: {reason}")]
    CommitFailed { layer: String, reason: String },

    /// Catégorie ou élément introuvable
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Une catégorie du même nom existe déjà
    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    /// Modification du keypad hors session d'édition
    #[error("Keypad is not in an edit session")]
    NotEditing,

    /// Couleur illisible
    #[error("Invalid colour: {0}")]
    InvalidColour(String),
}

impl SketchError {
    /// Crée une erreur de géométrie dégénérée
    pub fn degenerate(shape: ShapeKind, points: usize) -> Self {
        Self::DegenerateGeometry {
            shape,
            points,
            required: shape.min_points(),
        }
    }

    /// Crée une erreur de reprojection avec contexte
    pub fn reprojection(from: Crs, to: Crs, reason: impl Into<String>) -> Self {
        Self::ReprojectionError {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de commit avec contexte
    pub fn commit_failed(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommitFailed {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn category_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Category",
            name: name.into(),
        }
    }

    pub fn item_not_found(category: &str, item: &str) -> Self {
        Self::NotFound {
            kind: "Item",
            name: format!("{}:{}", category, item),
        }
    }

    /// Vrai pour les erreurs isolées à une feature (le commit continue)
    pub fn is_per_feature(&self) -> bool {
        matches!(
            self,
            Self::NullGeometry | Self::ReprojectionError { .. } | Self::DegenerateGeometry { .. }
        )
    }
}
