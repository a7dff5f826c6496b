//! # sketch
//!
//! Cœur de numérisation des croquis de terrain (santé des forêts).
//!
//! ## Features
//!
//! - Saisie en flux stylet posé / levé, simple ou multi-parties
//! - Buffer des features en attente avec annulation
//! - Calcul des attributs (LAT/LON, date, heure, couleur)
//! - Keypad de catégories éditable sur copie de travail
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geo::Coord;
//! use sketch::{DigitizingTool, ShapeKind};
//!
//! let mut tool = DigitizingTool::new(ShapeKind::Line, false);
//! tool.press(Coord { x: 0.0, y: 0.0 });
//! tool.move_to(Coord { x: 10.0, y: 0.0 });
//! tool.release();
//! assert_eq!(tool.buffer().len(), 1);
//! ```

pub mod buffer;
pub mod capture;
pub mod colour;
pub mod error;
pub mod keypad;
pub mod stamp;
pub mod tool;
pub mod types;

pub use buffer::PendingFeatureBuffer;
pub use capture::{CaptureState, GeometryAccumulator, GestureOutcome};
pub use colour::Colour;
pub use error::SketchError;
pub use keypad::{Category, Direction, Item, KeypadPersistence, KeypadStore};
pub use stamp::{AttributeStamper, ColourNaming};
pub use tool::{DigitizingTool, RemoveOutcome};
pub use types::{
    AttributeBundle, Crs, FeatureAttributes, LayerRole, PendingFeature, ShapeKind, StampedFeature,
};
