//! # field-sketch
//!
//! Numérisation de croquis de terrain vers des couches GeoPackage, avec un
//! keypad de codes stocké en SQLite.
//!
//! ## Features
//!
//! - Création de projets GeoPackage (points, polygones, lignes, notes)
//! - Commit transactionnel avec rollback complet
//! - Reprojection pure Rust (UTM, MGA, Web Mercator), PROJ en option
//! - Keypad persistant, accessible hors du thread de saisie
//! - Export GeoJSON standalone
//!
//! ## Usage CLI
//!
//! ```bash
//! # Nouveau projet en MGA zone 55
//! field-sketch new-project --folder ./survey --name block12 --epsg 28355
//!
//! # Rejouer un script de gestes dans la couche des lignes
//! field-sketch replay --project ./survey/block12.gpkg --script strokes.json
//!
//! # Export GeoJSON
//! field-sketch to-geojson --project ./survey/block12.gpkg --output ./geojson/
//! ```

pub mod config;
pub mod export;
pub mod keypad_db;
pub mod replay;
pub mod report;
pub mod reproject_lite;
pub mod session;

pub use config::Settings;
pub use export::{create_project, discover_layers, FeatureCommitter, GpkgLayer, MemoryLayer, SketchLayer};
pub use keypad_db::{KeypadDb, KeypadWorker, SelectedItem};
pub use replay::{GestureEvent, ReplayScript};
pub use report::{CommitReport, CommitStatus};
pub use reproject_lite::SmartReprojector;
pub use session::DigitizingSession;
