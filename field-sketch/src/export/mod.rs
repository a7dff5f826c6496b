//! Modules d'export (GeoPackage, GeoJSON)

pub mod geojson;
pub mod gpkg;
pub mod layer;
pub mod reproject;
pub mod transaction;

pub use gpkg::{create_project, discover_layers, GpkgLayer};
pub use layer::{MemoryLayer, SketchLayer};
pub use transaction::FeatureCommitter;
