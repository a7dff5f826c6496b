//! Export GeoJSON des couches de croquis avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use sketch::{Crs, StampedFeature};
use tracing::info;

use super::gpkg::{discover_layers, GpkgLayer};
use super::layer::SketchLayer;

/// Exporte des features en GeoJSON
pub fn export_to_geojson(features: &[StampedFeature], crs: Crs, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        crs.epsg()
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, i + 1, feature)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(writer: &mut W, id: usize, feature: &StampedFeature) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":{},"geometry":"#, id)?;

    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &feature.attributes)?;
    write!(writer, "}}")?;

    Ok(())
}

/// Exporte chaque couche de croquis d'un projet dans `<output>/<couche>.geojson`
///
/// Retourne les fichiers écrits avec leur nombre de features.
pub fn export_project(project: &Path, output_dir: &Path) -> Result<Vec<(PathBuf, usize)>> {
    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create directory: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for discovered in discover_layers(project)? {
        let layer = GpkgLayer::open_discovered(project, discovered)?;
        let features = layer.read_features()?;
        let output = output_dir.join(format!("{}.geojson", layer.name()));

        export_to_geojson(&features, layer.crs(), &output)?;
        info!(layer = %layer.name(), features = features.len(), output = %output.display(), "Layer exported");
        written.push((output, features.len()));
    }
    Ok(written)
}
