//! Conteneur GeoPackage des croquis
//!
//! Un projet est un fichier `.gpkg` avec une table de features par rôle
//! (`sketch-points`, `sketch-polygons`, `sketch-lines`, et `sketch-notes`
//! en option). Les géométries sont stockées au format binaire GeoPackage :
//! en-tête `GP` + WKB.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geo::{Geometry, MultiLineString, MultiPolygon};
use rusqlite::{params, Connection, TransactionBehavior};
use sketch::{Crs, FeatureAttributes, LayerRole, StampedFeature};
use thiserror::Error;
use tracing::{debug, info};
use wkb::{geom_to_wkb, wkb_to_geom};

use super::layer::SketchLayer;

/// `GPKG` en ASCII
const APPLICATION_ID: i32 = 0x4750_4B47;

/// GeoPackage 1.3.0
const USER_VERSION: i32 = 10300;

/// Nom de la colonne géométrique des tables de croquis
pub const GEOMETRY_COLUMN: &str = "geom";

const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

const CORE_TABLES: &str = r#"
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
"#;

/// Erreurs d'encodage des géométries GeoPackage
#[derive(Debug, Error)]
pub enum GpkgError {
    #[error("Invalid GeoPackage geometry header: {0}")]
    InvalidHeader(String),

    #[error("WKB error: {0}")]
    Wkb(String),
}

/// Type de géométrie déclaré pour la table d'un rôle
pub fn geometry_type_name(role: LayerRole) -> &'static str {
    match role {
        LayerRole::Points | LayerRole::Notes => "POINT",
        LayerRole::Lines => "MULTILINESTRING",
        LayerRole::Polygons => "MULTIPOLYGON",
    }
}

/// Convertit une géométrie simple vers le type multi de la couche
pub fn promote(role: LayerRole, geometry: Geometry) -> Geometry {
    match (role, geometry) {
        (LayerRole::Lines, Geometry::LineString(ls)) => {
            Geometry::MultiLineString(MultiLineString::new(vec![ls]))
        }
        (LayerRole::Polygons, Geometry::Polygon(p)) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![p]))
        }
        (_, geometry) => geometry,
    }
}

/// Encode une géométrie en binaire GeoPackage (petit-boutiste, sans enveloppe)
pub fn encode_geometry(geometry: &Geometry, srs_id: i32) -> Result<Vec<u8>, GpkgError> {
    let wkb = geom_to_wkb(geometry).map_err(|e| GpkgError::Wkb(format!("{:?}", e)))?;

    let mut blob = Vec::with_capacity(8 + wkb.len());
    blob.extend_from_slice(b"GP");
    blob.push(0); // version
    blob.push(0b0000_0001); // little endian, pas d'enveloppe
    blob.extend_from_slice(&srs_id.to_le_bytes());
    blob.extend_from_slice(&wkb);
    Ok(blob)
}

/// Décode un binaire GeoPackage, retourne la géométrie et son srs_id
pub fn decode_geometry(blob: &[u8]) -> Result<(Geometry, i32), GpkgError> {
    if blob.len() < 8 || &blob[..2] != b"GP" {
        return Err(GpkgError::InvalidHeader("missing GP magic".to_string()));
    }
    let flags = blob[3];
    let little_endian = flags & 0b1 == 1;
    let envelope_len = match (flags >> 1) & 0b111 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        other => {
            return Err(GpkgError::InvalidHeader(format!(
                "envelope indicator {}",
                other
            )))
        }
    };

    let srs_bytes = [blob[4], blob[5], blob[6], blob[7]];
    let srs_id = if little_endian {
        i32::from_le_bytes(srs_bytes)
    } else {
        i32::from_be_bytes(srs_bytes)
    };

    let start = 8 + envelope_len;
    if blob.len() <= start {
        return Err(GpkgError::InvalidHeader("truncated geometry".to_string()));
    }
    let geometry = wkb_to_geom(&mut Cursor::new(&blob[start..]))
        .map_err(|e| GpkgError::Wkb(format!("{:?}", e)))?;
    Ok((geometry, srs_id))
}

/// Protège un identifiant SQL (les noms de couches contiennent des tirets)
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn srs_id(crs: Crs) -> Result<i32> {
    i32::try_from(crs.epsg()).context(format!("{} is out of range for a srs_id", crs))
}

/// Chemin du fichier projet
pub fn project_path(folder: &Path, name: &str) -> PathBuf {
    folder.join(format!("{}.gpkg", name))
}

/// Crée un projet de croquis avec ses couches vides
///
/// Échoue si le fichier existe déjà.
pub fn create_project(folder: &Path, name: &str, crs: Crs, with_notes: bool) -> Result<PathBuf> {
    let path = project_path(folder, name);
    if path.exists() {
        bail!("Project file already exists: {}", path.display());
    }
    std::fs::create_dir_all(folder)
        .context(format!("Failed to create folder: {}", folder.display()))?;

    let mut conn = Connection::open(&path)
        .context(format!("Failed to create GeoPackage: {}", path.display()))?;
    conn.execute_batch(&format!(
        "PRAGMA application_id = {}; PRAGMA user_version = {};",
        APPLICATION_ID, USER_VERSION
    ))?;

    let srs = srs_id(crs)?;
    let tx = conn.transaction()?;
    tx.execute_batch(CORE_TABLES)
        .context("Failed to create GeoPackage core tables")?;

    let mut insert_srs = tx.prepare(
        "INSERT OR IGNORE INTO gpkg_spatial_ref_sys
         (srs_name, srs_id, organization, organization_coordsys_id, definition, description)
         VALUES (?, ?, ?, ?, ?, ?)",
    )?;
    insert_srs.execute(params!["Undefined cartesian SRS", -1, "NONE", -1, "undefined", ""])?;
    insert_srs.execute(params!["Undefined geographic SRS", 0, "NONE", 0, "undefined", ""])?;
    insert_srs.execute(params!["WGS 84 geodetic", 4326, "EPSG", 4326, WGS84_WKT, ""])?;
    insert_srs.execute(params![crs.to_string(), srs, "EPSG", srs, "undefined", ""])?;
    drop(insert_srs);

    let roles = LayerRole::CORE
        .into_iter()
        .chain(with_notes.then_some(LayerRole::Notes));
    let mut created = 0;
    for role in roles {
        create_layer_table(&tx, role, srs)?;
        created += 1;
    }
    tx.commit().context("Failed to commit project creation")?;

    info!(path = %path.display(), crs = %crs, layers = created, "Project created");
    Ok(path)
}

fn create_layer_table(conn: &Connection, role: LayerRole, srs: i32) -> Result<()> {
    let table = role.layer_name();
    let geometry_type = geometry_type_name(role);

    conn.execute_batch(&format!(
        "CREATE TABLE {} (
            fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            {} {},
            colour TEXT,
            Shape TEXT,
            Code TEXT,
            LAT REAL,
            LON REAL,
            Surveyor TEXT,
            Type TEXT,
            Date TEXT,
            Time TEXT
        );",
        quote_ident(table),
        GEOMETRY_COLUMN,
        geometry_type
    ))
    .context(format!("Failed to create layer table {}", table))?;

    conn.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
         VALUES (?, 'features', ?, ?)",
        params![table, table, srs],
    )?;
    conn.execute(
        "INSERT INTO gpkg_geometry_columns
         (table_name, column_name, geometry_type_name, srs_id, z, m)
         VALUES (?, ?, ?, ?, 0, 0)",
        params![table, GEOMETRY_COLUMN, geometry_type, srs],
    )?;

    debug!(layer = table, geometry_type, "Layer table created");
    Ok(())
}

/// Couche de croquis trouvée dans un conteneur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLayer {
    pub name: String,
    pub role: LayerRole,
    pub crs: Crs,
}

/// Liste les couches de croquis d'un conteneur, dans l'ordre de création
pub fn discover_layers(path: &Path) -> Result<Vec<DiscoveredLayer>> {
    let conn = open_existing(path)?;
    let mut stmt = conn.prepare(
        "SELECT c.table_name, g.srs_id
         FROM gpkg_contents AS c
         INNER JOIN gpkg_geometry_columns AS g ON g.table_name = c.table_name
         WHERE c.data_type = 'features'
         ORDER BY c.rowid",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut layers = Vec::new();
    for row in rows {
        let (name, srs) = row?;
        if let Some(role) = LayerRole::from_layer_name(&name) {
            layers.push(DiscoveredLayer {
                name,
                role,
                crs: Crs::new(srs.max(0) as u32),
            });
        }
    }
    Ok(layers)
}

fn open_existing(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!("GeoPackage not found: {}", path.display());
    }
    Connection::open(path).context(format!("Failed to open GeoPackage: {}", path.display()))
}

/// Couche de croquis stockée dans un GeoPackage
///
/// La session d'édition est tenue en mémoire : aucune transaction SQLite ne
/// reste ouverte entre deux commits, plusieurs couches d'un même projet
/// s'éditent donc en parallèle. `commit_changes` écrit la session en une
/// transaction `IMMEDIATE`.
pub struct GpkgLayer {
    conn: Connection,
    path: PathBuf,
    name: String,
    role: LayerRole,
    crs: Crs,
    session: Option<Vec<StagedRow>>,
}

/// Feature encodée, en attente de commit
struct StagedRow {
    blob: Vec<u8>,
    attributes: FeatureAttributes,
}

impl GpkgLayer {
    /// Ouvre la couche d'un rôle donné
    pub fn open(path: &Path, role: LayerRole) -> Result<Self> {
        let layer = discover_layers(path)?
            .into_iter()
            .find(|l| l.role == role)
            .with_context(|| format!("No {} layer in {}", role.layer_name(), path.display()))?;
        Self::open_discovered(path, layer)
    }

    /// Ouvre une couche déjà listée par [`discover_layers`]
    pub fn open_discovered(path: &Path, layer: DiscoveredLayer) -> Result<Self> {
        Ok(Self {
            conn: open_existing(path)?,
            path: path.to_path_buf(),
            name: layer.name,
            role: layer.role,
            crs: layer.crs,
            session: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nombre de features en attente dans la session
    pub fn staged_count(&self) -> usize {
        self.session.as_ref().map_or(0, Vec::len)
    }

    fn stage(&self, feature: &StampedFeature, srs: i32) -> Result<StagedRow> {
        let geometry = promote(self.role, feature.geometry.clone());
        Ok(StagedRow {
            blob: encode_geometry(&geometry, srs)?,
            attributes: feature.attributes.clone(),
        })
    }
}

fn insert_row(conn: &Connection, table: &str, row: &StagedRow) -> Result<()> {
    let a = &row.attributes;
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} ({}, colour, Shape, Code, LAT, LON, Surveyor, Type, Date, Time)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        quote_ident(table),
        GEOMETRY_COLUMN
    ))?;
    stmt.execute(params![
        row.blob,
        a.colour,
        a.shape,
        a.code,
        a.lat as f64,
        a.lon as f64,
        a.surveyor,
        a.type_txt,
        a.date,
        a.time
    ])?;
    Ok(())
}

impl SketchLayer for GpkgLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> LayerRole {
        self.role
    }

    fn crs(&self) -> Crs {
        self.crs
    }

    fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    fn start_editing(&mut self) -> Result<()> {
        if self.session.is_none() {
            self.session = Some(Vec::new());
        }
        Ok(())
    }

    fn add_features(&mut self, features: &[StampedFeature]) -> Result<()> {
        if !self.is_editing() {
            bail!("Layer {} is not in edit mode", self.name);
        }
        let srs = srs_id(self.crs)?;
        let mut rows = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            rows.push(
                self.stage(feature, srs)
                    .context(format!("Failed to add feature #{} to {}", index, self.name))?,
            );
        }
        if let Some(session) = self.session.as_mut() {
            session.extend(rows);
        }
        Ok(())
    }

    fn commit_changes(&mut self) -> Result<()> {
        let Some(rows) = self.session.as_ref() else {
            return Ok(());
        };

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context(format!("Failed to lock {} for commit", self.name))?;
        for (index, row) in rows.iter().enumerate() {
            insert_row(&tx, &self.name, row)
                .context(format!("Failed to write feature #{} to {}", index, self.name))?;
        }
        tx.execute(
            "UPDATE gpkg_contents
             SET last_change = strftime('%Y-%m-%dT%H:%M:%fZ','now')
             WHERE table_name = ?",
            params![self.name],
        )?;
        tx.commit()
            .context(format!("Failed to commit {}", self.name))?;

        debug!(layer = %self.name, features = rows.len(), "Layer committed");
        self.session = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }

    fn feature_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(&self.name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn read_features(&self) -> Result<Vec<StampedFeature>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, colour, Shape, Code, LAT, LON, Surveyor, Type, Date, Time
             FROM {} ORDER BY fid",
            GEOMETRY_COLUMN,
            quote_ident(&self.name)
        ))?;

        let rows = stmt.query_map([], |row| {
            let blob: Option<Vec<u8>> = row.get(0)?;
            let attributes = FeatureAttributes {
                colour: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                shape: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                code: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                lat: row.get::<_, Option<f64>>(4)?.unwrap_or_default() as f32,
                lon: row.get::<_, Option<f64>>(5)?.unwrap_or_default() as f32,
                surveyor: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                type_txt: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                date: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                time: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            };
            Ok((blob, attributes))
        })?;

        let mut features = Vec::new();
        for row in rows {
            let (blob, attributes) = row?;
            // Les lignes sans géométrie ne sont pas des croquis
            let Some(blob) = blob else { continue };
            let (geometry, _) = decode_geometry(&blob)?;
            features.push(StampedFeature {
                geometry,
                attributes,
            });
        }
        Ok(features)
    }
}

/// Nombre de features validées par couche, sans ouvrir de session
pub fn layer_counts(path: &Path) -> Result<Vec<(DiscoveredLayer, usize)>> {
    let conn = open_existing(path)?;
    discover_layers(path)?
        .into_iter()
        .map(|layer| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(&layer.name)),
                [],
                |row| row.get(0),
            )?;
            Ok((layer, count as usize))
        })
        .collect()
}
