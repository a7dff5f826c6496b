//! Définition et implémentation des commandes CLI
//!
//! - `new-project` : crée un GeoPackage avec les couches de croquis
//! - `layers` : liste les couches d'un projet
//! - `replay` : rejoue un script de gestes et enregistre le résultat
//! - `keypad` : consulte et modifie la base du keypad
//! - `to-geojson` : exporte les couches en GeoJSON

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use field_sketch::export::geojson::export_project;
use field_sketch::export::gpkg::layer_counts;
use field_sketch::{
    create_project, DigitizingSession, GpkgLayer, KeypadWorker, ReplayScript, Settings,
    SketchLayer, SmartReprojector,
};
use sketch::{Category, Colour, Crs, Direction, Item, KeypadStore, SketchError};
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new sketch project (GeoPackage with points, polygons and lines layers)
    NewProject {
        /// Output folder (default: settings output_folder)
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// Project name, without extension (default: settings project_name)
        #[arg(short, long)]
        name: Option<String>,

        /// Layer EPSG code (default: settings layer_epsg)
        #[arg(long)]
        epsg: Option<u32>,

        /// Also create the sketch-notes layer
        #[arg(long)]
        notes: bool,
    },

    /// List the sketch layers of a project
    Layers {
        /// Path to the project GeoPackage
        #[arg(short, long)]
        project: PathBuf,
    },

    /// Replay a JSON gesture script into a project layer and save it
    Replay {
        /// Path to the project GeoPackage
        #[arg(short, long)]
        project: PathBuf,

        /// Gesture script (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Write the commit report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Inspect and edit the keypad database
    Keypad {
        /// Keypad database (default: settings keypad_db)
        #[arg(long)]
        db: Option<PathBuf>,

        #[command(subcommand)]
        action: KeypadAction,
    },

    /// Export the layers of a project to GeoJSON
    ToGeojson {
        /// Path to the project GeoPackage
        #[arg(short, long)]
        project: PathBuf,

        /// Output directory for GeoJSON files
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum KeypadAction {
    /// Reset the database to the default keypad
    Init,

    /// List categories and items
    List,

    /// List the items of selected categories
    Selected,

    /// Add a category
    AddCategory {
        name: String,

        /// Category colour (#RRGGBB)
        #[arg(long, default_value = "#FFFFFF")]
        colour: String,

        /// Comma separated items
        #[arg(long, default_value = "")]
        items: String,

        #[arg(long)]
        selected: bool,
    },

    /// Add an item to a category
    AddItem { category: String, item: String },

    /// Remove a category and its items
    RemoveCategory { name: String },

    /// Remove every item with this text from a category
    RemoveItem { category: String, item: String },

    /// Rename every item with this text in a category
    RenameItem {
        category: String,
        old: String,
        new: String,
    },

    /// Move a category up or down
    MoveCategory { name: String, direction: Direction },

    /// Move an item up or down within its category
    MoveItem {
        category: String,
        item: String,
        direction: Direction,
    },

    /// Select (or deselect with --off) a category
    Select {
        name: String,

        #[arg(long)]
        off: bool,
    },

    /// Change the colour of a category
    Colour { name: String, colour: String },
}

/// Exécute la commande new-project
pub fn cmd_new_project(
    settings: &Settings,
    folder: Option<PathBuf>,
    name: Option<String>,
    epsg: Option<u32>,
    notes: bool,
) -> Result<()> {
    let folder = folder.unwrap_or_else(|| settings.output_folder.clone());
    let name = name.unwrap_or_else(|| settings.project_name.clone());
    let crs = Crs::new(epsg.unwrap_or(settings.layer_epsg));

    if SmartReprojector::new(settings.capture_crs(), crs).is_err() {
        warn!(capture = %settings.capture_crs(), layer = %crs, "No transform available from capture CRS");
    }

    let path = create_project(&folder, &name, crs, notes || settings.with_notes)?;
    println!("Project created: {}", path.display());
    Ok(())
}

/// Exécute la commande layers
pub fn cmd_layers(project: &Path) -> Result<()> {
    let counts = layer_counts(project)?;
    if counts.is_empty() {
        println!("No sketch layers in {}", project.display());
        return Ok(());
    }

    println!("=== {} ===", project.display());
    for (layer, count) in counts {
        println!(
            "  {:<24} {:<9} {:<11} {} features",
            layer.name,
            layer.role.shape().layer_type(),
            layer.crs.to_string(),
            count
        );
    }
    Ok(())
}

/// Exécute la commande replay
pub fn cmd_replay(settings: &Settings, project: &Path, script: &Path, report_path: Option<&Path>) -> Result<()> {
    let script = ReplayScript::load(script)?;
    let layer = GpkgLayer::open(project, script.layer)?;

    info!(
        layer = %layer.name(),
        events = script.events.len(),
        multipart = script.multipart,
        "Replaying gestures"
    );

    let mut session = DigitizingSession::new(
        layer,
        settings.capture_crs(),
        settings.stamper(),
        script.multipart,
    );
    let stats = script.replay(&mut session);
    println!(
        "Events: {}, discarded strokes: {}, undo: {}",
        stats.events, stats.discarded, stats.undone
    );

    let report = session.save(&settings.attribute_bundle(&script.code));
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        info!(path = %path.display(), "Report saved");
    }

    if !report.is_committed() {
        bail!("Commit rolled back on {}", report.layer);
    }
    Ok(())
}

/// Exécute la commande to-geojson
pub fn cmd_to_geojson(project: &Path, output: &Path) -> Result<()> {
    let written = export_project(project, output)?;

    println!("=== Export {} ===", project.display());
    for (path, count) in &written {
        println!("  {} ({} features)", path.display(), count);
    }
    Ok(())
}

/// Exécute la commande keypad
pub async fn cmd_keypad(settings: &Settings, db: Option<PathBuf>, action: KeypadAction) -> Result<()> {
    let path = db.unwrap_or_else(|| settings.keypad_db.clone());
    let worker = KeypadWorker::open(&path)?;
    let result = run_keypad_action(&worker, action).await;
    worker.shutdown().await?;
    result
}

async fn run_keypad_action(worker: &KeypadWorker, action: KeypadAction) -> Result<()> {
    match action {
        KeypadAction::Init => {
            let categories = worker.seed_defaults().await?;
            println!("Keypad reset: {} categories", categories.len());
            Ok(())
        }
        KeypadAction::List => {
            let store = worker.load_store().await?;
            print_keypad(store.categories());
            Ok(())
        }
        KeypadAction::Selected => {
            for selected in worker.selected_items().await? {
                println!("  {} {}", selected.colour, selected.item);
            }
            Ok(())
        }
        KeypadAction::AddCategory {
            name,
            colour,
            items,
            selected,
        } => {
            let colour = Colour::parse(&colour)?;
            let category = Category::with_item_list(name, colour, &items).selected(selected);
            edit_keypad(worker, |store| store.add_category(category)).await
        }
        KeypadAction::AddItem { category, item } => {
            edit_keypad(worker, |store| store.add_item(&category, Item::new(item))).await
        }
        KeypadAction::RemoveCategory { name } => {
            edit_keypad(worker, |store| store.remove_category(&name)).await
        }
        KeypadAction::RemoveItem { category, item } => {
            edit_keypad(worker, |store| {
                let removed = store.remove_item(&category, &item)?;
                println!("Removed {} item(s)", removed);
                Ok(())
            })
            .await
        }
        KeypadAction::RenameItem { category, old, new } => {
            edit_keypad(worker, |store| {
                let renamed = store.rename_item(&category, &old, &new)?;
                println!("Renamed {} item(s)", renamed);
                Ok(())
            })
            .await
        }
        KeypadAction::MoveCategory { name, direction } => {
            edit_keypad(worker, |store| {
                if !store.move_category(&name, direction)? {
                    println!("{} is already at the {:?} boundary", name, direction);
                }
                Ok(())
            })
            .await
        }
        KeypadAction::MoveItem {
            category,
            item,
            direction,
        } => {
            edit_keypad(worker, |store| {
                if !store.move_item(&category, &item, direction)? {
                    println!("{} is already at the {:?} boundary", item, direction);
                }
                Ok(())
            })
            .await
        }
        KeypadAction::Select { name, off } => {
            edit_keypad(worker, |store| store.set_category_selected(&name, !off)).await
        }
        KeypadAction::Colour { name, colour } => {
            let colour = Colour::parse(&colour)?;
            edit_keypad(worker, |store| store.set_category_colour(&name, colour)).await
        }
    }
}

/// Charge le keypad, applique une modification sur la copie de travail et
/// persiste le résultat
///
/// Si la modification échoue, la copie de travail est abandonnée.
async fn edit_keypad<F>(worker: &KeypadWorker, edit: F) -> Result<()>
where
    F: FnOnce(&mut KeypadStore) -> Result<(), SketchError>,
{
    let mut store = worker.load_store().await?;
    store.begin_edit();

    if let Err(e) = edit(&mut store) {
        store.discard();
        return Err(e).context("Keypad edit rejected");
    }

    worker.apply(&mut store).await?;
    print_keypad(store.categories());
    Ok(())
}

fn print_keypad(categories: &[Category]) {
    for category in categories {
        let marker = if category.selected { "*" } else { " " };
        println!("{} {} [{}]", marker, category.name, category.colour);
        for item in &category.items {
            println!("      {}", item.text);
        }
    }
}
