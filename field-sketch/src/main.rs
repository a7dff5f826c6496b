//! Point d'entrée CLI pour field-sketch

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use field_sketch::Settings;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Numériser des croquis de terrain vers GeoPackage
#[derive(Parser)]
#[command(name = "field-sketch")]
#[command(author, version)]
#[command(about = "Numériser des croquis de terrain vers des couches GeoPackage, avec keypad SQLite")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de paramètres JSON (défaut : valeurs intégrées + env SKETCH_*)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::NewProject {
            folder,
            name,
            epsg,
            notes,
        } => {
            info!(folder = ?folder, name = ?name, epsg = ?epsg, "New project");
            cli::cmd_new_project(&settings, folder, name, epsg, notes)?;
        }
        Commands::Layers { project } => {
            cli::cmd_layers(&project)?;
        }
        Commands::Replay {
            project,
            script,
            report,
        } => {
            info!(project = %project.display(), script = %script.display(), "Replay");
            cli::cmd_replay(&settings, &project, &script, report.as_deref())?;
        }
        Commands::Keypad { db, action } => {
            cli::cmd_keypad(&settings, db, action).await?;
        }
        Commands::ToGeojson { project, output } => {
            info!(project = %project.display(), output = %output.display(), "Export vers GeoJSON");
            cli::cmd_to_geojson(&project, &output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
