//! Rapport de commit d'une couche de croquis
//!
//! Les échecs par feature (géométrie nulle, reprojection) sont collectés
//! en warnings et n'empêchent pas le commit. Un échec d'écriture annule
//! tout le lot.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sketch::SketchError;

/// État final de la transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommitStatus {
    /// Features écrites et validées
    Committed,
    /// Transaction annulée, rien n'a été écrit
    RolledBack,
}

/// Feature ignorée pendant le commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitWarning {
    /// Position de la feature dans le lot
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    /// Nom de la couche cible
    pub layer: String,
    /// Nombre de features persistées
    pub written: usize,
    /// Nombre de features ignorées
    pub skipped: usize,
    pub status: CommitStatus,
    pub warnings: Vec<CommitWarning>,
    /// Cause du rollback
    pub error: Option<String>,
}

impl CommitReport {
    pub fn new(layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
            written: 0,
            skipped: 0,
            status: CommitStatus::Committed,
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Enregistre une feature ignorée
    pub fn record_skip(&mut self, index: usize, error: &SketchError) {
        self.skipped += 1;
        self.warnings.push(CommitWarning {
            index,
            message: error.to_string(),
        });
    }

    /// Marque le lot comme validé
    pub fn committed(mut self, written: usize) -> Self {
        self.written = written;
        self.status = CommitStatus::Committed;
        self
    }

    /// Marque le lot comme annulé : aucune feature écrite
    pub fn rolled_back(mut self, error: &SketchError) -> Self {
        self.written = 0;
        self.status = CommitStatus::RolledBack;
        self.error = Some(error.to_string());
        self
    }

    pub fn is_committed(&self) -> bool {
        self.status == CommitStatus::Committed
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("COMMIT REPORT - {}", self.layer);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Features: {} written, {} skipped", self.written, self.skipped);

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [#{}] {}", w.index, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if let Some(error) = &self.error {
            println!("\n--- ERROR ---");
            println!("  {}", error);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {:?}, {} written, {} skipped",
            self.layer, self.status, self.written, self.skipped
        )
    }
}
