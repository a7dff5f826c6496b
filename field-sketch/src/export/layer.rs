//! Couche de croquis : interface d'écriture transactionnelle
//!
//! Une couche s'édite en transaction : `start_editing` ouvre la session
//! (sans effet si elle est déjà ouverte), `add_features` écrit dans la
//! session, `commit_changes` la valide et `rollback` l'annule entièrement.

use anyhow::{bail, Result};
use sketch::{Crs, LayerRole, StampedFeature};
use tracing::debug;

/// Couche vectorielle cible d'un commit
pub trait SketchLayer {
    /// Nom de la couche dans son conteneur
    fn name(&self) -> &str;

    fn role(&self) -> LayerRole;

    /// CRS de stockage des géométries
    fn crs(&self) -> Crs;

    fn is_editing(&self) -> bool;

    /// Ouvre une session d'édition, idempotent
    fn start_editing(&mut self) -> Result<()>;

    /// Ajoute des features à la session en cours
    fn add_features(&mut self, features: &[StampedFeature]) -> Result<()>;

    /// Valide la session en cours
    fn commit_changes(&mut self) -> Result<()>;

    /// Annule la session en cours, sans effet hors session
    fn rollback(&mut self) -> Result<()>;

    /// Nombre de features validées
    fn feature_count(&self) -> Result<usize>;

    /// Features validées, dans l'ordre d'insertion
    fn read_features(&self) -> Result<Vec<StampedFeature>>;
}

/// Couche en mémoire, avec injection de pannes
#[derive(Debug, Clone)]
pub struct MemoryLayer {
    name: String,
    role: LayerRole,
    crs: Crs,
    committed: Vec<StampedFeature>,
    session: Option<Vec<StampedFeature>>,
    fail_add: bool,
    fail_commit: bool,
}

impl MemoryLayer {
    pub fn new(role: LayerRole, crs: Crs) -> Self {
        Self {
            name: role.layer_name().to_string(),
            role,
            crs,
            committed: Vec::new(),
            session: None,
            fail_add: false,
            fail_commit: false,
        }
    }

    /// Fait échouer tous les appels à `add_features`
    pub fn failing_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    /// Fait échouer tous les appels à `commit_changes`
    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Features ajoutées dans la session en cours
    pub fn staged(&self) -> &[StampedFeature] {
        self.session.as_deref().unwrap_or_default()
    }
}

impl SketchLayer for MemoryLayer {
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
        if self.fail_add {
            bail!("Injected add failure on {}", self.name);
        }
        match self.session.as_mut() {
            Some(session) => {
                session.extend_from_slice(features);
                Ok(())
            }
            None => bail!("Layer {} is not in edit mode", self.name),
        }
    }

    fn commit_changes(&mut self) -> Result<()> {
        if self.fail_commit {
            bail!("Injected commit failure on {}", self.name);
        }
        if let Some(session) = self.session.take() {
            debug!(layer = %self.name, features = session.len(), "Memory layer committed");
            self.committed.extend(session);
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }

    fn feature_count(&self) -> Result<usize> {
        Ok(self.committed.len())
    }

    fn read_features(&self) -> Result<Vec<StampedFeature>> {
        Ok(self.committed.clone())
    }
}
