//! Session de numérisation sur une couche
//!
//! Relie l'outil de saisie (geste + buffer) au commit transactionnel.

use chrono::{Local, NaiveDateTime};
use geo::{Coord, Geometry};
use sketch::{
    AttributeBundle, AttributeStamper, Crs, DigitizingTool, GestureOutcome, RemoveOutcome,
};
use tracing::debug;

use crate::export::layer::SketchLayer;
use crate::export::transaction::FeatureCommitter;
use crate::report::{CommitReport, CommitStatus};

pub struct DigitizingSession<L: SketchLayer> {
    tool: DigitizingTool,
    layer: L,
    committer: FeatureCommitter,
}

impl<L: SketchLayer> DigitizingSession<L> {
    /// Session sur `layer`, saisie en `capture_crs`
    pub fn new(layer: L, capture_crs: Crs, stamper: AttributeStamper, multipart: bool) -> Self {
        Self {
            tool: DigitizingTool::new(layer.role().shape(), multipart),
            layer,
            committer: FeatureCommitter::new(capture_crs, stamper),
        }
    }

    pub fn tool(&self) -> &DigitizingTool {
        &self.tool
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn into_layer(self) -> L {
        self.layer
    }

    pub fn press(&mut self, at: Coord) -> GestureOutcome {
        self.tool.press(at)
    }

    pub fn move_to(&mut self, at: Coord) -> GestureOutcome {
        self.tool.move_to(at)
    }

    pub fn release(&mut self) -> GestureOutcome {
        self.tool.release()
    }

    /// Combine les segments multi-parties en une feature
    pub fn finish(&mut self) -> bool {
        self.tool.finish()
    }

    pub fn remove_last(&mut self) -> RemoveOutcome {
        self.tool.remove_last()
    }

    /// Abandonne toute la saisie non enregistrée
    pub fn discard(&mut self) {
        self.tool.discard();
    }

    pub fn preview(&self) -> Option<Geometry> {
        self.tool.preview()
    }

    pub fn save(&mut self, attributes: &AttributeBundle) -> CommitReport {
        self.save_at(attributes, Local::now().naive_local())
    }

    /// Enregistre la saisie en attente dans la couche
    ///
    /// Les segments multi-parties sont d'abord combinés. Après un commit, la
    /// saisie est remise à zéro ; après un rollback, les features restent en
    /// attente pour un nouvel essai.
    pub fn save_at(&mut self, attributes: &AttributeBundle, at: NaiveDateTime) -> CommitReport {
        self.tool.finish();

        let pending = self.tool.take_pending();
        if pending.is_empty() {
            debug!(layer = %self.layer.name(), "Nothing to save");
            return CommitReport::new(self.layer.name());
        }

        let report = self
            .committer
            .commit_at(&mut self.layer, &pending, attributes, at);

        match report.status {
            CommitStatus::Committed => self.tool.reset(),
            CommitStatus::RolledBack => self.tool.restore_pending(pending),
        }
        report
    }
}
