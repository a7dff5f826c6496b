//! Outil de numérisation : accumulateur de geste + buffer de features
//!
//! Version sans interface graphique de l'outil de carte : les événements
//! appui / déplacement / relâchement arrivent déjà en coordonnées carte.

use geo::{Coord, Geometry};
use tracing::debug;

use crate::buffer::PendingFeatureBuffer;
use crate::capture::{GeometryAccumulator, GestureOutcome};
use crate::types::{PendingFeature, ShapeKind};

/// Effet d'une demande d'annulation
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// La séquence en cours a été abandonnée
    InProgressCleared,
    /// Les segments multi-parties non enregistrés ont été abandonnés
    SegmentsCleared(usize),
    /// La dernière feature finalisée a été retirée
    Removed(PendingFeature),
    /// Rien à annuler
    Nothing,
}

#[derive(Debug, Clone)]
pub struct DigitizingTool {
    accumulator: GeometryAccumulator,
    buffer: PendingFeatureBuffer,
}

impl DigitizingTool {
    pub fn new(shape: ShapeKind, multipart: bool) -> Self {
        Self {
            accumulator: GeometryAccumulator::new(shape, multipart),
            buffer: PendingFeatureBuffer::new(),
        }
    }

    pub fn shape(&self) -> ShapeKind {
        self.accumulator.shape()
    }

    pub fn accumulator(&self) -> &GeometryAccumulator {
        &self.accumulator
    }

    pub fn buffer(&self) -> &PendingFeatureBuffer {
        &self.buffer
    }

    pub fn press(&mut self, at: Coord) -> GestureOutcome {
        let outcome = self.accumulator.press(at);
        self.route(outcome)
    }

    pub fn move_to(&mut self, at: Coord) -> GestureOutcome {
        self.accumulator.move_to(at)
    }

    pub fn release(&mut self) -> GestureOutcome {
        let outcome = self.accumulator.release();
        self.route(outcome)
    }

    fn route(&mut self, outcome: GestureOutcome) -> GestureOutcome {
        if let GestureOutcome::Finalized(feature) = &outcome {
            self.buffer.push(feature.clone());
        }
        outcome
    }

    /// Finalise les segments multi-parties dans le buffer
    ///
    /// Retourne vrai si une feature a été ajoutée.
    pub fn finish(&mut self) -> bool {
        match self.accumulator.finish() {
            Some(feature) => {
                self.buffer.push(feature);
                true
            }
            None => false,
        }
    }

    /// Vrai si le buffer contient au moins une feature finalisée
    pub fn has_pending(&self) -> bool {
        self.buffer.has_pending()
    }

    /// Vrai s'il reste quelque chose à enregistrer, segments compris
    pub fn has_unsaved(&self) -> bool {
        self.buffer.has_pending() || self.accumulator.segment_count() > 0
    }

    /// Annule le dernier élément saisi
    ///
    /// Une saisie en cours est abandonnée en priorité, puis les segments
    /// multi-parties non enregistrés, puis la dernière feature du buffer.
    pub fn remove_last(&mut self) -> RemoveOutcome {
        if self.accumulator.clear_in_progress() {
            debug!(shape = %self.shape(), "In-progress stroke cleared");
            return RemoveOutcome::InProgressCleared;
        }
        let segments = self.accumulator.clear_segments();
        if segments > 0 {
            debug!(shape = %self.shape(), segments, "Unsaved segments cleared");
            return RemoveOutcome::SegmentsCleared(segments);
        }
        match self.buffer.remove_last() {
            Some(feature) => RemoveOutcome::Removed(feature),
            None => RemoveOutcome::Nothing,
        }
    }

    /// Vide le buffer pour le commit
    pub fn take_pending(&mut self) -> Vec<PendingFeature> {
        self.buffer.take()
    }

    /// Remet les features non écrites après un rollback
    pub fn restore_pending(&mut self, features: Vec<PendingFeature>) {
        self.buffer.restore(features);
    }

    /// Abandonne toute la saisie non enregistrée
    pub fn discard(&mut self) {
        let dropped = self.buffer.len();
        self.reset();
        debug!(shape = %self.shape(), dropped, "Pending features discarded");
    }

    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.buffer.clear();
    }

    pub fn preview(&self) -> Option<Geometry> {
        self.accumulator.preview()
    }
}
