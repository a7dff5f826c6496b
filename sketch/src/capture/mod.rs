//! Machine à états de saisie en flux (stylet posé / levé)
//!
//! Chaque appui démarre une séquence, chaque déplacement stylet posé ajoute
//! un sommet, le relâchement finalise la séquence. Aucun point n'est filtré
//! ni interpolé : la forme dessinée est la suite cumulée des positions reçues.

pub mod parts;

use geo::{Coord, Geometry, LineString, MultiLineString};
use tracing::{debug, trace};

use crate::types::{PendingFeature, ShapeKind};
use crate::SketchError;

/// État courant du geste
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing { points: Vec<Coord> },
}

/// Résultat d'un événement de saisie
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Événement sans effet (déplacement avant appui, relâchement à vide)
    Ignored,
    /// Nouvelle séquence démarrée au point d'appui
    Started,
    /// Sommet ajouté à la séquence en cours
    Appended { points: usize },
    /// Feature finalisée, prête pour le buffer
    Finalized(PendingFeature),
    /// Segment stocké en attente de l'enregistrement multi-parties
    SegmentStored { parts: usize },
    /// Séquence trop courte, abandonnée
    Discarded(SketchError),
}

/// Accumulateur de sommets pour une couche
#[derive(Debug, Clone)]
pub struct GeometryAccumulator {
    shape: ShapeKind,
    multipart: bool,
    state: CaptureState,
    segments: Vec<LineString>,
}

impl GeometryAccumulator {
    pub fn new(shape: ShapeKind, multipart: bool) -> Self {
        Self {
            shape,
            // Un point par clic : jamais de multi-parties
            multipart: multipart && shape != ShapeKind::Point,
            state: CaptureState::Idle,
            segments: Vec::new(),
        }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing { .. })
    }

    /// Nombre de segments finalisés en attente
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Appui du stylet
    ///
    /// Pour les couches de points, l'appui produit directement la feature.
    /// Un appui pendant une séquence en cours est ignoré (relâchement perdu).
    pub fn press(&mut self, at: Coord) -> GestureOutcome {
        if self.shape == ShapeKind::Point {
            trace!(x = at.x, y = at.y, "Point captured");
            return GestureOutcome::Finalized(PendingFeature::new(
                self.shape,
                parts::single_part(self.shape, vec![at]),
            ));
        }

        match self.state {
            CaptureState::Idle => {
                self.state = CaptureState::Capturing { points: vec![at] };
                GestureOutcome::Started
            }
            CaptureState::Capturing { .. } => GestureOutcome::Ignored,
        }
    }

    /// Déplacement du pointeur
    pub fn move_to(&mut self, at: Coord) -> GestureOutcome {
        match &mut self.state {
            CaptureState::Capturing { points } => {
                points.push(at);
                GestureOutcome::Appended {
                    points: points.len(),
                }
            }
            CaptureState::Idle => GestureOutcome::Ignored,
        }
    }

    /// Relâchement du stylet
    pub fn release(&mut self) -> GestureOutcome {
        let points = match std::mem::take(&mut self.state) {
            CaptureState::Capturing { points } => points,
            CaptureState::Idle => return GestureOutcome::Ignored,
        };

        if points.len() < self.shape.min_points() {
            let err = SketchError::degenerate(self.shape, points.len());
            debug!(shape = %self.shape, points = points.len(), "Degenerate stroke dropped");
            return GestureOutcome::Discarded(err);
        }

        if self.multipart {
            self.segments.push(LineString::new(points));
            debug!(shape = %self.shape, parts = self.segments.len(), "Segment stored");
            return GestureOutcome::SegmentStored {
                parts: self.segments.len(),
            };
        }

        GestureOutcome::Finalized(PendingFeature::new(
            self.shape,
            parts::single_part(self.shape, points),
        ))
    }

    /// Combine les segments stockés en une feature multi-parties
    ///
    /// La séquence éventuellement en cours n'est pas incluse.
    pub fn finish(&mut self) -> Option<PendingFeature> {
        if self.segments.is_empty() {
            return None;
        }
        let segments = std::mem::take(&mut self.segments);
        debug!(shape = %self.shape, parts = segments.len(), "Multi-part feature finalized");
        Some(PendingFeature::new(
            self.shape,
            parts::multi_part(self.shape, segments),
        ))
    }

    /// Abandonne la séquence en cours, retourne vrai si elle existait
    pub fn clear_in_progress(&mut self) -> bool {
        let was_capturing = self.is_capturing();
        self.state = CaptureState::Idle;
        was_capturing
    }

    /// Abandonne les segments stockés, retourne leur nombre
    pub fn clear_segments(&mut self) -> usize {
        std::mem::take(&mut self.segments).len()
    }

    /// Remet l'accumulateur à vide
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
        self.segments.clear();
    }

    /// Géométrie d'écho visuel : segments finalisés plus la séquence en cours
    pub fn preview(&self) -> Option<Geometry> {
        let mut lines = self.segments.clone();
        if let CaptureState::Capturing { points } = &self.state {
            lines.push(LineString::new(points.clone()));
        }
        match lines.len() {
            0 => None,
            1 if !self.multipart => lines.pop().map(Geometry::LineString),
            _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord {
        Coord { x, y }
    }

    fn stroke(acc: &mut GeometryAccumulator, pts: &[(f64, f64)]) -> GestureOutcome {
        let mut iter = pts.iter();
        if let Some(&(x, y)) = iter.next() {
            acc.press(c(x, y));
        }
        for &(x, y) in iter {
            acc.move_to(c(x, y));
        }
        acc.release()
    }

    #[test]
    fn test_point_press_finalizes_immediately() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Point, true);
        let outcome = acc.press(c(150.0, -30.0));
        assert!(matches!(outcome, GestureOutcome::Finalized(_)));
        assert!(!acc.is_capturing());
        assert!(!acc.is_multipart());
        assert_eq!(acc.release(), GestureOutcome::Ignored);
    }

    #[test]
    fn test_move_before_press_is_ignored() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, false);
        assert_eq!(acc.move_to(c(1.0, 1.0)), GestureOutcome::Ignored);
        assert_eq!(acc.release(), GestureOutcome::Ignored);
        assert_eq!(acc.state(), &CaptureState::Idle);
    }

    #[test]
    fn test_every_move_is_kept() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, false);
        acc.press(c(0.0, 0.0));
        for i in 1..=50 {
            // Positions répétées comprises
            let outcome = acc.move_to(c((i / 2) as f64, 0.0));
            assert_eq!(outcome, GestureOutcome::Appended { points: i + 1 });
        }
        let GestureOutcome::Finalized(feature) = acc.release() else {
            panic!("Expected a finalized line");
        };
        let Some(Geometry::LineString(ls)) = feature.geometry else {
            panic!("Expected LineString geometry");
        };
        assert_eq!(ls.0.len(), 51);
    }

    #[test]
    fn test_short_line_is_discarded() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, false);
        let outcome = stroke(&mut acc, &[(0.0, 0.0)]);
        assert!(matches!(
            outcome,
            GestureOutcome::Discarded(SketchError::DegenerateGeometry { points: 1, .. })
        ));
        assert!(!acc.is_capturing());
    }

    #[test]
    fn test_short_polygon_is_discarded() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Polygon, false);
        let outcome = stroke(&mut acc, &[(0.0, 0.0), (1.0, 0.0)]);
        assert!(matches!(outcome, GestureOutcome::Discarded(_)));

        let outcome = stroke(&mut acc, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(outcome, GestureOutcome::Finalized(_)));
    }

    #[test]
    fn test_multipart_stores_segments_until_finish() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, true);
        assert_eq!(
            stroke(&mut acc, &[(0.0, 0.0), (1.0, 1.0)]),
            GestureOutcome::SegmentStored { parts: 1 }
        );
        assert!(matches!(
            stroke(&mut acc, &[(5.0, 5.0)]),
            GestureOutcome::Discarded(_)
        ));
        assert_eq!(
            stroke(&mut acc, &[(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]),
            GestureOutcome::SegmentStored { parts: 2 }
        );

        let feature = acc.finish().expect("segments stored");
        let Some(Geometry::MultiLineString(mls)) = feature.geometry else {
            panic!("Expected MultiLineString geometry");
        };
        assert_eq!(mls.0.len(), 2);
        assert_eq!(acc.segment_count(), 0);
        assert!(acc.finish().is_none());
    }

    #[test]
    fn test_press_while_capturing_keeps_points() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, false);
        acc.press(c(0.0, 0.0));
        acc.move_to(c(1.0, 0.0));
        assert_eq!(acc.press(c(9.0, 9.0)), GestureOutcome::Ignored);
        assert_eq!(acc.move_to(c(2.0, 0.0)), GestureOutcome::Appended { points: 3 });
    }

    #[test]
    fn test_preview_includes_in_progress_line() {
        let mut acc = GeometryAccumulator::new(ShapeKind::Line, true);
        stroke(&mut acc, &[(0.0, 0.0), (1.0, 1.0)]);
        acc.press(c(2.0, 2.0));
        acc.move_to(c(3.0, 3.0));
        let Some(Geometry::MultiLineString(mls)) = acc.preview() else {
            panic!("Expected MultiLineString preview");
        };
        assert_eq!(mls.0.len(), 2);

        acc.reset();
        assert!(acc.preview().is_none());
    }
}
