//! Buffer des features finalisées en attente d'enregistrement

use crate::types::PendingFeature;

/// Séquence ordonnée de features non commitées
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingFeatureBuffer {
    features: Vec<PendingFeature>,
}

impl PendingFeatureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: PendingFeature) {
        self.features.push(feature);
    }

    /// Vrai si un enregistrement a du sens
    pub fn has_pending(&self) -> bool {
        !self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Retire la feature la plus récente (annulation)
    pub fn remove_last(&mut self) -> Option<PendingFeature> {
        self.features.pop()
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn as_slice(&self) -> &[PendingFeature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingFeature> {
        self.features.iter()
    }

    /// Vide le buffer en retournant son contenu
    pub fn take(&mut self) -> Vec<PendingFeature> {
        std::mem::take(&mut self.features)
    }

    /// Remet des features en tête du buffer (après un rollback)
    pub fn restore(&mut self, mut features: Vec<PendingFeature>) {
        features.append(&mut self.features);
        self.features = features;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeKind;
    use geo::{Geometry, Point};

    fn point(x: f64) -> PendingFeature {
        PendingFeature::new(ShapeKind::Point, Geometry::Point(Point::new(x, 0.0)))
    }

    #[test]
    fn test_remove_last_pops_most_recent() {
        let mut buffer = PendingFeatureBuffer::new();
        assert!(!buffer.has_pending());

        buffer.push(point(1.0));
        buffer.push(point(2.0));
        assert!(buffer.has_pending());

        let removed = buffer.remove_last().unwrap();
        assert_eq!(removed, point(2.0));
        assert_eq!(buffer.len(), 1);

        buffer.clear();
        assert!(buffer.remove_last().is_none());
    }

    #[test]
    fn test_restore_keeps_order() {
        let mut buffer = PendingFeatureBuffer::new();
        buffer.push(point(1.0));
        buffer.push(point(2.0));
        let taken = buffer.take();
        assert!(buffer.is_empty());

        buffer.push(point(3.0));
        buffer.restore(taken);
        let xs: Vec<f64> = buffer
            .iter()
            .filter_map(|f| match f.geometry {
                Some(Geometry::Point(p)) => Some(p.x()),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }
}
