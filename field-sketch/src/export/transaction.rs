//! Commit atomique des features en attente vers une couche
//!
//! Garantit le rollback complet en cas d'échec d'écriture.

use chrono::{Local, NaiveDateTime};
use sketch::{
    AttributeBundle, AttributeStamper, Crs, PendingFeature, ShapeKind, SketchError, StampedFeature,
};
use tracing::{error, info, warn};

use crate::export::layer::SketchLayer;
use crate::reproject_lite::SmartReprojector;
use crate::report::CommitReport;

/// Transaction d'écriture sur une couche
///
/// Annulée automatiquement si elle est abandonnée sans commit.
pub struct LayerTransaction<'a, L: SketchLayer + ?Sized> {
    layer: &'a mut L,
    added: usize,
    finished: bool,
}

impl<'a, L: SketchLayer + ?Sized> LayerTransaction<'a, L> {
    /// Ouvre (ou reprend) la session d'édition de la couche
    pub fn begin(layer: &'a mut L) -> Result<Self, SketchError> {
        layer
            .start_editing()
            .map_err(|e| SketchError::commit_failed(layer.name(), format!("{:#}", e)))?;
        Ok(Self {
            layer,
            added: 0,
            finished: false,
        })
    }

    pub fn add(&mut self, features: &[StampedFeature]) -> Result<(), SketchError> {
        self.layer
            .add_features(features)
            .map_err(|e| SketchError::commit_failed(self.layer.name(), format!("{:#}", e)))?;
        self.added += features.len();
        Ok(())
    }

    /// Valide la transaction, retourne le nombre de features écrites
    pub fn commit(mut self) -> Result<usize, SketchError> {
        self.finished = true;
        match self.layer.commit_changes() {
            Ok(()) => Ok(self.added),
            Err(e) => {
                let err = SketchError::commit_failed(self.layer.name(), format!("{:#}", e));
                self.rollback_layer(&err);
                Err(err)
            }
        }
    }

    /// Annule la transaction
    pub fn rollback(mut self, reason: &SketchError) {
        self.finished = true;
        self.rollback_layer(reason);
    }

    fn rollback_layer(&mut self, reason: &SketchError) {
        error!(
            layer = %self.layer.name(),
            reason = %reason,
            features_attempted = self.added,
            "Rolling back layer commit"
        );
        if let Err(e) = self.layer.rollback() {
            error!(layer = %self.layer.name(), error = %e, "Explicit rollback failed");
        }
    }
}

impl<L: SketchLayer + ?Sized> Drop for LayerTransaction<'_, L> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.layer.rollback() {
                error!(layer = %self.layer.name(), error = %e, "Rollback on drop failed");
            }
        }
    }
}

/// Applique les features en attente à une couche : reprojection, attributs, écriture
#[derive(Debug, Clone, Copy)]
pub struct FeatureCommitter {
    capture_crs: Crs,
    stamper: AttributeStamper,
}

impl FeatureCommitter {
    pub fn new(capture_crs: Crs, stamper: AttributeStamper) -> Self {
        Self {
            capture_crs,
            stamper,
        }
    }

    pub fn capture_crs(&self) -> Crs {
        self.capture_crs
    }

    /// Commit horodaté avec l'heure locale courante
    pub fn commit<L: SketchLayer + ?Sized>(
        &self,
        layer: &mut L,
        features: &[PendingFeature],
        attributes: &AttributeBundle,
    ) -> CommitReport {
        self.commit_at(layer, features, attributes, Local::now().naive_local())
    }

    /// Écrit toutes les features valides en une transaction
    ///
    /// Les features sans géométrie ou non reprojetables sont ignorées et
    /// comptées. Un échec d'écriture annule tout le lot.
    pub fn commit_at<L: SketchLayer + ?Sized>(
        &self,
        layer: &mut L,
        features: &[PendingFeature],
        attributes: &AttributeBundle,
        at: NaiveDateTime,
    ) -> CommitReport {
        let mut report = CommitReport::new(layer.name());
        let target = layer.crs();
        let shape = layer.role().shape();

        let mut tx = match LayerTransaction::begin(layer) {
            Ok(tx) => tx,
            Err(e) => {
                error!(layer = %report.layer, error = %e, "Cannot open edit session");
                return report.rolled_back(&e);
            }
        };

        // Un couple de CRS non supporté fait échouer chaque feature, pas le lot
        let reprojector = SmartReprojector::new(self.capture_crs, target)
            .map_err(|e| SketchError::reprojection(self.capture_crs, target, format!("{:#}", e)));

        let mut stamped = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            let prepared = reprojector
                .as_ref()
                .map_err(Clone::clone)
                .and_then(|r| prepare(r, &self.stamper, feature, shape, attributes, at));

            match prepared {
                Ok(feature) => stamped.push(feature),
                Err(e) => {
                    warn!(layer = %report.layer, index, error = %e, "Feature skipped");
                    report.record_skip(index, &e);
                }
            }
        }

        if let Err(e) = tx.add(&stamped) {
            tx.rollback(&e);
            return report.rolled_back(&e);
        }

        let written = match tx.commit() {
            Ok(written) => written,
            Err(e) => return report.rolled_back(&e),
        };

        // Nouvelle session vide pour la saisie suivante
        if let Err(e) = layer.start_editing() {
            warn!(layer = %report.layer, error = %e, "Cannot reopen edit session");
        }

        info!(
            layer = %report.layer,
            written,
            skipped = report.skipped,
            "Features committed"
        );
        report.committed(written)
    }
}

/// Reprojette puis calcule les attributs d'une feature
///
/// Des attributs déjà présents sur la feature sont conservés tels quels.
fn prepare(
    reprojector: &SmartReprojector,
    stamper: &AttributeStamper,
    feature: &PendingFeature,
    shape: ShapeKind,
    attributes: &AttributeBundle,
    at: NaiveDateTime,
) -> Result<StampedFeature, SketchError> {
    let geometry = feature.geometry.as_ref().ok_or(SketchError::NullGeometry)?;
    let geometry = reprojector.reproject(geometry)?;

    match &feature.attributes {
        Some(existing) => Ok(StampedFeature {
            geometry,
            attributes: existing.clone(),
        }),
        None => {
            let reprojected = PendingFeature::new(shape, geometry);
            stamper.stamp_at(&reprojected, shape, attributes, at)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::layer::MemoryLayer;
    use crate::report::CommitStatus;
    use geo::{Geometry, LineString, MultiLineString, Point};
    use sketch::LayerRole;

    fn bundle() -> AttributeBundle {
        AttributeBundle {
            surveyor: "A".to_string(),
            type_txt: "T".to_string(),
            colour: String::new(),
            code: "C1".to_string(),
        }
    }

    fn point(x: f64, y: f64) -> PendingFeature {
        PendingFeature::new(ShapeKind::Point, Geometry::Point(Point::new(x, y)))
    }

    #[test]
    fn test_null_geometry_is_skipped() {
        let mut layer = MemoryLayer::new(LayerRole::Points, Crs::WGS84);
        let committer = FeatureCommitter::new(Crs::WGS84, AttributeStamper::default());

        let features = vec![PendingFeature::empty(ShapeKind::Point), point(150.0, -30.0)];
        let report = committer.commit(&mut layer, &features, &bundle());

        assert_eq!(report.status, CommitStatus::Committed);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.written, 1);
        assert_eq!(layer.feature_count().unwrap(), 1);
        // Session rouverte après le commit
        assert!(layer.is_editing());

        let stored = &layer.read_features().unwrap()[0];
        assert_eq!(stored.attributes.lat, -30.0);
        assert_eq!(stored.attributes.lon, 150.0);
        assert_eq!(stored.attributes.code, "C1");
    }

    #[test]
    fn test_add_failure_rolls_back() {
        let mut layer = MemoryLayer::new(LayerRole::Points, Crs::WGS84).failing_add();
        let committer = FeatureCommitter::new(Crs::WGS84, AttributeStamper::default());

        let report = committer.commit(&mut layer, &[point(1.0, 1.0), point(2.0, 2.0)], &bundle());

        assert_eq!(report.status, CommitStatus::RolledBack);
        assert_eq!(report.written, 0);
        assert_eq!(layer.feature_count().unwrap(), 0);
        assert!(!layer.is_editing());
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let mut layer = MemoryLayer::new(LayerRole::Points, Crs::WGS84).failing_commit();
        let committer = FeatureCommitter::new(Crs::WGS84, AttributeStamper::default());

        let report = committer.commit(&mut layer, &[point(1.0, 1.0)], &bundle());

        assert_eq!(report.status, CommitStatus::RolledBack);
        assert_eq!(layer.feature_count().unwrap(), 0);
        assert!(layer.staged().is_empty());
    }

    #[test]
    fn test_reprojection_failure_is_isolated() {
        let mut layer = MemoryLayer::new(LayerRole::Points, Crs::new(28355));
        let committer = FeatureCommitter::new(Crs::WGS84, AttributeStamper::default());

        let features = vec![point(147.0, -142.0), point(147.0, -42.0)];
        let report = committer.commit(&mut layer, &features, &bundle());

        assert!(report.is_committed());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.warnings[0].index, 0);

        // LAT/LON dans le CRS de la couche
        let stored = &layer.read_features().unwrap()[0];
        assert!((stored.attributes.lon - 500000.0).abs() < 1.0);
    }

    #[test]
    fn test_already_editing_is_not_an_error() {
        let mut layer = MemoryLayer::new(LayerRole::Lines, Crs::WGS84);
        layer.start_editing().unwrap();
        let committer = FeatureCommitter::new(Crs::WGS84, AttributeStamper::default());

        let line = MultiLineString::new(vec![LineString::from(vec![(0.0, 0.0), (1.0, 1.0)])]);
        let features = vec![PendingFeature::new(
            ShapeKind::Line,
            Geometry::MultiLineString(line),
        )];
        let report = committer.commit(&mut layer, &features, &bundle());
        assert!(report.is_committed());
        assert_eq!(report.written, 1);
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut layer = MemoryLayer::new(LayerRole::Points, Crs::WGS84);
        {
            let mut tx = LayerTransaction::begin(&mut layer).unwrap();
            tx.add(&[]).unwrap();
        }
        assert!(!layer.is_editing());
    }

    /// Couche dont le rollback échoue toujours
    struct StuckLayer {
        inner: MemoryLayer,
        rollbacks: usize,
    }

    impl SketchLayer for StuckLayer {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn role(&self) -> LayerRole {
            self.inner.role()
        }
        fn crs(&self) -> Crs {
            self.inner.crs()
        }
        fn is_editing(&self) -> bool {
            self.inner.is_editing()
        }
        fn start_editing(&mut self) -> anyhow::Result<()> {
            self.inner.start_editing()
        }
        fn add_features(&mut self, features: &[StampedFeature]) -> anyhow::Result<()> {
            self.inner.add_features(features)
        }
        fn commit_changes(&mut self) -> anyhow::Result<()> {
            self.inner.commit_changes()
        }
        fn rollback(&mut self) -> anyhow::Result<()> {
            self.rollbacks += 1;
            anyhow::bail!("layer is locked")
        }
        fn feature_count(&self) -> anyhow::Result<usize> {
            self.inner.feature_count()
        }
        fn read_features(&self) -> anyhow::Result<Vec<StampedFeature>> {
            self.inner.read_features()
        }
    }

    #[test]
    fn test_failed_rollback_on_drop_is_contained() {
        let mut layer = StuckLayer {
            inner: MemoryLayer::new(LayerRole::Points, Crs::WGS84),
            rollbacks: 0,
        };
        {
            let _tx = LayerTransaction::begin(&mut layer).unwrap();
        }
        assert_eq!(layer.rollbacks, 1);
        assert!(layer.is_editing());
    }
}
