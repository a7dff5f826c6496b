//! Construction des géométries depuis les séquences de sommets saisies

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};

use crate::types::ShapeKind;

/// Géométrie d'une séquence unique
///
/// Les anneaux de polygones sont fermés par `Polygon::new`.
pub fn single_part(shape: ShapeKind, points: Vec<Coord>) -> Geometry {
    match shape {
        ShapeKind::Point => match points.first() {
            Some(first) => Geometry::Point(Point::from(*first)),
            None => Geometry::LineString(LineString::new(points)),
        },
        ShapeKind::Line => Geometry::LineString(LineString::new(points)),
        ShapeKind::Polygon => Geometry::Polygon(Polygon::new(LineString::new(points), vec![])),
    }
}

/// Géométrie multi-parties combinant tous les segments finalisés
pub fn multi_part(shape: ShapeKind, segments: Vec<LineString>) -> Geometry {
    match shape {
        ShapeKind::Polygon => Geometry::MultiPolygon(MultiPolygon::new(
            segments
                .into_iter()
                .map(|ring| Polygon::new(ring, vec![]))
                .collect(),
        )),
        ShapeKind::Line | ShapeKind::Point => {
            Geometry::MultiLineString(MultiLineString::new(segments))
        }
    }
}

/// Nombre de parties d'une géométrie (1 pour les types simples)
pub fn part_count(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::MultiPoint(mp) => mp.0.len(),
        Geometry::MultiLineString(mls) => mls.0.len(),
        Geometry::MultiPolygon(mp) => mp.0.len(),
        Geometry::GeometryCollection(gc) => gc.0.len(),
        _ => 1,
    }
}
