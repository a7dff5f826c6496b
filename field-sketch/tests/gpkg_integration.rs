//! Tests d'intégration GeoPackage et keypad
//!
//! Aucun service externe : SQLite est embarqué, les fichiers sont créés
//! dans des répertoires temporaires.

use chrono::NaiveDate;
use field_sketch::export::geojson::export_project;
use field_sketch::export::gpkg::layer_counts;
use field_sketch::{
    create_project, discover_layers, CommitStatus, DigitizingSession, GpkgLayer, KeypadDb,
    KeypadWorker, ReplayScript, SketchLayer,
};
use geo::{Coord, Geometry};
use sketch::{AttributeBundle, AttributeStamper, Crs, Direction, Item, LayerRole};
use tempfile::tempdir;

fn bundle(code: &str) -> AttributeBundle {
    AttributeBundle {
        surveyor: "JS".to_string(),
        type_txt: "Aerial".to_string(),
        colour: "#C8B5F4".to_string(),
        code: code.to_string(),
    }
}

fn c(x: f64, y: f64) -> Coord {
    Coord { x, y }
}

#[test]
fn test_save_and_read_back() {
    let dir = tempdir().unwrap();
    let path = create_project(dir.path(), "block12", Crs::WGS84, false).unwrap();

    let layer = GpkgLayer::open(&path, LayerRole::Polygons).unwrap();
    let mut session = DigitizingSession::new(layer, Crs::WGS84, AttributeStamper::default(), true);

    for offset in [0.0, 10.0] {
        session.press(c(offset, 0.0));
        session.move_to(c(offset + 4.0, 0.0));
        session.move_to(c(offset + 4.0, 4.0));
        session.move_to(c(offset, 4.0));
        session.release();
    }
    let at = NaiveDate::from_ymd_opt(2025, 2, 20)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let report = session.save_at(&bundle("BMAD_M"), at);
    assert_eq!(report.status, CommitStatus::Committed);
    assert_eq!(report.written, 1);
    drop(session);

    // Relecture depuis une nouvelle connexion
    let layer = GpkgLayer::open(&path, LayerRole::Polygons).unwrap();
    let features = layer.read_features().unwrap();
    assert_eq!(features.len(), 1);

    let feature = &features[0];
    match &feature.geometry {
        Geometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 2),
        other => panic!("Unexpected geometry: {:?}", other),
    }
    assert_eq!(feature.attributes.shape, "polygons");
    assert_eq!(feature.attributes.code, "BMAD_M");
    assert_eq!(feature.attributes.surveyor, "JS");
    assert_eq!(feature.attributes.colour, "#C8B5F4");
    assert_eq!(feature.attributes.date, "2025-02-20");
    assert_eq!(feature.attributes.time, "09:30:00");
    assert!((feature.attributes.lon - 7.0).abs() < 1e-4);
    assert!((feature.attributes.lat - 2.0).abs() < 1e-4);
}

#[test]
fn test_reprojected_layer() {
    let dir = tempdir().unwrap();
    let path = create_project(dir.path(), "mga", Crs::new(28355), true).unwrap();

    let layers = discover_layers(&path).unwrap();
    assert_eq!(layers.len(), 4);
    assert!(layers.iter().all(|l| l.crs == Crs::new(28355)));

    let layer = GpkgLayer::open(&path, LayerRole::Notes).unwrap();
    let mut session = DigitizingSession::new(layer, Crs::WGS84, AttributeStamper::default(), false);
    session.press(c(147.0, -42.0));
    let report = session.save(&bundle("note"));
    assert!(report.is_committed());

    let stored = session.into_layer().read_features().unwrap();
    match stored[0].geometry {
        Geometry::Point(p) => {
            assert!((p.x() - 500_000.0).abs() < 1.0);
            assert!(p.y() > 5_000_000.0);
        }
        ref other => panic!("Unexpected geometry: {:?}", other),
    }
}

#[test]
fn test_rolled_back_session_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = create_project(dir.path(), "rollback", Crs::WGS84, false).unwrap();

    let mut layer = GpkgLayer::open(&path, LayerRole::Points).unwrap();
    layer.start_editing().unwrap();
    layer.add_features(&[]).unwrap();
    layer.rollback().unwrap();
    assert!(!layer.is_editing());

    let counts = layer_counts(&path).unwrap();
    assert!(counts.iter().all(|(_, count)| *count == 0));
}

#[test]
fn test_layers_edited_together() {
    let dir = tempdir().unwrap();
    let path = create_project(dir.path(), "block7", Crs::WGS84, false).unwrap();

    let mut points = DigitizingSession::new(
        GpkgLayer::open(&path, LayerRole::Points).unwrap(),
        Crs::WGS84,
        AttributeStamper::default(),
        false,
    );
    let mut lines = DigitizingSession::new(
        GpkgLayer::open(&path, LayerRole::Lines).unwrap(),
        Crs::WGS84,
        AttributeStamper::default(),
        false,
    );

    points.press(c(147.0, -42.0));
    assert!(points.save(&bundle("Stags")).is_committed());
    assert_eq!(points.layer().read_features().unwrap().len(), 1);

    lines.press(c(147.0, -42.0));
    lines.move_to(c(147.1, -42.0));
    lines.release();
    let report = lines.save(&bundle("Frost_"));
    assert_eq!(report.status, CommitStatus::Committed);
    assert_eq!(report.written, 1);

    points.press(c(147.2, -42.2));
    assert!(points.save(&bundle("Stags")).is_committed());

    let counts: Vec<_> = layer_counts(&path)
        .unwrap()
        .into_iter()
        .map(|(layer, count)| (layer.role, count))
        .collect();
    assert!(counts.contains(&(LayerRole::Points, 2)));
    assert!(counts.contains(&(LayerRole::Lines, 1)));
    assert!(counts.contains(&(LayerRole::Polygons, 0)));
}

#[test]
fn test_replay_and_export() {
    let dir = tempdir().unwrap();
    let path = create_project(dir.path(), "replay", Crs::WGS84, false).unwrap();

    let script: ReplayScript = serde_json::from_str(
        r#"{
            "layer": "lines",
            "code": "Frost_",
            "events": [
                {"event": "press", "x": 147.0, "y": -42.0},
                {"event": "move", "x": 147.1, "y": -42.0},
                {"event": "move", "x": 147.2, "y": -42.1},
                {"event": "release"}
            ]
        }"#,
    )
    .unwrap();

    let layer = GpkgLayer::open(&path, script.layer).unwrap();
    let mut session = DigitizingSession::new(layer, Crs::WGS84, AttributeStamper::default(), false);
    script.replay(&mut session);
    assert!(session.save(&bundle(&script.code)).is_committed());
    drop(session);

    let output = dir.path().join("geojson");
    let written = export_project(&path, &output).unwrap();
    assert_eq!(written.len(), 3);

    let (lines_path, count) = written
        .iter()
        .find(|(p, _)| p.ends_with("sketch-lines.geojson"))
        .unwrap();
    assert_eq!(*count, 1);

    let content = std::fs::read_to_string(lines_path).unwrap();
    let collection =
        ::geojson::FeatureCollection::try_from(content.parse::<::geojson::GeoJson>().unwrap())
            .unwrap();
    assert_eq!(collection.features.len(), 1);
    assert_eq!(collection.features[0].property("Code").unwrap(), "Frost_");
}

#[tokio::test]
async fn test_keypad_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keypad.sqlite");

    let worker = KeypadWorker::open(&path).unwrap();
    let mut store = worker.load_store().await.unwrap();
    assert_eq!(store.categories()[0].name, "BMAD");

    store.begin_edit();
    store.move_item("BMAD", "Stags", Direction::Up).unwrap();
    store.add_item("SEVERITY", Item::new("Nil")).unwrap();
    store.set_category_selected("SEVERITY", true).unwrap();
    worker.apply(&mut store).await.unwrap();
    worker.shutdown().await.unwrap();

    // Relecture synchrone du fichier
    let db = KeypadDb::open(&path).unwrap();
    let loaded = db.load().unwrap();
    assert_eq!(loaded, store.categories());

    let bmad: Vec<_> = loaded[0].items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(bmad[3], "Stags");
    assert_eq!(bmad[4], "BMAD_H");

    let selected: Vec<_> = db
        .selected_items()
        .unwrap()
        .into_iter()
        .map(|s| s.item)
        .collect();
    assert_eq!(selected, vec!["Low", "Moderate", "High", "Extreme", "Nil"]);
}
