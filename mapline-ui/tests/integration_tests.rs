use std::{io::Write, net::TcpListener, sync::Arc, time::Duration};

use mapline_core::{pump_until_settled, MapError, ViewState};
use mapline_types::{Coordinate, LineStyle, Rgb};
use mapline_ui::{create_ui, AppConfig, AppError, EventLevel, EventLog, HeadlessSession};
use tempfile::NamedTempFile;

fn offline_config() -> AppConfig {
    AppConfig {
        offline: true,
        fetch_overview: false,
        ready_timeout_secs: 5,
        ..Default::default()
    }
}

/// URL на loopback-порт, который никто не слушает.
fn refused_url() -> String {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{port}/arcgis/rest/services/Gone/MapServer")
}

#[test]
fn test_headless_run_adds_presets_in_order() {
    let report = HeadlessSession::start(&offline_config())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.graphics.len(), 2);

    let first = &report.graphics[0];
    assert_eq!(first.symbol.color, Rgb::MAGENTA);
    assert_eq!(first.symbol.style, LineStyle::Solid);
    assert_eq!(
        first.geometry.points(),
        &[
            Coordinate::new(118.169, 34.016),
            Coordinate::new(104.941, 39.7072),
            Coordinate::new(96.724, 32.732),
        ]
    );

    let second = &report.graphics[1];
    assert_eq!(second.symbol.color, Rgb::BLACK);
    assert_eq!(second.symbol.width, 4.0);
    assert_eq!(second.geometry.len(), 2);
}

#[test]
fn test_headless_unreachable_basemap_fails() {
    let config = AppConfig {
        basemap_url: refused_url(),
        request_timeout_secs: 2,
        ready_timeout_secs: 5,
        fetch_overview: false,
        ..Default::default()
    };

    let session = HeadlessSession::start(&config).unwrap();
    let events = Arc::clone(session.events());

    match session.run() {
        Err(AppError::Map(e)) => assert!(e.is_network(), "got {e:?}"),
        other => panic!("expected map failure, got {other:?}"),
    }

    assert!(events
        .read()
        .entries()
        .any(|e| e.level == EventLevel::Error));
}

#[test]
fn test_failed_view_never_receives_presets() {
    let config = AppConfig {
        basemap_url: refused_url(),
        request_timeout_secs: 2,
        fetch_overview: false,
        ..Default::default()
    };

    let mut ui = create_ui(&config, None, EventLog::shared()).unwrap();
    assert!(pump_until_settled(
        &mut ui.view,
        Duration::from_secs(10),
        Duration::from_millis(10)
    ));

    for _ in 0..5 {
        ui.view.pump();
    }

    assert!(matches!(ui.view.state(), ViewState::Failed(_)));
    assert!(ui.view.overlay(ui.overlay).unwrap().is_empty());
}

#[test]
fn test_close_before_ready_stops_everything() {
    let mut ui = create_ui(&offline_config(), None, EventLog::shared()).unwrap();

    // Окно закрыто до первой прокачки очереди
    ui.view.dispose();
    ui.view.pump();

    assert!(ui.view.is_disposed());
    assert!(ui.view.overlay(ui.overlay).is_none());
    assert!(matches!(
        ui.view.add_graphic(ui.overlay, mapline_ui::preset_graphics().unwrap().remove(0)),
        Err(MapError::Lifecycle(_))
    ));
}

#[test]
fn test_config_file_drives_session() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{
            "offline": true,
            "fetch_overview": false,
            "overlay_name": "routes",
            "initial_extent": {"xmin": 90, "ymin": 20, "xmax": 160, "ymax": 50}
        }"#,
    )
    .unwrap();

    let config = AppConfig::load(file.path()).unwrap();
    let mut ui = create_ui(&config, None, EventLog::shared()).unwrap();

    assert_eq!(ui.view.extent().unwrap().xmin, 90.0);
    assert!(pump_until_settled(
        &mut ui.view,
        Duration::from_secs(5),
        Duration::from_millis(5)
    ));
    ui.view.pump();

    let overlay = ui.view.overlay(ui.overlay).unwrap();
    assert_eq!(overlay.name(), "routes");
    assert_eq!(overlay.len(), 2);
}
