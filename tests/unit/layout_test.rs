//! Unit tests for the content-region debounce state machine.

use rstest::rstest;

use xiavion::app::App;
use xiavion::engine::{ContentEngine, HeadlessEngine, HeadlessProbe};
use xiavion::managers::layout_manager::{LayoutCoordinator, LayoutOutcome, LayoutState};
use xiavion::managers::view_registry::ViewRegistry;
use xiavion::services::settings_engine::SettingsEngine;
use xiavion::types::events::EngineEvent;
use xiavion::types::geometry::{Rect, Size};
use xiavion::types::settings::LayoutSettings;

const REGION: Rect = Rect {
    x: 0,
    y: 80,
    width: 1200,
    height: 720,
};

struct Fixture {
    layout: LayoutCoordinator,
    registry: ViewRegistry,
    engine: HeadlessEngine,
    probe: HeadlessProbe,
    surface: u64,
}

/// One registered, active surface and a chrome that reports `REGION`.
fn fixture() -> Fixture {
    let mut engine = HeadlessEngine::default();
    let probe = engine.probe();
    probe.set_content_region(Some(REGION));
    let surface = engine.create_surface().unwrap();
    let mut registry = ViewRegistry::new();
    registry.insert("t1", surface, "gx://speed");
    registry.set_active("t1");
    Fixture {
        layout: LayoutCoordinator::new(LayoutSettings::default()),
        registry,
        engine,
        probe,
        surface,
    }
}

/// Feed the next queued content-region answer back into the coordinator.
fn answer(f: &mut Fixture) -> Option<LayoutOutcome> {
    let events = f.engine.poll_events();
    let mut outcome = None;
    for event in events {
        if let EngineEvent::ContentRegion(result) = event {
            outcome = Some(f.layout.on_region(result, &f.registry, &mut f.engine));
        }
    }
    outcome
}

#[test]
fn test_trigger_from_idle_issues_one_query() {
    let mut f = fixture();
    assert_eq!(f.layout.state(), LayoutState::Idle);
    f.layout.trigger(&mut f.engine);
    assert_eq!(f.layout.state(), LayoutState::Computing);
    assert_eq!(f.probe.region_queries(), 1);

    assert_eq!(answer(&mut f), Some(LayoutOutcome::Applied(REGION)));
    assert_eq!(f.layout.state(), LayoutState::Idle);
    assert_eq!(f.probe.bounds(f.surface), Some(REGION));
}

#[test]
fn test_triggers_while_computing_coalesce() {
    let mut f = fixture();
    for _ in 0..6 {
        f.layout.trigger(&mut f.engine);
    }
    assert_eq!(f.probe.region_queries(), 1);
    assert_eq!(f.layout.state(), LayoutState::ComputingWithPendingRetrigger);

    assert_eq!(answer(&mut f), Some(LayoutOutcome::Requeried));
    assert_eq!(f.probe.region_queries(), 2);
    assert_eq!(f.layout.state(), LayoutState::Computing);

    assert_eq!(answer(&mut f), Some(LayoutOutcome::Applied(REGION)));
    assert_eq!(f.layout.state(), LayoutState::Idle);
}

#[test]
fn test_stale_result_is_never_applied() {
    let mut f = fixture();
    let stale = Rect::new(0, 40, 900, 500);
    f.probe.set_content_region(Some(stale));
    f.layout.trigger(&mut f.engine);
    f.probe.set_content_region(Some(REGION));
    for _ in 0..4 {
        f.layout.trigger(&mut f.engine);
    }

    answer(&mut f);
    answer(&mut f);
    let applied: Vec<Rect> = f.probe.bounds_log().into_iter().map(|(_, r)| r).collect();
    assert_eq!(applied, vec![REGION]);
}

#[rstest]
#[case::no_anchor(None, None)]
#[case::query_error(None, Some("chrome not ready"))]
fn test_fallback_region_below_chrome(#[case] region: Option<Rect>, #[case] error: Option<&str>) {
    let mut f = fixture();
    f.probe.set_content_region(region);
    f.probe.fail_region_queries(error);
    f.probe.set_window_size(Size::new(1000, 700));
    f.layout.trigger(&mut f.engine);

    let expected = Rect::new(0, 80, 1000, 620);
    assert_eq!(answer(&mut f), Some(LayoutOutcome::Applied(expected)));
    assert_eq!(f.layout.last_region(), Some(expected));
}

#[test]
fn test_degenerate_region_is_ignored() {
    let mut f = fixture();
    f.probe.set_content_region(Some(Rect::new(0, 80, 0, 720)));
    f.layout.trigger(&mut f.engine);
    assert_eq!(answer(&mut f), Some(LayoutOutcome::Degenerate));
    assert!(f.probe.bounds_log().is_empty());
    assert_eq!(f.layout.state(), LayoutState::Idle);
}

#[test]
fn test_same_region_is_not_reapplied() {
    let mut f = fixture();
    f.layout.trigger(&mut f.engine);
    answer(&mut f);
    f.layout.trigger(&mut f.engine);
    assert_eq!(answer(&mut f), Some(LayoutOutcome::Unchanged));
    assert_eq!(f.probe.bounds_log().len(), 1);
}

#[test]
fn test_no_active_surface() {
    let mut f = fixture();
    f.registry.remove("t1");
    f.layout.trigger(&mut f.engine);
    assert_eq!(answer(&mut f), Some(LayoutOutcome::NoActiveSurface));
    assert_eq!(f.layout.state(), LayoutState::Idle);
}

#[test]
fn test_unsolicited_result_is_unexpected() {
    let mut f = fixture();
    let outcome = f
        .layout
        .on_region(Ok(Some(REGION)), &f.registry, &mut f.engine);
    assert_eq!(outcome, LayoutOutcome::Unexpected);
    assert!(f.probe.bounds_log().is_empty());
}

#[test]
fn test_activate_reuses_last_region() {
    let mut f = fixture();
    f.layout.trigger(&mut f.engine);
    answer(&mut f);

    let other = f.engine.create_surface().unwrap();
    f.registry.insert("t2", other, "gx://speed");
    f.registry.set_active("t2");
    f.layout.activate(&f.registry, &mut f.engine);
    assert_eq!(f.probe.bounds(other), Some(REGION));
    assert_eq!(f.layout.last_applied(), Some(REGION));
}

#[test]
fn test_burst_of_bounds_updates_applies_latest_once() {
    let engine = HeadlessEngine::default();
    let probe = engine.probe();
    let path = std::env::temp_dir().join(format!("xiavion-layout-test-{}.json", std::process::id()));
    let mut app = App::new(
        Box::new(engine),
        SettingsEngine::new(Some(path.to_string_lossy().to_string())),
    );
    app.create_tab("t1", "gx://speed").unwrap();
    app.pump();
    let surface = app.tab_manager.registry().surface_of("t1").unwrap();
    let before = probe.bounds_log().len();

    let latest = Rect::new(0, 120, 1200, 680);
    probe.set_content_region(Some(Rect::new(0, 90, 1200, 710)));
    assert!(app.content_bounds_updated());
    probe.set_content_region(Some(latest));
    for _ in 0..5 {
        assert!(app.content_bounds_updated());
    }
    app.pump();

    let applied: Vec<Rect> = probe.bounds_log()[before..]
        .iter()
        .filter(|(s, _)| *s == surface)
        .map(|(_, r)| *r)
        .collect();
    assert_eq!(applied, vec![latest]);
    assert_eq!(app.layout.state(), LayoutState::Idle);
}

#[test]
fn test_bounds_update_without_active_tab() {
    let path = std::env::temp_dir().join("xiavion-layout-empty.json");
    let mut app = App::new(
        Box::new(HeadlessEngine::default()),
        SettingsEngine::new(Some(path.to_string_lossy().to_string())),
    );
    assert!(!app.content_bounds_updated());
}
