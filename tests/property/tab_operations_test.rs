//! Property-based tests for tab lifecycle operations.
//!
//! For any sequence of create / show / close / load commands the registry,
//! the engine's live surfaces and the visible surface stay consistent.

use std::collections::BTreeSet;

use proptest::prelude::*;

use xiavion::app::App;
use xiavion::engine::{HeadlessEngine, HeadlessProbe};
use xiavion::services::settings_engine::SettingsEngine;
use xiavion::types::geometry::Rect;

const IDS: [&str; 4] = ["a", "b", "c", "d"];
const URLS: [&str; 5] = [
    "gx://speed",
    "gx://settings",
    "https://example.com",
    "badscheme://nope",
    "rust borrow checker",
];

/// Operations that can be performed through the coordinator.
#[derive(Debug, Clone)]
enum TabOp {
    Create(usize, usize),
    Show(usize),
    Close(usize),
    Load(usize, usize),
    Bounds,
}

fn arb_tab_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..IDS.len(), 0..URLS.len()).prop_map(|(i, u)| TabOp::Create(i, u)),
            2 => (0..IDS.len()).prop_map(TabOp::Show),
            2 => (0..IDS.len()).prop_map(TabOp::Close),
            2 => (0..IDS.len(), 0..URLS.len()).prop_map(|(i, u)| TabOp::Load(i, u)),
            1 => Just(TabOp::Bounds),
        ],
        1..40,
    )
}

fn setup() -> (App, HeadlessProbe) {
    let engine = HeadlessEngine::default();
    let probe = engine.probe();
    probe.set_content_region(Some(Rect::new(0, 80, 1200, 720)));
    let path = std::env::temp_dir().join(format!("xiavion-prop-{}.json", std::process::id()));
    let settings = SettingsEngine::new(Some(path.to_string_lossy().to_string()));
    (App::new(Box::new(engine), settings), probe)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn registry_and_surfaces_stay_consistent(ops in arb_tab_ops()) {
        let (mut app, probe) = setup();
        let mut open: BTreeSet<&str> = BTreeSet::new();
        let mut active: Option<&str> = None;

        for op in &ops {
            match *op {
                TabOp::Create(i, u) => {
                    prop_assert!(app.create_tab(IDS[i], URLS[u]).is_ok());
                    open.insert(IDS[i]);
                    active = Some(IDS[i]);
                }
                TabOp::Show(i) => {
                    let res = app.show_tab(IDS[i]);
                    prop_assert_eq!(res.is_ok(), open.contains(IDS[i]));
                    if res.is_ok() {
                        active = Some(IDS[i]);
                    }
                }
                TabOp::Close(i) => {
                    let res = app.close_tab(IDS[i]);
                    prop_assert_eq!(res.is_ok(), open.remove(IDS[i]));
                    if active == Some(IDS[i]) {
                        active = None;
                    }
                }
                TabOp::Load(i, u) => {
                    prop_assert!(app.load_url(IDS[i], URLS[u]).is_ok());
                    if open.insert(IDS[i]) {
                        active = Some(IDS[i]);
                    }
                }
                TabOp::Bounds => {
                    prop_assert_eq!(app.content_bounds_updated(), active.is_some());
                }
            }
            app.pump();

            prop_assert_eq!(app.tabs().len(), open.len());
            prop_assert_eq!(probe.surface_count(), open.len());
            prop_assert_eq!(app.active_id(), active);
        }

        // At most one surface is visible, and it belongs to the active tab.
        let visible: Vec<u64> = probe
            .surface_ids()
            .into_iter()
            .filter(|s| probe.bounds(*s).map(|r| r.is_visible()).unwrap_or(false))
            .collect();
        prop_assert!(visible.len() <= 1);
        if let Some(s) = visible.first() {
            let active_surface = app.tab_manager.registry().active_surface();
            prop_assert_eq!(Some(*s), active_surface);
        }
    }

    #[test]
    fn shutdown_releases_every_surface(ops in arb_tab_ops()) {
        let (mut app, probe) = setup();
        for op in &ops {
            if let TabOp::Create(i, u) | TabOp::Load(i, u) = *op {
                let _ = app.create_tab(IDS[i], URLS[u]);
            }
        }
        app.shutdown();
        prop_assert_eq!(probe.surface_count(), 0);
        prop_assert!(app.tabs().is_empty());
        prop_assert_eq!(app.active_id(), None);
    }
}
