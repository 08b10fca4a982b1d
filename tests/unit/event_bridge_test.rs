//! Unit tests for the event bridge: URL de-duplication, synthetic URL
//! mapping, favicon follow-ups and the fallback URL poll.

use std::time::{Duration, Instant};

use xiavion::engine::{ContentEngine, HeadlessEngine, HeadlessProbe};
use xiavion::managers::page_trail::{PageRecord, Step};
use xiavion::managers::view_registry::ViewRegistry;
use xiavion::services::event_bridge::{BridgeAction, EventBridge};
use xiavion::types::events::{NavEvent, PushEvent, SurfaceEvent};
use xiavion::types::resources::ResourceSnapshot;
use xiavion::types::settings::EventSettings;
use xiavion::types::url::ResolvedUrl;

struct Fixture {
    bridge: EventBridge,
    registry: ViewRegistry,
    engine: HeadlessEngine,
    probe: HeadlessProbe,
    surface: u64,
    t0: Instant,
}

fn fixture() -> Fixture {
    let mut engine = HeadlessEngine::default();
    let probe = engine.probe();
    let surface = engine.create_surface().unwrap();
    let mut registry = ViewRegistry::new();
    registry.insert("t1", surface, "https://example.com");
    Fixture {
        bridge: EventBridge::new(&EventSettings::default()),
        registry,
        engine,
        probe,
        surface,
        t0: Instant::now(),
    }
}

impl Fixture {
    fn nav(&mut self, kind: NavEvent, url: &str, at_ms: u64) -> Option<BridgeAction> {
        self.event(SurfaceEvent::Navigation { kind, url: url.to_string() }, at_ms)
    }

    fn event(&mut self, event: SurfaceEvent, at_ms: u64) -> Option<BridgeAction> {
        let now = self.t0 + Duration::from_millis(at_ms);
        self.bridge
            .handle_surface_event(self.surface, event, &mut self.registry, &mut self.engine, now)
    }

    fn url_updates(&mut self) -> Vec<String> {
        self.bridge
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                PushEvent::UrlUpdated { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }
}

// ─── De-duplication ───

#[test]
fn test_same_url_within_window_published_once() {
    let mut f = fixture();
    f.nav(NavEvent::Started, "https://example.com/", 0);
    f.nav(NavEvent::Committed, "https://example.com/", 100);
    f.nav(NavEvent::FinishedLoading, "https://example.com/", 499);
    assert_eq!(f.url_updates(), vec!["https://example.com/".to_string()]);
}

#[test]
fn test_same_url_after_window_published_again() {
    let mut f = fixture();
    f.nav(NavEvent::Committed, "https://example.com/", 0);
    f.nav(NavEvent::InPageNavigated, "https://example.com/", 500);
    assert_eq!(f.url_updates().len(), 2);
}

#[test]
fn test_different_url_published_immediately() {
    let mut f = fixture();
    f.nav(NavEvent::Committed, "https://example.com/", 0);
    f.nav(NavEvent::Redirected, "https://www.example.com/", 10);
    assert_eq!(
        f.url_updates(),
        vec!["https://example.com/".to_string(), "https://www.example.com/".to_string()]
    );
    assert_eq!(f.registry.get("t1").unwrap().tab.url, "https://www.example.com/");
}

#[test]
fn test_dedupe_is_per_tab() {
    let mut f = fixture();
    let now = f.t0;
    assert!(f.bridge.publish_url("t1", "https://a.test/", now));
    assert!(f.bridge.publish_url("t2", "https://a.test/", now));
    assert!(!f.bridge.publish_url("t1", "https://a.test/", now));
    f.bridge.forget("t1");
    assert!(f.bridge.publish_url("t1", "https://a.test/", now));
}

// ─── Synthetic URLs ───

#[test]
fn test_internal_page_keeps_reserved_url() {
    let mut f = fixture();
    f.registry.get_mut("t1").unwrap().internal = Some(ResolvedUrl::Settings);
    f.nav(NavEvent::Committed, "about:blank", 0);
    assert_eq!(f.url_updates(), vec!["gx://settings".to_string()]);
    assert_eq!(f.registry.get("t1").unwrap().tab.url, "gx://settings");
}

#[test]
fn test_error_page_keeps_attempted_url() {
    let mut f = fixture();
    f.registry.get_mut("t1").unwrap().tab.url = "https://down.test".to_string();
    f.nav(NavEvent::Committed, "data:text/html,oops", 0);
    assert_eq!(f.url_updates(), vec!["https://down.test".to_string()]);
}

#[test]
fn test_back_to_reserved_page_reports_reserved_url() {
    let mut f = fixture();
    {
        let trail = &mut f.registry.get_mut("t1").unwrap().trail;
        trail.expect_load(Some(PageRecord::reserved(ResolvedUrl::Corner)));
        trail.expect_load(None);
    }
    f.nav(NavEvent::Committed, "about:blank", 0);
    f.nav(NavEvent::Committed, "https://a.test/", 10);
    f.registry.get_mut("t1").unwrap().trail.expect_step(Step::Back);
    f.nav(NavEvent::Started, "about:blank", 20);
    f.nav(NavEvent::Committed, "about:blank", 30);

    assert_eq!(f.url_updates(), vec!["gx://corner", "https://a.test/", "gx://corner"]);
    let entry = f.registry.get("t1").unwrap();
    assert_eq!(entry.tab.url, "gx://corner");
    assert_eq!(entry.internal, Some(ResolvedUrl::Corner));
}

#[test]
fn test_synthetic_start_publishes_nothing() {
    let mut f = fixture();
    f.nav(NavEvent::Started, "about:blank", 0);
    assert!(f.url_updates().is_empty());
    assert_eq!(f.registry.get("t1").unwrap().tab.url, "https://example.com");
}

#[test]
fn test_real_navigation_leaves_internal_page() {
    let mut f = fixture();
    f.registry.get_mut("t1").unwrap().internal = Some(ResolvedUrl::Home);
    f.nav(NavEvent::Started, "https://example.com/", 0);
    assert!(f.registry.get("t1").unwrap().internal.is_some());
    f.nav(NavEvent::Committed, "https://example.com/", 10);
    assert!(f.registry.get("t1").unwrap().internal.is_none());
}

// ─── Titles, favicons, navigation state ───

#[test]
fn test_title_change_updates_tab() {
    let mut f = fixture();
    f.event(SurfaceEvent::TitleChanged("Example".to_string()), 0);
    assert_eq!(f.registry.get("t1").unwrap().tab.title, "Example");
    assert_eq!(
        f.bridge.drain(),
        vec![PushEvent::PageTitleUpdated { id: "t1".into(), title: "Example".into() }]
    );
}

#[test]
fn test_finished_loading_queries_favicon() {
    let mut f = fixture();
    f.probe.set_favicon("https://example.com", "https://example.com/icon.png");
    f.engine.load_url(f.surface, "https://example.com").unwrap();
    f.engine.poll_events();
    f.event(SurfaceEvent::TitleChanged("example.com".to_string()), 0);

    f.nav(NavEvent::FinishedLoading, "https://example.com", 0);
    assert!(f.registry.get("t1").unwrap().loaded_once);

    let answers = f.engine.poll_events();
    assert_eq!(answers.len(), 1);
    for answer in answers {
        if let xiavion::types::events::EngineEvent::Surface { event, .. } = answer {
            f.event(event, 10);
        }
    }
    let info = f
        .bridge
        .drain()
        .into_iter()
        .find(|e| e.name() == "pageInfoUpdated")
        .unwrap();
    assert_eq!(
        info,
        PushEvent::PageInfoUpdated {
            id: "t1".into(),
            url: "https://example.com".into(),
            title: "example.com".into(),
            favicon: "https://example.com/icon.png".into(),
        }
    );
}

#[test]
fn test_missing_favicon_publishes_empty_string() {
    let mut f = fixture();
    f.event(SurfaceEvent::FaviconResolved(None), 0);
    match f.bridge.drain().pop() {
        Some(PushEvent::PageInfoUpdated { favicon, .. }) => assert_eq!(favicon, ""),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_history_events_publish_navigation_state() {
    let mut f = fixture();
    f.nav(NavEvent::Started, "https://example.com/", 0);
    assert!(f.bridge.pending().iter().all(|e| e.name() != "navigationStateUpdated"));
    f.nav(NavEvent::Committed, "https://example.com/", 0);
    assert!(f.bridge.pending().iter().any(|e| e.name() == "navigationStateUpdated"));
}

// ─── Follow-up actions ───

#[test]
fn test_load_failure_requests_recovery() {
    let mut f = fixture();
    let action = f.event(
        SurfaceEvent::LoadFailed {
            url: "https://down.test".into(),
            error: "ERR_CONNECTION_REFUSED".into(),
        },
        0,
    );
    assert_eq!(
        action,
        Some(BridgeAction::RecoverLoadFailure {
            id: "t1".into(),
            url: "https://down.test".into(),
            error: "ERR_CONNECTION_REFUSED".into(),
        })
    );
}

#[test]
fn test_page_requests_are_forwarded() {
    let mut f = fixture();
    let action = f.event(SurfaceEvent::ReservedLinkFollowed("gx://settings".into()), 0);
    assert_eq!(
        action,
        Some(BridgeAction::OpenReserved { id: "t1".into(), url: "gx://settings".into() })
    );

    let action = f.event(SurfaceEvent::NewWindowRequested("https://popup.test".into()), 0);
    assert_eq!(
        action,
        Some(BridgeAction::OpenWindow { id: "t1".into(), url: "https://popup.test".into() })
    );
}

#[test]
fn test_unknown_surface_is_dropped() {
    let mut f = fixture();
    let now = f.t0;
    let action = f.bridge.handle_surface_event(
        999,
        SurfaceEvent::TitleChanged("x".into()),
        &mut f.registry,
        &mut f.engine,
        now,
    );
    assert!(action.is_none());
    assert!(f.bridge.pending().is_empty());
}

// ─── URL poll ───

#[test]
fn test_poll_skips_surfaces_before_first_load() {
    let mut f = fixture();
    f.probe.silently_navigate(f.surface, "https://moved.test/");
    let now = f.t0;
    assert_eq!(f.bridge.poll_urls(&mut f.registry, &f.engine, now), 0);
}

#[test]
fn test_poll_picks_up_missed_navigation() {
    let mut f = fixture();
    f.engine.load_url(f.surface, "https://example.com/").unwrap();
    f.nav(NavEvent::FinishedLoading, "https://example.com/", 0);
    f.bridge.drain();

    let now = f.t0 + Duration::from_millis(100);
    assert_eq!(f.bridge.poll_urls(&mut f.registry, &f.engine, now), 0);

    f.probe.silently_navigate(f.surface, "https://moved.test/");
    let early = f.t0 + Duration::from_millis(2000);
    assert_eq!(f.bridge.poll_urls(&mut f.registry, &f.engine, early), 0);

    let later = f.t0 + Duration::from_millis(3200);
    assert_eq!(f.bridge.poll_urls(&mut f.registry, &f.engine, later), 1);
    assert_eq!(f.url_updates(), vec!["https://moved.test/".to_string()]);
    assert_eq!(f.registry.get("t1").unwrap().tab.url, "https://moved.test/");
}

// ─── Resources ───

#[test]
fn test_resource_snapshot_is_published() {
    let mut f = fixture();
    f.bridge.publish_resources(ResourceSnapshot { cpu: 12, ram: 48, network: 3 });
    assert_eq!(
        f.bridge.drain(),
        vec![PushEvent::SystemResourcesUpdated { cpu: 12, ram: 48, network: 3 }]
    );
}
