//! Re-publishes content-surface activity to the chrome.
//!
//! Engine notifications arrive tagged with a surface handle; the bridge maps
//! them back to tab IDs through the registry, keeps the registry's tab
//! mirror current, and queues [`PushEvent`]s in an outbox that the host
//! drains. URL notifications are de-duplicated per tab because an engine
//! fires several of them for a single navigation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;

use crate::engine::{ContentEngine, SurfaceId};
use crate::managers::page_trail::PageRecord;
use crate::managers::view_registry::ViewRegistry;
use crate::types::events::{NavEvent, PushEvent, SurfaceEvent};
use crate::types::resources::ResourceSnapshot;
use crate::types::settings::EventSettings;
use crate::types::url::is_synthetic_engine_url;

/// Follow-up work the bridge cannot do itself because it belongs to the
/// tab lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    /// Replace the failed page with an error page.
    RecoverLoadFailure {
        id: String,
        url: String,
        error: String,
    },
    /// The page asked for a new window.
    OpenWindow { id: String, url: String },
    /// Show a reserved page in the tab whose link pointed at it.
    OpenReserved { id: String, url: String },
}

#[derive(Debug, Clone)]
struct PublishedUrl {
    url: String,
    at: Instant,
}

pub struct EventBridge {
    dedupe_window: Duration,
    poll_interval: Duration,
    last_urls: HashMap<String, PublishedUrl>,
    last_poll: Option<Instant>,
    outbox: Vec<PushEvent>,
}

impl EventBridge {
    pub fn new(settings: &EventSettings) -> Self {
        Self {
            dedupe_window: Duration::from_millis(settings.url_dedupe_window_ms),
            poll_interval: Duration::from_millis(settings.url_poll_interval_ms),
            last_urls: HashMap::new(),
            last_poll: None,
            outbox: Vec::new(),
        }
    }

    pub fn publish(&mut self, event: PushEvent) {
        self.outbox.push(event);
    }

    /// Take every event published since the last drain.
    pub fn drain(&mut self) -> Vec<PushEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending(&self) -> &[PushEvent] {
        &self.outbox
    }

    /// Drop per-tab bookkeeping for a closed tab.
    pub fn forget(&mut self, id: &str) {
        self.last_urls.remove(id);
    }

    /// Publish `urlUpdated` unless the same URL went out for this tab within
    /// the de-dup window. Returns whether it was published.
    pub fn publish_url(&mut self, id: &str, url: &str, now: Instant) -> bool {
        if let Some(last) = self.last_urls.get(id) {
            let recent = now.saturating_duration_since(last.at) < self.dedupe_window;
            if last.url == url && recent {
                return false;
            }
        }
        self.last_urls.insert(
            id.to_string(),
            PublishedUrl {
                url: url.to_string(),
                at: now,
            },
        );
        self.publish(PushEvent::UrlUpdated {
            id: id.to_string(),
            url: url.to_string(),
        });
        true
    }

    /// Read back/forward availability from the engine and publish it.
    pub fn publish_navigation_state(
        &mut self,
        id: &str,
        registry: &mut ViewRegistry,
        engine: &dyn ContentEngine,
    ) {
        let Some(entry) = registry.get_mut(id) else {
            return;
        };
        entry.tab.can_go_back = engine.can_go_back(entry.surface);
        entry.tab.can_go_forward = engine.can_go_forward(entry.surface);
        let event = PushEvent::NavigationStateUpdated {
            id: id.to_string(),
            can_go_back: entry.tab.can_go_back,
            can_go_forward: entry.tab.can_go_forward,
        };
        self.publish(event);
    }

    pub fn publish_resources(&mut self, snapshot: ResourceSnapshot) {
        self.publish(PushEvent::SystemResourcesUpdated {
            cpu: snapshot.cpu,
            ram: snapshot.ram,
            network: snapshot.network,
        });
    }

    /// Handle one notification from a surface.
    pub fn handle_surface_event(
        &mut self,
        surface: SurfaceId,
        event: SurfaceEvent,
        registry: &mut ViewRegistry,
        engine: &mut dyn ContentEngine,
        now: Instant,
    ) -> Option<BridgeAction> {
        let Some(id) = registry.tab_for_surface(surface).map(str::to_string) else {
            debug!("dropping event for released surface {}: {:?}", surface, event);
            return None;
        };

        match event {
            SurfaceEvent::Navigation { kind, url } => {
                self.on_navigation(&id, surface, kind, &url, registry, engine, now);
                None
            }
            SurfaceEvent::TitleChanged(title) => {
                if let Some(entry) = registry.get_mut(&id) {
                    entry.tab.title = title.clone();
                }
                self.publish(PushEvent::PageTitleUpdated { id, title });
                None
            }
            SurfaceEvent::FaviconResolved(icon) => {
                let entry = registry.get_mut(&id)?;
                entry.tab.favicon = icon.clone();
                let event = PushEvent::PageInfoUpdated {
                    id,
                    url: entry.tab.url.clone(),
                    title: entry.tab.title.clone(),
                    favicon: icon.unwrap_or_default(),
                };
                self.publish(event);
                None
            }
            SurfaceEvent::LoadFailed { url, error } => {
                if let Some(entry) = registry.get_mut(&id) {
                    entry.trail.load_failed();
                }
                Some(BridgeAction::RecoverLoadFailure { id, url, error })
            }
            SurfaceEvent::NewWindowRequested(url) => Some(BridgeAction::OpenWindow { id, url }),
            SurfaceEvent::ReservedLinkFollowed(url) => Some(BridgeAction::OpenReserved { id, url }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_navigation(
        &mut self,
        id: &str,
        surface: SurfaceId,
        kind: NavEvent,
        engine_url: &str,
        registry: &mut ViewRegistry,
        engine: &mut dyn ContentEngine,
        now: Instant,
    ) {
        let Some(entry) = registry.get_mut(id) else {
            return;
        };

        let synthetic = is_synthetic_engine_url(engine_url);
        let display = if kind == NavEvent::Committed {
            let current = PageRecord {
                display: entry.tab.url.clone(),
                page: entry.internal.clone(),
            };
            let shown = entry.trail.on_commit(engine_url, &current);
            entry.internal = shown.page;
            shown.display
        } else if synthetic {
            if kind == NavEvent::Started {
                // Nothing is known about synthesized content until it commits.
                return;
            }
            match &entry.internal {
                Some(page) => page.display_url().to_string(),
                None => entry.tab.url.clone(),
            }
        } else {
            if kind != NavEvent::Started {
                entry.internal = None;
            }
            engine_url.to_string()
        };
        entry.tab.url = display.clone();
        if kind == NavEvent::FinishedLoading {
            entry.loaded_once = true;
        }

        self.publish_url(id, &display, now);

        if kind == NavEvent::FinishedLoading {
            engine.query_favicon(surface);
        }
        if kind.affects_history() {
            self.publish_navigation_state(id, registry, engine);
        }
    }

    /// Low-frequency fallback for missed URL notifications. Only surfaces past
    /// their first load are checked, and only real URL changes are published.
    /// Returns how many updates went out.
    pub fn poll_urls(
        &mut self,
        registry: &mut ViewRegistry,
        engine: &dyn ContentEngine,
        now: Instant,
    ) -> usize {
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.poll_interval {
                return 0;
            }
        }
        self.last_poll = Some(now);

        let candidates: Vec<(String, SurfaceId)> = registry
            .entries()
            .filter(|e| e.loaded_once)
            .map(|e| (e.tab.id.clone(), e.surface))
            .collect();

        let mut published = 0;
        for (id, surface) in candidates {
            let Some(url) = engine.current_url(surface) else {
                continue;
            };
            if is_synthetic_engine_url(&url) {
                continue;
            }
            let changed = self
                .last_urls
                .get(&id)
                .map(|last| last.url != url)
                .unwrap_or(true);
            if !changed {
                continue;
            }
            if let Some(entry) = registry.get_mut(&id) {
                entry.tab.url = url.clone();
                entry.internal = None;
                entry.trail.record_untracked(&url);
            }
            debug!("url poll picked up {} for tab {}", url, id);
            if self.publish_url(&id, &url, now) {
                published += 1;
            }
        }
        published
    }
}
