//! In-memory engine without rendering.
//!
//! Backs the `xiavion-rpc` server and the integration tests. Surfaces keep a
//! real back/forward list, navigations emit the same event sequence a
//! webview would, and every knob the coordinator touches is recorded so it
//! can be inspected through a [`HeadlessProbe`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use url::Url;

use super::{ContentEngine, SurfaceId, WindowCommand};
use crate::types::errors::EngineError;
use crate::types::events::{EngineEvent, NavEvent, SurfaceEvent};
use crate::types::geometry::{Rect, Size};
use crate::types::url::BLANK_URL;

#[derive(Debug, Clone, PartialEq)]
enum HistoryEntry {
    Url(String),
    Html(String),
}

impl HistoryEntry {
    fn engine_url(&self) -> &str {
        match self {
            HistoryEntry::Url(u) => u,
            HistoryEntry::Html(_) => BLANK_URL,
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessSurface {
    history: Vec<HistoryEntry>,
    cursor: usize,
    title: String,
    bounds: Rect,
    throttled: bool,
}

impl HeadlessSurface {
    fn current(&self) -> Option<&HistoryEntry> {
        self.history.get(self.cursor)
    }

    fn commit(&mut self, entry: HistoryEntry) {
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push(entry);
        self.cursor = self.history.len() - 1;
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: SurfaceId,
    surfaces: BTreeMap<SurfaceId, HeadlessSurface>,
    window: Size,
    maximized: bool,
    closed: bool,
    minimized: bool,
    content_region: Option<Rect>,
    region_query_error: Option<String>,
    region_queries: usize,
    favicons: HashMap<String, String>,
    immediate_failures: HashMap<String, String>,
    deferred_failures: HashMap<String, String>,
    navigations: Vec<(SurfaceId, String)>,
    html_loads: Vec<(SurfaceId, String)>,
    bounds_log: Vec<(SurfaceId, Rect)>,
    cache_size: Option<u64>,
    cache_clears: usize,
    cookie_clears: usize,
    external_opens: Vec<String>,
    queue: Vec<EngineEvent>,
}

impl HeadlessState {
    fn surface_mut(&mut self, surface: SurfaceId) -> Result<&mut HeadlessSurface, EngineError> {
        self.surfaces
            .get_mut(&surface)
            .ok_or(EngineError::UnknownSurface(surface))
    }

    fn emit(&mut self, surface: SurfaceId, event: SurfaceEvent) {
        self.queue.push(EngineEvent::Surface { surface, event });
    }

    fn emit_load(&mut self, surface: SurfaceId, url: &str, title: &str) {
        for kind in [NavEvent::Started, NavEvent::Committed] {
            self.emit(surface, SurfaceEvent::Navigation { kind, url: url.to_string() });
        }
        self.emit(surface, SurfaceEvent::TitleChanged(title.to_string()));
        self.emit(
            surface,
            SurfaceEvent::Navigation {
                kind: NavEvent::FinishedLoading,
                url: url.to_string(),
            },
        );
    }

    /// Re-enter the entry under the cursor, as a back/forward/reload would.
    fn revisit(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        let s = self.surface_mut(surface)?;
        let entry = s.current().cloned().unwrap_or(HistoryEntry::Url(BLANK_URL.into()));
        let title = match &entry {
            HistoryEntry::Url(u) => title_for_url(u),
            HistoryEntry::Html(html) => title_for_html(html),
        };
        s.title = title.clone();
        self.emit_load(surface, entry.engine_url(), &title);
        Ok(())
    }
}

fn title_for_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

fn title_for_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match (lower.find("<title>"), lower.find("</title>")) {
        (Some(start), Some(end)) if end > start + 7 => html[start + 7..end].trim().to_string(),
        _ => String::new(),
    }
}

/// A headless [`ContentEngine`].
pub struct HeadlessEngine {
    state: Arc<Mutex<HeadlessState>>,
}

/// Shared view into a [`HeadlessEngine`] for inspection and fault injection.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

fn lock(state: &Mutex<HeadlessState>) -> MutexGuard<'_, HeadlessState> {
    // A panic while holding the lock leaves plain data behind; keep going.
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl HeadlessEngine {
    pub fn new(window: Size) -> Self {
        let state = HeadlessState {
            next_id: 1,
            window,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(Size::new(1200, 800))
    }
}

impl ContentEngine for HeadlessEngine {
    fn create_surface(&mut self) -> Result<SurfaceId, EngineError> {
        let mut st = lock(&self.state);
        let id = st.next_id;
        st.next_id += 1;
        st.surfaces.insert(id, HeadlessSurface::default());
        debug!("headless: surface {} created", id);
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        let mut st = lock(&self.state);
        st.surfaces.remove(&surface);
        // Anything still queued for the surface is delivered; the coordinator drops it.
        debug!("headless: surface {} destroyed", surface);
    }

    fn set_bounds(&mut self, surface: SurfaceId, bounds: Rect) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        st.surface_mut(surface)?.bounds = bounds;
        st.bounds_log.push((surface, bounds));
        Ok(())
    }

    fn load_url(&mut self, surface: SurfaceId, url: &str) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        st.surface_mut(surface)?;
        st.navigations.push((surface, url.to_string()));

        if let Some(err) = st.immediate_failures.get(url).cloned() {
            return Err(EngineError::Navigation(err));
        }
        super::check_navigable(url)?;

        if let Some(err) = st.deferred_failures.get(url).cloned() {
            st.emit(
                surface,
                SurfaceEvent::Navigation {
                    kind: NavEvent::Started,
                    url: url.to_string(),
                },
            );
            st.emit(
                surface,
                SurfaceEvent::LoadFailed {
                    url: url.to_string(),
                    error: err,
                },
            );
            return Ok(());
        }

        let title = title_for_url(url);
        let s = st.surface_mut(surface)?;
        s.commit(HistoryEntry::Url(url.to_string()));
        s.title = title.clone();
        st.emit_load(surface, url, &title);
        Ok(())
    }

    fn load_html(&mut self, surface: SurfaceId, html: &str) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        let title = title_for_html(html);
        let s = st.surface_mut(surface)?;
        s.commit(HistoryEntry::Html(html.to_string()));
        s.title = title.clone();
        st.html_loads.push((surface, html.to_string()));
        st.emit_load(surface, BLANK_URL, &title);
        Ok(())
    }

    fn go_back(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        let s = st.surface_mut(surface)?;
        if s.cursor == 0 || s.history.is_empty() {
            return Err(EngineError::Navigation("no back history".into()));
        }
        s.cursor -= 1;
        st.revisit(surface)
    }

    fn go_forward(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        let s = st.surface_mut(surface)?;
        if s.cursor + 1 >= s.history.len() {
            return Err(EngineError::Navigation("no forward history".into()));
        }
        s.cursor += 1;
        st.revisit(surface)
    }

    fn reload(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        let mut st = lock(&self.state);
        st.revisit(surface)
    }

    fn can_go_back(&self, surface: SurfaceId) -> bool {
        let st = lock(&self.state);
        st.surfaces
            .get(&surface)
            .map(|s| !s.history.is_empty() && s.cursor > 0)
            .unwrap_or(false)
    }

    fn can_go_forward(&self, surface: SurfaceId) -> bool {
        let st = lock(&self.state);
        st.surfaces
            .get(&surface)
            .map(|s| s.cursor + 1 < s.history.len())
            .unwrap_or(false)
    }

    fn current_url(&self, surface: SurfaceId) -> Option<String> {
        let st = lock(&self.state);
        let s = st.surfaces.get(&surface)?;
        Some(
            s.current()
                .map(|e| e.engine_url().to_string())
                .unwrap_or_else(|| BLANK_URL.to_string()),
        )
    }

    fn title(&self, surface: SurfaceId) -> Option<String> {
        let st = lock(&self.state);
        st.surfaces.get(&surface).map(|s| s.title.clone())
    }

    fn query_favicon(&mut self, surface: SurfaceId) {
        let mut st = lock(&self.state);
        let url = st
            .surfaces
            .get(&surface)
            .and_then(|s| s.current())
            .map(|e| e.engine_url().to_string());
        let icon = url.and_then(|u| st.favicons.get(&u).cloned());
        st.emit(surface, SurfaceEvent::FaviconResolved(icon));
    }

    fn query_content_region(&mut self, _anchors: &[String]) {
        let mut st = lock(&self.state);
        st.region_queries += 1;
        let result = match &st.region_query_error {
            Some(err) => Err(err.clone()),
            None => Ok(st.content_region),
        };
        st.queue.push(EngineEvent::ContentRegion(result));
    }

    fn window_size(&self) -> Size {
        lock(&self.state).window
    }

    fn window_command(&mut self, command: WindowCommand) {
        let mut st = lock(&self.state);
        match command {
            WindowCommand::Minimize => st.minimized = true,
            WindowCommand::ToggleMaximize => st.maximized = !st.maximized,
            WindowCommand::Close => st.closed = true,
        }
    }

    fn open_external(&mut self, url: &str) {
        lock(&self.state).external_opens.push(url.to_string());
    }

    fn set_background_throttling(&mut self, surface: SurfaceId, enabled: bool) {
        let mut st = lock(&self.state);
        if let Some(s) = st.surfaces.get_mut(&surface) {
            s.throttled = enabled;
        }
    }

    fn set_cache_size(&mut self, bytes: u64) {
        lock(&self.state).cache_size = Some(bytes);
    }

    fn clear_cache(&mut self) -> Result<(), EngineError> {
        lock(&self.state).cache_clears += 1;
        Ok(())
    }

    fn clear_cookies(&mut self) -> Result<(), EngineError> {
        lock(&self.state).cookie_clears += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut lock(&self.state).queue)
    }
}

impl HeadlessProbe {
    // ─── Fault injection and scripted geometry ───

    /// Reject navigations to `url` synchronously with `error`.
    pub fn fail_url(&self, url: &str, error: &str) {
        lock(&self.state)
            .immediate_failures
            .insert(url.to_string(), error.to_string());
    }

    /// Accept navigations to `url` but report `LoadFailed` afterwards.
    pub fn fail_url_later(&self, url: &str, error: &str) {
        lock(&self.state)
            .deferred_failures
            .insert(url.to_string(), error.to_string());
    }

    pub fn set_content_region(&self, region: Option<Rect>) {
        lock(&self.state).content_region = region;
    }

    pub fn fail_region_queries(&self, error: Option<&str>) {
        lock(&self.state).region_query_error = error.map(str::to_string);
    }

    pub fn set_window_size(&self, size: Size) {
        lock(&self.state).window = size;
    }

    pub fn set_favicon(&self, page_url: &str, icon_url: &str) {
        lock(&self.state)
            .favicons
            .insert(page_url.to_string(), icon_url.to_string());
    }

    /// Queue an arbitrary engine event, as a real engine would on its own.
    pub fn inject(&self, event: EngineEvent) {
        lock(&self.state).queue.push(event);
    }

    /// Change what the surface reports as its URL without emitting any event,
    /// simulating a navigation whose notifications were lost.
    pub fn silently_navigate(&self, surface: SurfaceId, url: &str) {
        let mut st = lock(&self.state);
        if let Some(s) = st.surfaces.get_mut(&surface) {
            s.commit(HistoryEntry::Url(url.to_string()));
        }
    }

    // ─── Inspection ───

    pub fn surface_count(&self) -> usize {
        lock(&self.state).surfaces.len()
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        lock(&self.state).surfaces.keys().copied().collect()
    }

    pub fn is_alive(&self, surface: SurfaceId) -> bool {
        lock(&self.state).surfaces.contains_key(&surface)
    }

    pub fn bounds(&self, surface: SurfaceId) -> Option<Rect> {
        lock(&self.state).surfaces.get(&surface).map(|s| s.bounds)
    }

    /// Every `set_bounds` call so far, in order.
    pub fn bounds_log(&self) -> Vec<(SurfaceId, Rect)> {
        lock(&self.state).bounds_log.clone()
    }

    /// Every network navigation requested so far, in order.
    pub fn navigations(&self) -> Vec<(SurfaceId, String)> {
        lock(&self.state).navigations.clone()
    }

    pub fn html_loads(&self) -> Vec<(SurfaceId, String)> {
        lock(&self.state).html_loads.clone()
    }

    pub fn last_html(&self, surface: SurfaceId) -> Option<String> {
        lock(&self.state)
            .html_loads
            .iter()
            .rev()
            .find(|(s, _)| *s == surface)
            .map(|(_, html)| html.clone())
    }

    pub fn is_throttled(&self, surface: SurfaceId) -> bool {
        lock(&self.state)
            .surfaces
            .get(&surface)
            .map(|s| s.throttled)
            .unwrap_or(false)
    }

    pub fn cache_size(&self) -> Option<u64> {
        lock(&self.state).cache_size
    }

    pub fn region_queries(&self) -> usize {
        lock(&self.state).region_queries
    }

    pub fn cache_clears(&self) -> usize {
        lock(&self.state).cache_clears
    }

    pub fn cookie_clears(&self) -> usize {
        lock(&self.state).cookie_clears
    }

    pub fn external_opens(&self) -> Vec<String> {
        lock(&self.state).external_opens.clone()
    }

    pub fn is_minimized(&self) -> bool {
        lock(&self.state).minimized
    }

    pub fn is_maximized(&self) -> bool {
        lock(&self.state).maximized
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}
