//! Windowed host using `wry` + `tao`.
//!
//! Architecture:
//! - The chrome (tab strip, address bar, panels) is one webview covering the
//!   whole window, loaded from `window.chrome_url` in the settings.
//! - Every tab is a child webview created by [`WryEngine`]; only the active
//!   one has non-zero bounds.
//! - The chrome talks to the shell through `window.shellAPI.invoke(method, params)`,
//!   which posts `{requestId, method, params}` over `window.ipc`. Responses and
//!   push events go back through evaluated script.
//! - Webview callbacks never touch the coordinator. They queue engine events
//!   and wake the event loop, which pumps the [`App`].

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::Value;
use tao::dpi::LogicalSize;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use wry::dpi::LogicalPosition;
use wry::{PageLoadEvent, WebContext, WebView, WebViewBuilder};

use crate::app::App;
use crate::engine::{check_navigable, ContentEngine, SurfaceId, WindowCommand};
use crate::platform;
use crate::rpc_handler::handle_method;
use crate::services::resource_sampler::{ResourceMonitor, ResourceSampler, SystemMetrics};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::EngineError;
use crate::types::events::{EngineEvent, NavEvent, SurfaceEvent};
use crate::types::geometry::{Rect, Size};
use crate::types::resources::ResourceSnapshot;
use crate::types::url::is_reserved_url;

/// Housekeeping cadence while the loop is otherwise idle.
const TICK: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum UserEvent {
    /// A request from the chrome.
    Command {
        request_id: Value,
        method: String,
        params: Value,
    },
    /// A webview callback queued engine events.
    EngineWake,
    Sample(ResourceSnapshot),
    Exit,
}

/// Defines `window.shellAPI` in the chrome.
const SHELL_API_JS: &str = r#"
(function () {
  var pending = {}, seq = 0, listeners = {};
  window.shellAPI = {
    invoke: function (method, params) {
      return new Promise(function (resolve) {
        var id = ++seq;
        pending[id] = resolve;
        window.ipc.postMessage(JSON.stringify({ requestId: id, method: method, params: params || {} }));
      });
    },
    on: function (name, cb) {
      (listeners[name] = listeners[name] || []).push(cb);
      return function () {
        listeners[name] = (listeners[name] || []).filter(function (f) { return f !== cb; });
      };
    }
  };
  window.__xiavionResolve = function (id, result) {
    var r = pending[id];
    if (r) { delete pending[id]; r(result); }
  };
  window.__xiavionDispatch = function (msg) {
    (listeners[msg.event] || []).forEach(function (cb) {
      try { cb(msg.data); } catch (e) { console.error(e); }
    });
  };
})();
"#;

/// Reports same-document navigations from content pages.
const IN_PAGE_JS: &str = r#"
(function () {
  function report() {
    try { window.ipc.postMessage(JSON.stringify({ kind: 'inPage', url: location.href })); } catch (e) {}
  }
  var push = history.pushState, replace = history.replaceState;
  history.pushState = function () { var v = push.apply(this, arguments); report(); return v; };
  history.replaceState = function () { var v = replace.apply(this, arguments); report(); return v; };
  window.addEventListener('popstate', report);
  window.addEventListener('hashchange', report);
})();
"#;

const FAVICON_JS: &str = r#"(function () {
  var l = document.querySelector('link[rel~="icon"]') || document.querySelector('link[rel="shortcut icon"]');
  return l ? l.href : '';
})()"#;

fn content_region_js(anchors: &[String]) -> String {
    let list = serde_json::to_string(anchors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(function () {{
  var anchors = {};
  for (var i = 0; i < anchors.length; i++) {{
    var el = document.querySelector(anchors[i]);
    if (el) {{
      var r = el.getBoundingClientRect();
      if (r.width > 0 && r.height > 0) return {{ x: r.left, y: r.top, width: r.width, height: r.height }};
    }}
  }}
  return null;
}})()"#,
        list
    )
}

fn to_wry_rect(r: Rect) -> wry::Rect {
    wry::Rect {
        position: LogicalPosition::new(r.x, r.y).into(),
        size: wry::dpi::LogicalSize::new(r.width, r.height).into(),
    }
}

fn logical_size(window: &Window) -> Size {
    let s = window.inner_size().to_logical::<f64>(window.scale_factor());
    Size::new(s.width.round().max(0.0) as u32, s.height.round().max(0.0) as u32)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ─── Engine event plumbing ───

/// Shared sink webview callbacks push engine events into.
#[derive(Clone)]
struct EventSink {
    queue: Arc<Mutex<Vec<EngineEvent>>>,
    proxy: EventLoopProxy<UserEvent>,
}

impl EventSink {
    fn push(&self, event: EngineEvent) {
        lock(&self.queue).push(event);
        let _ = self.proxy.send_event(UserEvent::EngineWake);
    }

    fn surface(&self, surface: SurfaceId, event: SurfaceEvent) {
        self.push(EngineEvent::Surface { surface, event });
    }
}

#[derive(Debug, Clone, Copy)]
enum PendingStep {
    Back,
    Forward,
    Reload,
}

/// Back/forward list reconstructed from finished loads; the webview does not expose its own.
#[derive(Debug, Default)]
struct NavHistory {
    entries: Vec<String>,
    cursor: usize,
    pending: Option<PendingStep>,
    title: String,
}

impl NavHistory {
    fn on_finished(&mut self, url: &str) {
        match self.pending.take() {
            Some(PendingStep::Back) => self.cursor = self.cursor.saturating_sub(1),
            Some(PendingStep::Forward) => {
                self.cursor = (self.cursor + 1).min(self.entries.len().saturating_sub(1))
            }
            Some(PendingStep::Reload) => {}
            None => {
                if self.entries.get(self.cursor).map(String::as_str) == Some(url) {
                    return;
                }
                if !self.entries.is_empty() {
                    self.entries.truncate(self.cursor + 1);
                }
                self.entries.push(url.to_string());
                self.cursor = self.entries.len() - 1;
            }
        }
    }

    fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

type Histories = Arc<Mutex<HashMap<SurfaceId, NavHistory>>>;

// ─── WryEngine ───

/// [`ContentEngine`] backed by child webviews of one tao window.
pub struct WryEngine {
    window: Rc<Window>,
    chrome: Rc<WebView>,
    context: WebContext,
    surfaces: HashMap<SurfaceId, WebView>,
    histories: Histories,
    next_id: SurfaceId,
    sink: EventSink,
    throttled: HashMap<SurfaceId, bool>,
    cache_size: Option<u64>,
}

impl WryEngine {
    fn new(window: Rc<Window>, chrome: Rc<WebView>, context: WebContext, sink: EventSink) -> Self {
        Self {
            window,
            chrome,
            context,
            surfaces: HashMap::new(),
            histories: Arc::new(Mutex::new(HashMap::new())),
            next_id: 1,
            sink,
            throttled: HashMap::new(),
            cache_size: None,
        }
    }

    fn webview(&self, surface: SurfaceId) -> Result<&WebView, EngineError> {
        self.surfaces
            .get(&surface)
            .ok_or(EngineError::UnknownSurface(surface))
    }

    fn step(&mut self, surface: SurfaceId, step: PendingStep, script: &str) -> Result<(), EngineError> {
        let webview = self.webview(surface)?;
        if let Some(h) = lock(&self.histories).get_mut(&surface) {
            h.pending = Some(step);
        }
        webview
            .evaluate_script(script)
            .map_err(|e| EngineError::Script(e.to_string()))
    }
}

impl ContentEngine for WryEngine {
    fn create_surface(&mut self) -> Result<SurfaceId, EngineError> {
        let id = self.next_id;
        self.next_id += 1;
        lock(&self.histories).insert(id, NavHistory::default());

        let nav_sink = self.sink.clone();
        let load_sink = self.sink.clone();
        let load_histories = Arc::clone(&self.histories);
        let title_sink = self.sink.clone();
        let title_histories = Arc::clone(&self.histories);
        let ipc_sink = self.sink.clone();
        let window_sink = self.sink.clone();

        let webview = WebViewBuilder::new_with_web_context(&mut self.context)
            .with_bounds(to_wry_rect(Rect::ZERO))
            .with_visible(false)
            .with_devtools(cfg!(debug_assertions))
            .with_initialization_script(IN_PAGE_JS)
            .with_navigation_handler(move |url| {
                if is_reserved_url(&url) {
                    nav_sink.surface(id, SurfaceEvent::ReservedLinkFollowed(url));
                    return false;
                }
                nav_sink.surface(id, SurfaceEvent::Navigation { kind: NavEvent::Started, url });
                true
            })
            .with_on_page_load_handler(move |event, url| match event {
                PageLoadEvent::Started => {
                    load_sink.surface(id, SurfaceEvent::Navigation { kind: NavEvent::Committed, url });
                }
                PageLoadEvent::Finished => {
                    if let Some(h) = lock(&load_histories).get_mut(&id) {
                        h.on_finished(&url);
                    }
                    load_sink.surface(
                        id,
                        SurfaceEvent::Navigation { kind: NavEvent::FinishedLoading, url },
                    );
                }
            })
            .with_document_title_changed_handler(move |title| {
                if let Some(h) = lock(&title_histories).get_mut(&id) {
                    h.title = title.clone();
                }
                title_sink.surface(id, SurfaceEvent::TitleChanged(title));
            })
            .with_ipc_handler(move |request: wry::http::Request<String>| {
                let msg: Value = match serde_json::from_str(request.body()) {
                    Ok(v) => v,
                    Err(_) => return,
                };
                if msg.get("kind").and_then(|v| v.as_str()) == Some("inPage") {
                    if let Some(url) = msg.get("url").and_then(|v| v.as_str()) {
                        ipc_sink.surface(
                            id,
                            SurfaceEvent::Navigation {
                                kind: NavEvent::InPageNavigated,
                                url: url.to_string(),
                            },
                        );
                    }
                }
            })
            .with_new_window_req_handler(move |url, _features| {
                window_sink.surface(id, SurfaceEvent::NewWindowRequested(url));
                wry::NewWindowResponse::Deny
            })
            .build_as_child(&*self.window)
            .map_err(|e| {
                lock(&self.histories).remove(&id);
                EngineError::SurfaceCreation(e.to_string())
            })?;

        self.surfaces.insert(id, webview);
        debug!("surface {} created", id);
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        // Dropping the webview detaches it from the window.
        self.surfaces.remove(&surface);
        self.throttled.remove(&surface);
        lock(&self.histories).remove(&surface);
    }

    fn set_bounds(&mut self, surface: SurfaceId, bounds: Rect) -> Result<(), EngineError> {
        let webview = self.webview(surface)?;
        webview
            .set_bounds(to_wry_rect(bounds))
            .map_err(|e| EngineError::Other(e.to_string()))?;
        webview
            .set_visible(bounds.is_visible())
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    fn load_url(&mut self, surface: SurfaceId, url: &str) -> Result<(), EngineError> {
        check_navigable(url)?;
        self.webview(surface)?
            .load_url(url)
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn load_html(&mut self, surface: SurfaceId, html: &str) -> Result<(), EngineError> {
        self.webview(surface)?
            .load_html(html)
            .map_err(|e| EngineError::Navigation(e.to_string()))
    }

    fn go_back(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        self.step(surface, PendingStep::Back, "history.back()")
    }

    fn go_forward(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        self.step(surface, PendingStep::Forward, "history.forward()")
    }

    fn reload(&mut self, surface: SurfaceId) -> Result<(), EngineError> {
        self.step(surface, PendingStep::Reload, "location.reload()")
    }

    fn can_go_back(&self, surface: SurfaceId) -> bool {
        lock(&self.histories)
            .get(&surface)
            .map(NavHistory::can_go_back)
            .unwrap_or(false)
    }

    fn can_go_forward(&self, surface: SurfaceId) -> bool {
        lock(&self.histories)
            .get(&surface)
            .map(NavHistory::can_go_forward)
            .unwrap_or(false)
    }

    fn current_url(&self, surface: SurfaceId) -> Option<String> {
        self.surfaces.get(&surface)?.url().ok()
    }

    fn title(&self, surface: SurfaceId) -> Option<String> {
        lock(&self.histories).get(&surface).map(|h| h.title.clone())
    }

    fn query_favicon(&mut self, surface: SurfaceId) {
        let Some(webview) = self.surfaces.get(&surface) else {
            return;
        };
        let sink = self.sink.clone();
        let queued = webview.evaluate_script_with_callback(FAVICON_JS, move |result| {
            let icon = serde_json::from_str::<String>(&result)
                .ok()
                .filter(|s| !s.is_empty());
            sink.surface(surface, SurfaceEvent::FaviconResolved(icon));
        });
        if let Err(e) = queued {
            debug!("favicon query failed: {}", e);
            self.sink.surface(surface, SurfaceEvent::FaviconResolved(None));
        }
    }

    fn query_content_region(&mut self, anchors: &[String]) {
        let sink = self.sink.clone();
        let queued = self
            .chrome
            .evaluate_script_with_callback(&content_region_js(anchors), move |result| {
                let region = match serde_json::from_str::<Value>(&result) {
                    Ok(Value::Null) => Ok(None),
                    Ok(v) => Ok(Rect::from_json(&v)),
                    Err(e) => Err(e.to_string()),
                };
                sink.push(EngineEvent::ContentRegion(region));
            });
        if let Err(e) = queued {
            self.sink.push(EngineEvent::ContentRegion(Err(e.to_string())));
        }
    }

    fn window_size(&self) -> Size {
        logical_size(&self.window)
    }

    fn window_command(&mut self, command: WindowCommand) {
        match command {
            WindowCommand::Minimize => self.window.set_minimized(true),
            WindowCommand::ToggleMaximize => self.window.set_maximized(!self.window.is_maximized()),
            WindowCommand::Close => {
                let _ = self.sink.proxy.send_event(UserEvent::Exit);
            }
        }
    }

    fn open_external(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!("failed to open {} externally: {}", url, e);
        }
    }

    fn set_background_throttling(&mut self, surface: SurfaceId, enabled: bool) {
        // The webview only takes a throttling policy at build time.
        if self.throttled.insert(surface, enabled) != Some(enabled) {
            debug!("surface {} background throttling -> {}", surface, enabled);
        }
    }

    fn set_cache_size(&mut self, bytes: u64) {
        if self.cache_size != Some(bytes) {
            debug!("cache ceiling -> {} bytes", bytes);
            self.cache_size = Some(bytes);
        }
    }

    fn clear_cache(&mut self) -> Result<(), EngineError> {
        self.chrome
            .clear_all_browsing_data()
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    fn clear_cookies(&mut self) -> Result<(), EngineError> {
        self.chrome
            .clear_all_browsing_data()
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut *lock(&self.sink.queue))
    }
}

// ─── Chrome ───

fn fit_chrome(window: &Window, chrome: &WebView) {
    let size = logical_size(window);
    if let Err(e) = chrome.set_bounds(to_wry_rect(Rect::new(0, 0, size.width, size.height))) {
        warn!("failed to resize chrome: {}", e);
    }
}

fn build_chrome(
    window: &Window,
    context: &mut WebContext,
    chrome_url: &str,
    proxy: EventLoopProxy<UserEvent>,
) -> Result<WebView, wry::Error> {
    let size = logical_size(window);
    WebViewBuilder::new_with_web_context(context)
        .with_url(chrome_url)
        .with_bounds(to_wry_rect(Rect::new(0, 0, size.width, size.height)))
        .with_initialization_script(SHELL_API_JS)
        .with_devtools(cfg!(debug_assertions))
        .with_ipc_handler(move |request: wry::http::Request<String>| {
            let msg: Value = match serde_json::from_str(request.body()) {
                Ok(v) => v,
                Err(e) => {
                    warn!("malformed chrome message: {}", e);
                    return;
                }
            };
            let Some(method) = msg.get("method").and_then(|v| v.as_str()) else {
                return;
            };
            let _ = proxy.send_event(UserEvent::Command {
                request_id: msg.get("requestId").cloned().unwrap_or(Value::Null),
                method: method.to_string(),
                params: msg.get("params").cloned().unwrap_or(Value::Null),
            });
        })
        .with_new_window_req_handler(|_url, _features| wry::NewWindowResponse::Deny)
        .build_as_child(window)
}

fn flush_push_events(app: &Mutex<App>, chrome: &WebView) {
    let events = {
        let mut a = lock(app);
        a.pump();
        a.tick();
        a.drain_events()
    };
    for event in events {
        match serde_json::to_string(&event) {
            Ok(json) => {
                let _ = chrome.evaluate_script(&format!(
                    "window.__xiavionDispatch && window.__xiavionDispatch({})",
                    json
                ));
            }
            Err(e) => warn!("failed to serialize {}: {}", event.name(), e),
        }
    }
}

// ─── Main entry point ───

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings_engine = SettingsEngine::new(None);
    if let Err(e) = settings_engine.load() {
        warn!("settings not loaded, using defaults: {}", e);
    }
    let settings = settings_engine.get_settings().clone();

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Xiavion")
            .with_inner_size(LogicalSize::new(settings.window.width, settings.window.height))
            .with_min_inner_size(LogicalSize::new(
                settings.window.min_width,
                settings.window.min_height,
            ))
            .with_decorations(!settings.window.frameless)
            .build(&event_loop)?,
    );

    let mut context = WebContext::new(Some(platform::get_data_dir()));
    let chrome = Rc::new(build_chrome(
        &window,
        &mut context,
        &settings.window.chrome_url,
        proxy.clone(),
    )?);

    let sink = EventSink {
        queue: Arc::new(Mutex::new(Vec::new())),
        proxy: proxy.clone(),
    };
    let engine = WryEngine::new(Rc::clone(&window), Rc::clone(&chrome), context, sink);
    let app = Mutex::new(App::new(Box::new(engine), settings_engine));

    let monitor = ResourceMonitor::new();
    let sample_proxy = proxy.clone();
    monitor.start(
        ResourceSampler::new(Box::new(SystemMetrics::new()), &settings.resources),
        Duration::from_millis(settings.resources.sample_interval_ms),
        move |snapshot| {
            let _ = sample_proxy.send_event(UserEvent::Sample(snapshot));
        },
    )?;
    info!("window up, chrome at {}", settings.window.chrome_url);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + TICK);

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            }
            | Event::UserEvent(UserEvent::Exit) => {
                monitor.stop();
                lock(&app).shutdown();
                *control_flow = ControlFlow::Exit;
                return;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                fit_chrome(&window, &chrome);
                let size = logical_size(&window);
                lock(&app).handle_engine_event(EngineEvent::WindowResized(size), Instant::now());
            }

            Event::UserEvent(UserEvent::Command {
                request_id,
                method,
                params,
            }) => {
                let result = handle_method(&app, &method, &params);
                let script = format!(
                    "window.__xiavionResolve && window.__xiavionResolve({}, {})",
                    request_id, result
                );
                if let Err(e) = chrome.evaluate_script(&script) {
                    warn!("failed to answer {}: {}", method, e);
                }
            }

            Event::UserEvent(UserEvent::Sample(snapshot)) => {
                lock(&app).on_resource_snapshot(snapshot);
            }

            Event::UserEvent(UserEvent::EngineWake) => {}

            _ => {}
        }

        flush_push_events(&app, &chrome);
    });
}
