//! App Core for Xiavion.
//!
//! The single coordinator: owns the engine, the tab manager and its registry,
//! the layout coordinator, the event bridge and the resource limiter. Hosts
//! feed it chrome commands, drained engine events and resource snapshots, and
//! forward the push events it publishes.

use std::time::Instant;

use log::{debug, info, warn};

use crate::engine::{ContentEngine, WindowCommand};
use crate::managers::layout_manager::{LayoutCoordinator, LayoutOutcome};
use crate::managers::tab_manager::{ShellContext, TabManager, TabManagerTrait};
use crate::services::event_bridge::{BridgeAction, EventBridge};
use crate::services::internal_pages::PageContext;
use crate::services::resource_limiter::ResourceLimiter;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::{EngineError, TabError};
use crate::types::events::{EngineEvent, PushEvent};
use crate::types::resources::{ResourceLimits, ResourceLimitsPatch, ResourceSnapshot};
use crate::types::settings::ShellSettings;
use crate::types::tab::Tab;

/// Upper bound on drain rounds per pump; handling an event can queue more.
const MAX_PUMP_ROUNDS: usize = 32;

/// Central application struct holding all managers and services.
pub struct App {
    pub engine: Box<dyn ContentEngine>,
    pub tab_manager: TabManager,
    pub layout: LayoutCoordinator,
    pub bridge: EventBridge,
    pub limiter: ResourceLimiter,
    pub settings_engine: SettingsEngine,
    ad_blocker_enabled: bool,
}

impl App {
    /// Build the coordinator from whatever `settings_engine` currently holds.
    /// Callers that want the on-disk settings call `load()` first.
    pub fn new(engine: Box<dyn ContentEngine>, settings_engine: SettingsEngine) -> Self {
        let settings = settings_engine.get_settings().clone();
        Self {
            engine,
            tab_manager: TabManager::new(),
            layout: LayoutCoordinator::new(settings.layout.clone()),
            bridge: EventBridge::new(&settings.events),
            limiter: ResourceLimiter::new(settings.resources.initial_limits),
            settings_engine,
            ad_blocker_enabled: false,
        }
    }

    pub fn settings(&self) -> &ShellSettings {
        self.settings_engine.get_settings()
    }

    fn split(&mut self) -> (&mut TabManager, ShellContext<'_>) {
        let pages = PageContext {
            limits: self.limiter.limits(),
        };
        (
            &mut self.tab_manager,
            ShellContext {
                engine: self.engine.as_mut(),
                layout: &mut self.layout,
                bridge: &mut self.bridge,
                pages,
            },
        )
    }

    fn reapply_limits(&mut self) {
        self.limiter
            .apply(self.tab_manager.registry(), self.engine.as_mut());
    }

    // ─── Tab commands ───

    pub fn create_tab(&mut self, id: &str, url: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.create_tab(id, url, &mut ctx)?;
        self.reapply_limits();
        Ok(())
    }

    pub fn show_tab(&mut self, id: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.show_tab(id, &mut ctx)?;
        self.reapply_limits();
        Ok(())
    }

    pub fn close_tab(&mut self, id: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.close_tab(id, &mut ctx)
    }

    /// Returns the URL the address bar should show.
    pub fn load_url(&mut self, id: &str, url: &str) -> Result<String, TabError> {
        let (tabs, mut ctx) = self.split();
        let shown = tabs.load_url(id, url, &mut ctx)?;
        self.reapply_limits();
        Ok(shown)
    }

    pub fn go_back(&mut self, id: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.go_back(id, &mut ctx)
    }

    pub fn go_forward(&mut self, id: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.go_forward(id, &mut ctx)
    }

    pub fn refresh(&mut self, id: &str) -> Result<(), TabError> {
        let (tabs, mut ctx) = self.split();
        tabs.refresh(id, &mut ctx)
    }

    pub fn tabs(&self) -> Vec<&Tab> {
        self.tab_manager.get_all_tabs()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.tab_manager.registry().active_id()
    }

    // ─── Layout and window ───

    /// The chrome moved its content region. Returns false when there is no
    /// active tab to lay out.
    pub fn content_bounds_updated(&mut self) -> bool {
        if self.tab_manager.registry().active_surface().is_none() {
            return false;
        }
        self.layout.trigger(self.engine.as_mut());
        true
    }

    pub fn window_command(&mut self, command: WindowCommand) {
        debug!("window command {:?}", command);
        self.engine.window_command(command);
    }

    // ─── Resources ───

    pub fn resource_limits(&self) -> ResourceLimits {
        self.limiter.limits()
    }

    pub fn update_resource_limits(&mut self, patch: &ResourceLimitsPatch) -> ResourceLimits {
        self.limiter
            .update(patch, self.tab_manager.registry(), self.engine.as_mut())
    }

    /// Publish a sampler reading and re-apply limits.
    pub fn on_resource_snapshot(&mut self, snapshot: ResourceSnapshot) {
        self.bridge.publish_resources(snapshot);
        self.reapply_limits();
    }

    // ─── Privacy ───

    /// The filtering itself lives in the chrome layer; the shell only keeps the flag.
    pub fn set_ad_blocker(&mut self, enabled: bool) -> bool {
        if self.ad_blocker_enabled != enabled {
            info!("ad blocker {}", if enabled { "enabled" } else { "disabled" });
        }
        self.ad_blocker_enabled = enabled;
        enabled
    }

    pub fn ad_blocker_enabled(&self) -> bool {
        self.ad_blocker_enabled
    }

    pub fn clear_cache(&mut self) -> Result<(), EngineError> {
        self.engine.clear_cache()
    }

    pub fn clear_cookies(&mut self) -> Result<(), EngineError> {
        self.engine.clear_cookies()
    }

    // ─── Event loop ───

    pub fn pump(&mut self) {
        self.pump_at(Instant::now());
    }

    /// Drain engine events until the queue settles.
    pub fn pump_at(&mut self, now: Instant) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let events = self.engine.poll_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.handle_engine_event(event, now);
            }
        }
        debug!("engine events still pending after {} rounds", MAX_PUMP_ROUNDS);
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::Surface { surface, event } => {
                let action = self.bridge.handle_surface_event(
                    surface,
                    event,
                    self.tab_manager.registry_mut(),
                    self.engine.as_mut(),
                    now,
                );
                if let Some(action) = action {
                    self.run_bridge_action(action);
                }
            }
            EngineEvent::ContentRegion(result) => {
                let outcome =
                    self.layout
                        .on_region(result, self.tab_manager.registry(), self.engine.as_mut());
                if let LayoutOutcome::Applied(rect) = outcome {
                    debug!("content region applied: {:?}", rect);
                }
            }
            EngineEvent::WindowResized(size) => {
                debug!("window resized to {}x{}", size.width, size.height);
                self.layout.trigger(self.engine.as_mut());
            }
        }
    }

    fn run_bridge_action(&mut self, action: BridgeAction) {
        let (tabs, mut ctx) = self.split();
        let result = match action {
            BridgeAction::RecoverLoadFailure { id, url, error } => {
                warn!("tab {}: load of {} failed: {}", id, url, error);
                tabs.show_error_page(&id, &url, &error, &mut ctx)
            }
            BridgeAction::OpenWindow { id, url } => tabs.open_window(&id, &url, &mut ctx).map(|_| ()),
            BridgeAction::OpenReserved { id, url } => tabs.load_url(&id, &url, &mut ctx).map(|_| ()),
        };
        if let Err(err) = result {
            warn!("engine follow-up failed: {}", err);
        }
    }

    /// Periodic housekeeping: the fallback URL poll.
    pub fn tick_at(&mut self, now: Instant) {
        self.bridge
            .poll_urls(self.tab_manager.registry_mut(), self.engine.as_ref(), now);
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Take the push events published since the last call.
    pub fn drain_events(&mut self) -> Vec<PushEvent> {
        self.bridge.drain()
    }

    /// Release every surface.
    pub fn shutdown(&mut self) {
        let ids: Vec<String> = self.tab_manager.registry().ids().to_vec();
        for id in ids {
            let _ = self.close_tab(&id);
        }
        info!("shutdown complete");
    }
}
