use log::{debug, warn};

use crate::engine::{ContentEngine, SurfaceId};
use crate::managers::layout_manager::LayoutCoordinator;
use crate::managers::page_trail::{PageRecord, Step};
use crate::managers::view_registry::ViewRegistry;
use crate::services::event_bridge::EventBridge;
use crate::services::internal_pages::{self, PageContext};
use crate::types::errors::TabError;
use crate::types::geometry::Rect;
use crate::types::tab::Tab;
use crate::types::url::ResolvedUrl;

/// The collaborators a lifecycle operation drives besides the registry.
pub struct ShellContext<'a> {
    pub engine: &'a mut dyn ContentEngine,
    pub layout: &'a mut LayoutCoordinator,
    pub bridge: &'a mut EventBridge,
    pub pages: PageContext,
}

/// What to do with a page's request to open a new window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewWindowAction {
    /// Hand the URL to the operating system.
    OpenExternally,
    /// Load it into the tab that asked.
    LoadInTab,
    Deny,
}

impl NewWindowAction {
    pub fn classify(url: &str) -> Self {
        let lower = url.trim().to_ascii_lowercase();
        if lower.starts_with("mailto:") || lower.starts_with("tel:") {
            NewWindowAction::OpenExternally
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            NewWindowAction::LoadInTab
        } else {
            NewWindowAction::Deny
        }
    }
}

/// Trait defining the tab lifecycle interface.
pub trait TabManagerTrait {
    fn create_tab(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn show_tab(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn close_tab(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn load_url(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<String, TabError>;
    fn go_back(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn go_forward(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn refresh(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError>;
    fn show_error_page(
        &mut self,
        id: &str,
        url: &str,
        error: &str,
        ctx: &mut ShellContext<'_>,
    ) -> Result<(), TabError>;
    fn open_window(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<NewWindowAction, TabError>;
    fn get_tab(&self, id: &str) -> Option<&Tab>;
    fn get_all_tabs(&self) -> Vec<&Tab>;
    fn get_active_tab(&self) -> Option<&Tab>;
    fn tab_count(&self) -> usize;
}

/// Owns the view registry and drives content surfaces through their lifecycle.
pub struct TabManager {
    registry: ViewRegistry,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            registry: ViewRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    fn surface(&self, id: &str) -> Result<SurfaceId, TabError> {
        self.registry
            .surface_of(id)
            .ok_or_else(|| TabError::NotFound(id.to_string()))
    }

    /// Tell the tab's trail which history step the engine is about to commit.
    fn expect_step(&mut self, id: &str, step: Step) {
        if let Some(entry) = self.registry.get_mut(id) {
            entry.trail.expect_step(step);
        }
    }

    fn validate_id(id: &str) -> Result<(), TabError> {
        if id.trim().is_empty() {
            return Err(TabError::InvalidId(id.to_string()));
        }
        Ok(())
    }

    /// Point a registered surface at `target`. Internal pages are rendered in
    /// place; a rejected network navigation is replaced by the error page.
    /// Returns the URL the chrome should display.
    fn navigate(
        &mut self,
        id: &str,
        target: ResolvedUrl,
        ctx: &mut ShellContext<'_>,
    ) -> Result<String, TabError> {
        let entry = self
            .registry
            .get_mut(id)
            .ok_or_else(|| TabError::NotFound(id.to_string()))?;
        let surface = entry.surface;
        let display = target.display_url().to_string();
        entry.tab.url = display.clone();

        match internal_pages::render(&target, &ctx.pages) {
            Some(html) => {
                debug!("tab {}: rendering {}", id, display);
                entry.internal = Some(target.clone());
                ctx.engine.load_html(surface, &html)?;
                entry.trail.expect_load(Some(PageRecord::reserved(target)));
            }
            None => {
                entry.internal = None;
                match ctx.engine.load_url(surface, &display) {
                    Ok(()) => entry.trail.expect_load(None),
                    Err(err) => {
                        warn!("tab {}: navigation to {} rejected: {}", id, display, err);
                        self.show_error_page(id, &display, &err.to_string(), ctx)?;
                    }
                }
            }
        }
        Ok(display)
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabManagerTrait for TabManager {
    /// Create a tab with a hidden surface, point it at `url` and show it.
    /// Creating an ID that already exists just shows it.
    fn create_tab(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        Self::validate_id(id)?;
        if self.registry.contains(id) {
            return self.show_tab(id, ctx);
        }

        let target = ResolvedUrl::resolve(url);
        let surface = ctx.engine.create_surface()?;
        self.registry.insert(id, surface, target.display_url());
        if let Err(err) = ctx.engine.set_bounds(surface, Rect::ZERO) {
            self.registry.remove(id);
            ctx.engine.destroy_surface(surface);
            return Err(err.into());
        }
        debug!("tab {} created on surface {}", id, surface);

        self.navigate(id, target, ctx)?;
        self.show_tab(id, ctx)
    }

    /// Make `id` the only visible surface.
    fn show_tab(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        let surface = self.surface(id)?;

        if let Some(previous) = self.registry.active_surface() {
            if previous != surface {
                if let Err(err) = ctx.engine.set_bounds(previous, Rect::ZERO) {
                    warn!("failed to hide surface {}: {}", previous, err);
                }
            }
        }
        self.registry.set_active(id);

        ctx.layout.activate(&self.registry, ctx.engine);
        ctx.layout.trigger(ctx.engine);
        ctx.bridge
            .publish_navigation_state(id, &mut self.registry, ctx.engine);
        Ok(())
    }

    /// Release a tab's surface. Never picks a replacement active tab.
    fn close_tab(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        let entry = self
            .registry
            .remove(id)
            .ok_or_else(|| TabError::NotFound(id.to_string()))?;
        ctx.engine.destroy_surface(entry.surface);
        ctx.bridge.forget(id);
        debug!("tab {} closed", id);
        Ok(())
    }

    /// Navigate an existing tab, or create it when the ID is new.
    fn load_url(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<String, TabError> {
        Self::validate_id(id)?;
        if !self.registry.contains(id) {
            self.create_tab(id, url, ctx)?;
            return Ok(self
                .registry
                .get(id)
                .map(|e| e.tab.url.clone())
                .unwrap_or_default());
        }
        self.navigate(id, ResolvedUrl::resolve(url), ctx)
    }

    fn go_back(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        let surface = self.surface(id)?;
        if !ctx.engine.can_go_back(surface) {
            return Err(TabError::CannotNavigate(id.to_string()));
        }
        ctx.engine.go_back(surface)?;
        self.expect_step(id, Step::Back);
        ctx.bridge
            .publish_navigation_state(id, &mut self.registry, ctx.engine);
        Ok(())
    }

    fn go_forward(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        let surface = self.surface(id)?;
        if !ctx.engine.can_go_forward(surface) {
            return Err(TabError::CannotNavigate(id.to_string()));
        }
        ctx.engine.go_forward(surface)?;
        self.expect_step(id, Step::Forward);
        ctx.bridge
            .publish_navigation_state(id, &mut self.registry, ctx.engine);
        Ok(())
    }

    /// Reload the page. Internal pages are rendered again instead.
    fn refresh(&mut self, id: &str, ctx: &mut ShellContext<'_>) -> Result<(), TabError> {
        let surface = self.surface(id)?;
        let internal = self.registry.get(id).and_then(|e| e.internal.clone());
        match internal {
            Some(page) => {
                self.navigate(id, page, ctx)?;
            }
            None => {
                ctx.engine.reload(surface)?;
                self.expect_step(id, Step::Reload);
            }
        }
        Ok(())
    }

    /// Replace the tab's content with the error page. The address bar keeps
    /// showing the URL that failed.
    fn show_error_page(
        &mut self,
        id: &str,
        url: &str,
        error: &str,
        ctx: &mut ShellContext<'_>,
    ) -> Result<(), TabError> {
        let entry = self
            .registry
            .get_mut(id)
            .ok_or_else(|| TabError::NotFound(id.to_string()))?;
        entry.internal = None;
        entry.tab.url = url.to_string();
        let surface = entry.surface;
        ctx.engine
            .load_html(surface, &internal_pages::error_page(url, error))?;
        entry.trail.expect_load(Some(PageRecord::network(url)));
        Ok(())
    }

    fn open_window(&mut self, id: &str, url: &str, ctx: &mut ShellContext<'_>) -> Result<NewWindowAction, TabError> {
        let action = NewWindowAction::classify(url);
        match action {
            NewWindowAction::OpenExternally => ctx.engine.open_external(url),
            NewWindowAction::LoadInTab => {
                self.navigate(id, ResolvedUrl::External(url.to_string()), ctx)?;
            }
            NewWindowAction::Deny => debug!("tab {}: denied new window for {}", id, url),
        }
        Ok(action)
    }

    fn get_tab(&self, id: &str) -> Option<&Tab> {
        self.registry.get(id).map(|e| &e.tab)
    }

    fn get_all_tabs(&self) -> Vec<&Tab> {
        self.registry.entries().map(|e| &e.tab).collect()
    }

    fn get_active_tab(&self) -> Option<&Tab> {
        self.registry.active_id().and_then(|id| self.get_tab(id))
    }

    fn tab_count(&self) -> usize {
        self.registry.len()
    }
}
