//! Keeps the active surface's rectangle in sync with the chrome's content region.
//!
//! Geometry comes from an asynchronous query against the chrome layer. Only
//! one query is in flight at a time; triggers that arrive meanwhile are
//! folded into a single pending retrigger, and a result that comes back while
//! a retrigger is pending is stale and replaced by a fresh query.

use log::{debug, warn};

use crate::engine::ContentEngine;
use crate::managers::view_registry::ViewRegistry;
use crate::types::geometry::Rect;
use crate::types::settings::LayoutSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    Idle,
    Computing,
    ComputingWithPendingRetrigger,
}

/// What happened to a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// The rectangle was applied to the active surface.
    Applied(Rect),
    /// A retrigger was pending; the result was dropped and a new query issued.
    Requeried,
    /// Same as the last applied rectangle.
    Unchanged,
    /// Zero width or height, typically a read during layout thrash.
    Degenerate,
    /// No live active surface to apply to.
    NoActiveSurface,
    /// No query was in flight.
    Unexpected,
}

pub struct LayoutCoordinator {
    settings: LayoutSettings,
    state: LayoutState,
    last_applied: Option<Rect>,
    last_region: Option<Rect>,
}

impl LayoutCoordinator {
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            settings,
            state: LayoutState::Idle,
            last_applied: None,
            last_region: None,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// The most recent visible content region, if one was ever resolved.
    pub fn last_region(&self) -> Option<Rect> {
        self.last_region
    }

    pub fn last_applied(&self) -> Option<Rect> {
        self.last_applied
    }

    /// Request a recomputation. Issues a query only when none is in flight.
    pub fn trigger(&mut self, engine: &mut dyn ContentEngine) {
        match self.state {
            LayoutState::Idle => {
                self.state = LayoutState::Computing;
                engine.query_content_region(&self.settings.anchors);
            }
            LayoutState::Computing | LayoutState::ComputingWithPendingRetrigger => {
                self.state = LayoutState::ComputingWithPendingRetrigger;
            }
        }
    }

    /// The active surface changed: forget what was applied to the previous one
    /// and give the new one the last known region right away.
    pub fn activate(&mut self, registry: &ViewRegistry, engine: &mut dyn ContentEngine) {
        self.last_applied = None;
        if let Some(region) = self.last_region {
            self.apply(region, registry, engine);
        }
    }

    /// Handle the answer to a content-region query.
    pub fn on_region(
        &mut self,
        result: Result<Option<Rect>, String>,
        registry: &ViewRegistry,
        engine: &mut dyn ContentEngine,
    ) -> LayoutOutcome {
        match self.state {
            LayoutState::Idle => return LayoutOutcome::Unexpected,
            LayoutState::ComputingWithPendingRetrigger => {
                self.state = LayoutState::Computing;
                engine.query_content_region(&self.settings.anchors);
                return LayoutOutcome::Requeried;
            }
            LayoutState::Computing => self.state = LayoutState::Idle,
        }

        let measured = match result {
            Ok(rect) => rect,
            Err(err) => {
                debug!("content region query failed: {}", err);
                None
            }
        };
        let rect = measured.unwrap_or_else(|| {
            Rect::below_chrome(engine.window_size(), self.settings.top_offset)
        });

        if !rect.is_visible() {
            return LayoutOutcome::Degenerate;
        }
        self.last_region = Some(rect);
        if self.last_applied == Some(rect) {
            return LayoutOutcome::Unchanged;
        }
        self.apply(rect, registry, engine)
    }

    fn apply(
        &mut self,
        rect: Rect,
        registry: &ViewRegistry,
        engine: &mut dyn ContentEngine,
    ) -> LayoutOutcome {
        // The tab may have been closed while the query was in flight.
        let Some(surface) = registry.active_surface() else {
            return LayoutOutcome::NoActiveSurface;
        };
        match engine.set_bounds(surface, rect) {
            Ok(()) => {
                self.last_applied = Some(rect);
                LayoutOutcome::Applied(rect)
            }
            Err(err) => {
                warn!("failed to position surface {}: {}", surface, err);
                LayoutOutcome::NoActiveSurface
            }
        }
    }
}
