use std::collections::HashMap;

use crate::engine::SurfaceId;
use crate::managers::page_trail::PageTrail;
use crate::types::tab::Tab;
use crate::types::url::ResolvedUrl;

/// One registered content surface and the tab state mirrored from it.
#[derive(Debug, Clone)]
pub struct ViewEntry {
    pub surface: SurfaceId,
    pub tab: Tab,
    /// Set while the surface shows synthesized content for a reserved URL.
    pub internal: Option<ResolvedUrl>,
    /// What each of the surface's history entries showed.
    pub trail: PageTrail,
    /// The surface has finished at least one load; URL polling starts after this.
    pub loaded_once: bool,
}

/// Maps tab IDs to content surfaces and tracks which one is visible.
///
/// The only owner of the tab -> surface mapping. A reverse index lets
/// engine events, which only carry a surface handle, find their tab.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    entries: HashMap<String, ViewEntry>,
    by_surface: HashMap<SurfaceId, String>,
    order: Vec<String>,
    active: Option<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, surface: SurfaceId, url: &str) {
        let entry = ViewEntry {
            surface,
            tab: Tab::new(id, url),
            internal: None,
            trail: PageTrail::new(),
            loaded_once: false,
        };
        if let Some(old) = self.entries.insert(id.to_string(), entry) {
            self.by_surface.remove(&old.surface);
        } else {
            self.order.push(id.to_string());
        }
        self.by_surface.insert(surface, id.to_string());
    }

    /// Remove a tab; clears the active pointer if it pointed at it.
    pub fn remove(&mut self, id: &str) -> Option<ViewEntry> {
        let entry = self.entries.remove(id)?;
        self.by_surface.remove(&entry.surface);
        self.order.retain(|o| o != id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        Some(entry)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ViewEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ViewEntry> {
        self.entries.get_mut(id)
    }

    pub fn surface_of(&self, id: &str) -> Option<SurfaceId> {
        self.entries.get(id).map(|e| e.surface)
    }

    pub fn tab_for_surface(&self, surface: SurfaceId) -> Option<&str> {
        self.by_surface.get(&surface).map(String::as_str)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_surface(&self) -> Option<SurfaceId> {
        self.active.as_deref().and_then(|id| self.surface_of(id))
    }

    /// Point the active marker at `id`. Returns false for unknown IDs.
    pub fn set_active(&mut self, id: &str) -> bool {
        if !self.entries.contains_key(id) {
            return false;
        }
        self.active = Some(id.to_string());
        true
    }

    /// Tab IDs in creation order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn entries(&self) -> impl Iterator<Item = &ViewEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
