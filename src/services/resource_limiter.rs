//! Applies the user's resource limits to content surfaces.

use log::{debug, info};

use crate::engine::ContentEngine;
use crate::managers::view_registry::ViewRegistry;
use crate::types::resources::{ResourceLimits, ResourceLimitsPatch};

const CACHE_CEILING_MB: u64 = 500;
const CACHE_FLOOR_MB: u64 = 50;

/// Cache size in MB allowed for a RAM limit percentage.
pub fn cache_ceiling_mb(ram_limit: u8) -> u64 {
    let scaled = (CACHE_CEILING_MB as f64 * f64::from(ram_limit) / 100.0).round() as u64;
    scaled.max(CACHE_FLOOR_MB)
}

/// Sole owner of [`ResourceLimits`] and the only code that touches
/// background throttling or the cache size.
pub struct ResourceLimiter {
    limits: ResourceLimits,
    logged_network_limit: Option<u8>,
}

impl ResourceLimiter {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            logged_network_limit: None,
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }

    /// Merge a partial update and apply the result.
    pub fn update(
        &mut self,
        patch: &ResourceLimitsPatch,
        registry: &ViewRegistry,
        engine: &mut dyn ContentEngine,
    ) -> ResourceLimits {
        self.limits.merge(patch);
        debug!("resource limits now {:?}", self.limits);
        self.apply(registry, engine);
        self.limits
    }

    /// Bring every surface in line with the current limits. Does nothing
    /// while the limiter is disabled.
    pub fn apply(&mut self, registry: &ViewRegistry, engine: &mut dyn ContentEngine) {
        if !self.limits.is_limiter_enabled {
            return;
        }

        if self.limits.cpu_limit < 100 {
            let active = registry.active_surface();
            for entry in registry.entries() {
                engine.set_background_throttling(entry.surface, Some(entry.surface) != active);
            }
        }

        if self.limits.ram_limit < 100 {
            engine.set_cache_size(cache_ceiling_mb(self.limits.ram_limit) * 1024 * 1024);
        }

        // There is no engine knob for bandwidth; the value is kept for the chrome.
        if self.limits.network_limit < 100 && self.logged_network_limit != Some(self.limits.network_limit) {
            info!(
                "network limit {}% recorded; bandwidth is not throttled",
                self.limits.network_limit
            );
            self.logged_network_limit = Some(self.limits.network_limit);
        }
    }
}

impl Default for ResourceLimiter {
    fn default() -> Self {
        Self::new(ResourceLimits::default())
    }
}
