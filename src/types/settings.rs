use serde::{Deserialize, Serialize};

use super::resources::ResourceLimits;

/// Top-level shell settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ShellSettings {
    pub window: WindowSettings,
    pub layout: LayoutSettings,
    pub events: EventSettings,
    pub resources: ResourceSettings,
}

/// Host window settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    /// Draw the window without OS decorations; the chrome renders its own controls.
    pub frameless: bool,
    /// Where the chrome UI is served from.
    pub chrome_url: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            min_width: 800,
            min_height: 600,
            frameless: true,
            chrome_url: "http://localhost:3000".to_string(),
        }
    }
}

/// How the content region is located inside the chrome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// CSS selectors tried in order; the first one that resolves wins.
    pub anchors: Vec<String>,
    /// Height reserved for chrome when no anchor resolves.
    pub top_offset: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            anchors: vec![
                ".webpage-content".to_string(),
                "[data-content-area]".to_string(),
                "#content-area".to_string(),
                "main".to_string(),
            ],
            top_offset: 80,
        }
    }
}

/// Event bridge timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventSettings {
    pub url_dedupe_window_ms: u64,
    pub url_poll_interval_ms: u64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            url_dedupe_window_ms: 500,
            url_poll_interval_ms: 3000,
        }
    }
}

/// Resource sampling and limiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceSettings {
    pub sample_interval_ms: u64,
    /// Number of CPU readings in the moving average.
    pub cpu_average_window: usize,
    /// Bandwidth treated as 100% network utilization.
    pub bandwidth_ceiling_bytes_per_sec: u64,
    #[serde(with = "snake_case_limits")]
    pub initial_limits: ResourceLimits,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 2000,
            cpu_average_window: 5,
            bandwidth_ceiling_bytes_per_sec: 12_500_000,
            initial_limits: ResourceLimits::default(),
        }
    }
}

/// The settings file spells every key in snake_case, including the limits the
/// command surface exchanges in camelCase. camelCase keys are still read.
mod snake_case_limits {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::types::resources::ResourceLimits;

    #[derive(Serialize, Deserialize)]
    #[serde(default)]
    struct StoredLimits {
        #[serde(alias = "cpuLimit")]
        cpu_limit: u8,
        #[serde(alias = "ramLimit")]
        ram_limit: u8,
        #[serde(alias = "networkLimit")]
        network_limit: u8,
        #[serde(alias = "isLimiterEnabled")]
        is_limiter_enabled: bool,
    }

    impl Default for StoredLimits {
        fn default() -> Self {
            ResourceLimits::default().into()
        }
    }

    impl From<ResourceLimits> for StoredLimits {
        fn from(l: ResourceLimits) -> Self {
            Self {
                cpu_limit: l.cpu_limit,
                ram_limit: l.ram_limit,
                network_limit: l.network_limit,
                is_limiter_enabled: l.is_limiter_enabled,
            }
        }
    }

    impl From<StoredLimits> for ResourceLimits {
        fn from(s: StoredLimits) -> Self {
            Self {
                cpu_limit: s.cpu_limit,
                ram_limit: s.ram_limit,
                network_limit: s.network_limit,
                is_limiter_enabled: s.is_limiter_enabled,
            }
        }
    }

    pub fn serialize<S: Serializer>(limits: &ResourceLimits, serializer: S) -> Result<S::Ok, S::Error> {
        StoredLimits::from(*limits).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResourceLimits, D::Error> {
        StoredLimits::deserialize(deserializer).map(ResourceLimits::from)
    }
}
