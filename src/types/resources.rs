use serde::{Deserialize, Serialize};

/// User-configured resource limits, all percentages in 0–100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    pub cpu_limit: u8,
    pub ram_limit: u8,
    pub network_limit: u8,
    pub is_limiter_enabled: bool,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_limit: 100,
            ram_limit: 100,
            network_limit: 100,
            is_limiter_enabled: false,
        }
    }
}

/// A partial update to [`ResourceLimits`]; absent fields keep their value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimitsPatch {
    #[serde(default)]
    pub cpu_limit: Option<f64>,
    #[serde(default)]
    pub ram_limit: Option<f64>,
    #[serde(default)]
    pub network_limit: Option<f64>,
    #[serde(default)]
    pub is_limiter_enabled: Option<bool>,
}

impl ResourceLimits {
    /// Merge a partial update. Percentages are clamped into 0–100.
    pub fn merge(&mut self, patch: &ResourceLimitsPatch) {
        if let Some(v) = patch.cpu_limit {
            self.cpu_limit = clamp_percent(v);
        }
        if let Some(v) = patch.ram_limit {
            self.ram_limit = clamp_percent(v);
        }
        if let Some(v) = patch.network_limit {
            self.network_limit = clamp_percent(v);
        }
        if let Some(v) = patch.is_limiter_enabled {
            self.is_limiter_enabled = v;
        }
    }

    pub fn merged(mut self, patch: &ResourceLimitsPatch) -> Self {
        self.merge(patch);
        self
    }
}

pub(crate) fn clamp_percent(v: f64) -> u8 {
    if v.is_nan() {
        return 100;
    }
    v.round().clamp(0.0, 100.0) as u8
}

/// One sampled reading of host utilization, in whole percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResourceSnapshot {
    pub cpu: u8,
    pub ram: u8,
    pub network: u8,
}
