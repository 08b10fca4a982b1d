//! Property-based tests for ShellSettings persistence.
//!
//! These tests verify that ShellSettings survive a JSON round-trip and a
//! save/load cycle through the SettingsEngine for arbitrary valid inputs.

use proptest::prelude::*;
use tempfile::TempDir;

use xiavion::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use xiavion::types::resources::ResourceLimits;
use xiavion::types::settings::{
    EventSettings, LayoutSettings, ResourceSettings, ShellSettings, WindowSettings,
};

// --- Arbitrary strategies for all settings sub-types ---

fn arb_window_settings() -> impl Strategy<Value = WindowSettings> {
    (
        400u32..4000,
        300u32..3000,
        200u32..1200,
        200u32..1000,
        any::<bool>(),
        "https?://[a-z]{3,12}(:[0-9]{2,4})?",
    )
        .prop_map(
            |(width, height, min_width, min_height, frameless, chrome_url)| WindowSettings {
                width,
                height,
                min_width,
                min_height,
                frameless,
                chrome_url,
            },
        )
}

fn arb_layout_settings() -> impl Strategy<Value = LayoutSettings> {
    (
        prop::collection::vec("[.#]?[a-z][a-z-]{0,15}", 0..5),
        0u32..200,
    )
        .prop_map(|(anchors, top_offset)| LayoutSettings { anchors, top_offset })
}

fn arb_event_settings() -> impl Strategy<Value = EventSettings> {
    (0u64..5_000, 100u64..60_000).prop_map(|(url_dedupe_window_ms, url_poll_interval_ms)| {
        EventSettings {
            url_dedupe_window_ms,
            url_poll_interval_ms,
        }
    })
}

fn arb_limits() -> impl Strategy<Value = ResourceLimits> {
    (0u8..=100, 0u8..=100, 0u8..=100, any::<bool>()).prop_map(
        |(cpu_limit, ram_limit, network_limit, is_limiter_enabled)| ResourceLimits {
            cpu_limit,
            ram_limit,
            network_limit,
            is_limiter_enabled,
        },
    )
}

fn arb_resource_settings() -> impl Strategy<Value = ResourceSettings> {
    (100u64..10_000, 1usize..20, 1u64..1_000_000_000, arb_limits()).prop_map(
        |(sample_interval_ms, cpu_average_window, bandwidth_ceiling_bytes_per_sec, initial_limits)| {
            ResourceSettings {
                sample_interval_ms,
                cpu_average_window,
                bandwidth_ceiling_bytes_per_sec,
                initial_limits,
            }
        },
    )
}

fn arb_shell_settings() -> impl Strategy<Value = ShellSettings> {
    (
        arb_window_settings(),
        arb_layout_settings(),
        arb_event_settings(),
        arb_resource_settings(),
    )
        .prop_map(|(window, layout, events, resources)| ShellSettings {
            window,
            layout,
            events,
            resources,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_json_roundtrip(settings in arb_shell_settings()) {
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let back: ShellSettings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn settings_survive_save_and_load(settings in arb_shell_settings()) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json").to_string_lossy().to_string();

        let mut writer = SettingsEngine::new(Some(path.clone()));
        for (key, value) in [
            ("window", serde_json::to_value(&settings.window).unwrap()),
            ("layout", serde_json::to_value(&settings.layout).unwrap()),
            ("events", serde_json::to_value(&settings.events).unwrap()),
            ("resources", serde_json::to_value(&settings.resources).unwrap()),
        ] {
            writer.set_value(key, value).unwrap();
        }
        prop_assert_eq!(writer.get_settings(), &settings);

        let mut reader = SettingsEngine::new(Some(path));
        let loaded = reader.load().unwrap();
        prop_assert_eq!(loaded, settings);
    }
}
