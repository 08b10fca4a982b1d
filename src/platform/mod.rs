//! Per-OS locations for settings and webview profile data.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/xiavion` or `~/.config/xiavion`
/// - **macOS**: `~/Library/Application Support/Xiavion`
/// - **Windows**: `%APPDATA%/Xiavion`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Directory the engine keeps its profile in (cookies, HTTP cache, storage).
///
/// - **Linux**: `$XDG_DATA_HOME/xiavion` or `~/.local/share/xiavion`
/// - **macOS**: `~/Library/Application Support/Xiavion/WebData`
/// - **Windows**: `%LOCALAPPDATA%/Xiavion`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
