use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_CONFIG_HOME/xiavion`, falling back to `~/.config/xiavion`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("xiavion"),
        _ => home_dir().join(".config").join("xiavion"),
    }
}

/// `$XDG_DATA_HOME/xiavion`, falling back to `~/.local/share/xiavion`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("xiavion"),
        _ => home_dir().join(".local").join("share").join("xiavion"),
    }
}
