// Xiavion Settings Engine
// Shell settings live in one pretty-printed JSON file; sections missing from
// the file fall back to their defaults.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::{Map, Value};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::ShellSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ShellSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ShellSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

pub struct SettingsEngine {
    config_path: String,
    settings: ShellSettings,
}

impl SettingsEngine {
    /// `path_override` replaces `<config dir>/settings.json`. Starts from
    /// defaults; nothing is read until [`SettingsEngineTrait::load`].
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .into_owned()
        });
        Self {
            config_path,
            settings: ShellSettings::default(),
        }
    }

    fn to_tree(&self) -> Result<Value, SettingsError> {
        serde_json::to_value(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))
    }
}

/// Walk `tree` along the dotted `key` and return the object holding its last segment.
fn parent_object<'a, 'k>(
    tree: &'a mut Value,
    key: &'k str,
) -> Result<(&'a mut Map<String, Value>, &'k str), SettingsError> {
    let unknown = || SettingsError::InvalidKey(key.to_string());
    let mut segments: Vec<&str> = key.split('.').collect();
    let leaf = segments.pop().filter(|s| !s.is_empty()).ok_or_else(unknown)?;

    let mut node = tree;
    for segment in segments {
        node = node.get_mut(segment).ok_or_else(unknown)?;
    }
    match node {
        Value::Object(map) if map.contains_key(leaf) => Ok((map, leaf)),
        _ => Err(unknown()),
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Read the file, or fall back to defaults when there is none.
    fn load(&mut self) -> Result<ShellSettings, SettingsError> {
        let path = Path::new(&self.config_path);
        self.settings = if path.is_file() {
            let raw = fs::read_to_string(path)
                .map_err(|e| SettingsError::IoError(format!("{}: {}", self.config_path, e)))?;
            serde_json::from_str(&raw)
                .map_err(|e| SettingsError::SerializationError(format!("{}: {}", self.config_path, e)))?
        } else {
            debug!("{} absent, using defaults", self.config_path);
            ShellSettings::default()
        };
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| SettingsError::IoError(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        fs::write(path, json).map_err(|e| SettingsError::IoError(e.to_string()))
    }

    fn get_settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Replace one value by dotted path (`layout.top_offset`,
    /// `resources.initial_limits.cpu_limit`, or a whole section like
    /// `window`) and persist. A value of the wrong shape leaves the current
    /// settings untouched.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut tree = self.to_tree()?;
        let (map, leaf) = parent_object(&mut tree, key)?;
        map.insert(leaf.to_string(), value);

        self.settings = serde_json::from_value(tree)
            .map_err(|e| SettingsError::InvalidValue(format!("{}: {}", key, e)))?;
        info!("setting {} updated", key);
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = ShellSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
