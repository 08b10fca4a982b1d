//! Command dispatch for the chrome's request/response surface.
//!
//! Shared by the GUI host (IPC messages) and the `xiavion-rpc` server so the
//! whole surface can be unit-tested against a headless engine. Every command
//! answers with a JSON object carrying `success`; failures never escape as
//! panics or transport errors.

use std::sync::{Mutex, MutexGuard};

use log::debug;
use serde_json::{json, Value};

use crate::app::App;
use crate::engine::WindowCommand;
use crate::types::errors::CommandError;
use crate::types::resources::ResourceLimitsPatch;

/// Lock the coordinator. A command that panicked mid-way leaves the state
/// usable, so a poisoned lock is recovered instead of failing every later call.
pub fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|e| e.into_inner())
}

fn str_param<'a>(params: &'a Value, key: &'static str) -> Result<&'a str, CommandError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or(CommandError::InvalidParams(key))
}

/// Accepts either a bare boolean or `{"enabled": bool}`.
fn enabled_param(params: &Value) -> Result<bool, CommandError> {
    params
        .as_bool()
        .or_else(|| params.get("enabled").and_then(|v| v.as_bool()))
        .ok_or(CommandError::InvalidParams("enabled"))
}

/// Dispatch one command. `Err` carries the reason the command failed.
pub fn dispatch(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, CommandError> {
    let mut a = lock_app(app);

    match method {
        // ─── Window ───
        "minimizeWindow" => {
            a.window_command(WindowCommand::Minimize);
            Ok(json!({"success": true}))
        }
        "maximizeWindow" => {
            a.window_command(WindowCommand::ToggleMaximize);
            Ok(json!({"success": true}))
        }
        "closeWindow" => {
            a.window_command(WindowCommand::Close);
            Ok(json!({"success": true}))
        }

        // ─── Tabs ───
        "createTab" => {
            let id = str_param(params, "id")?;
            let url = params.get("url").and_then(|v| v.as_str()).unwrap_or("");
            a.create_tab(id, url)?;
            Ok(json!({"success": true, "id": id}))
        }
        "closeTab" => {
            let id = str_param(params, "id")?;
            a.close_tab(id)?;
            Ok(json!({"success": true}))
        }
        "switchTab" => {
            let id = str_param(params, "id")?;
            a.show_tab(id)?;
            Ok(json!({"success": true}))
        }
        "loadUrl" => {
            let id = str_param(params, "id")?;
            let url = str_param(params, "url")?;
            let shown = a.load_url(id, url)?;
            Ok(json!({"success": true, "url": shown}))
        }
        "goBack" => {
            let id = str_param(params, "id")?;
            a.go_back(id)?;
            Ok(json!({"success": true}))
        }
        "goForward" => {
            let id = str_param(params, "id")?;
            a.go_forward(id)?;
            Ok(json!({"success": true}))
        }
        "refresh" => {
            let id = str_param(params, "id")?;
            a.refresh(id)?;
            Ok(json!({"success": true}))
        }
        "getTabs" => {
            let tabs = serde_json::to_value(a.tabs()).unwrap_or_else(|_| json!([]));
            Ok(json!({"success": true, "tabs": tabs, "activeId": a.active_id()}))
        }

        // ─── Layout ───
        "contentBoundsUpdated" => Ok(json!({"success": a.content_bounds_updated()})),

        // ─── Resources ───
        "updateResourceLimits" => {
            let patch: ResourceLimitsPatch = serde_json::from_value(params.clone())
                .map_err(|_| CommandError::InvalidParams("limits"))?;
            let limits = a.update_resource_limits(&patch);
            Ok(json!({"success": true, "limits": limits}))
        }
        "getResourceLimits" => Ok(json!({"success": true, "limits": a.resource_limits()})),

        // ─── Privacy ───
        "toggleAdBlocker" => {
            let enabled = a.set_ad_blocker(enabled_param(params)?);
            Ok(json!({"success": true, "enabled": enabled}))
        }
        "clearCache" => {
            a.clear_cache()?;
            Ok(json!({"success": true}))
        }
        "clearCookies" => {
            a.clear_cookies()?;
            Ok(json!({"success": true}))
        }

        // ─── Misc ───
        "getSettings" => Ok(json!({"success": true, "settings": a.settings()})),
        "ping" => Ok(json!({"success": true, "pong": true})),

        _ => Err(CommandError::UnknownMethod(method.to_string())),
    }
}

/// Dispatch a command and fold failures into `{"success": false, "error": ...}`.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Value {
    match dispatch(app, method, params) {
        Ok(value) => value,
        Err(err) => {
            debug!("{} failed: {}", method, err);
            json!({"success": false, "error": err.to_string()})
        }
    }
}
