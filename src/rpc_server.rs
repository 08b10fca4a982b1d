//! Xiavion RPC server: the command surface over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"createTab", "params":{"id":"t1","url":"gx://speed"}}
//! Response: {"id":1, "result":{"success":true,...}}
//! Push:     {"event":"urlUpdated", "data":{"id":"t1","url":"gx://speed"}}
//!
//! Backed by the headless engine, so it runs anywhere and is what chrome
//! front-ends are developed and tested against.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serde_json::{json, Value};

use xiavion::app::App;
use xiavion::engine::HeadlessEngine;
use xiavion::rpc_handler::{handle_method, lock_app};
use xiavion::services::resource_sampler::{ResourceMonitor, ResourceSampler, SystemMetrics};
use xiavion::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use xiavion::types::geometry::Size;
use xiavion::types::resources::ResourceSnapshot;

/// How often the loop wakes up without input to run housekeeping.
const IDLE_TICK: Duration = Duration::from_millis(250);

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

enum Input {
    Line(String),
    Snapshot(ResourceSnapshot),
    Closed,
}

fn emit(out: &mut impl Write, value: &Value) {
    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
        error!("stdout closed");
    }
}

fn flush_push_events(app: &Mutex<App>, out: &mut impl Write) {
    let events = {
        let mut a = lock_app(app);
        a.pump();
        a.tick();
        a.drain_events()
    };
    for event in events {
        match serde_json::to_value(&event) {
            Ok(v) => emit(out, &v),
            Err(e) => warn!("failed to serialize {}: {}", event.name(), e),
        }
    }
}

fn handle_line(app: &Mutex<App>, line: &str, limiter: &mut RateLimiter) -> Value {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({"id": null, "error": format!("parse error: {}", e)}),
    };
    let id = req.get("id").cloned().unwrap_or(Value::Null);

    if !limiter.check() {
        return json!({"id": id, "error": "rate limit exceeded"});
    }

    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));
    json!({"id": id, "result": handle_method(app, method, &params)})
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut settings_engine = SettingsEngine::new(std::env::var("XIAVION_SETTINGS").ok());
    if let Err(e) = settings_engine.load() {
        warn!("settings not loaded, using defaults: {}", e);
    }
    let settings = settings_engine.get_settings().clone();

    let window = Size::new(settings.window.width, settings.window.height);
    let app = Mutex::new(App::new(Box::new(HeadlessEngine::new(window)), settings_engine));

    let (tx, rx) = mpsc::channel::<Input>();

    let stdin_tx = tx.clone();
    let reader = std::thread::Builder::new()
        .name("rpc-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(l) => {
                        if stdin_tx.send(Input::Line(l)).is_err() {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(Input::Closed);
        });
    if let Err(e) = reader {
        error!("failed to start stdin reader: {}", e);
        return;
    }

    let monitor = ResourceMonitor::new();
    let sampler = ResourceSampler::new(Box::new(SystemMetrics::new()), &settings.resources);
    let sample_tx = tx;
    if let Err(e) = monitor.start(
        sampler,
        Duration::from_millis(settings.resources.sample_interval_ms),
        move |snapshot| {
            let _ = sample_tx.send(Input::Snapshot(snapshot));
        },
    ) {
        warn!("resource sampling disabled: {}", e);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Front-ends compare the session to notice a restarted server.
    let session = uuid::Uuid::new_v4();
    emit(
        &mut out,
        &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION"), "session": session}),
    );
    info!("xiavion-rpc ready, session {}", session);

    // Max 200 requests per second.
    let mut rate_limiter = RateLimiter::new(200);

    loop {
        match rx.recv_timeout(IDLE_TICK) {
            Ok(Input::Line(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let response = handle_line(&app, &line, &mut rate_limiter);
                emit(&mut out, &response);
            }
            Ok(Input::Snapshot(snapshot)) => {
                lock_app(&app).on_resource_snapshot(snapshot);
            }
            Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        flush_push_events(&app, &mut out);
    }

    monitor.stop();
    lock_app(&app).shutdown();
}
