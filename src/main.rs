//! Xiavion, a desktop browser shell hosting multiple web views.
//!
//! With the `gui` feature this opens the wry/tao window. Without it, runs a
//! console demo of the coordinator against the headless engine.

#[cfg(feature = "gui")]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = xiavion::ui::webview_app::run() {
        log::error!("xiavion failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!();
    println!("Xiavion v{} (demo mode, headless engine)", env!("CARGO_PKG_VERSION"));
    println!("Build with `--features gui` for the windowed shell.");
    println!();

    let mut app = demo::app();
    demo::tabs(&mut app);
    demo::layout(&mut app);
    demo::resources(&mut app);
    app.shutdown();
}

#[cfg(not(feature = "gui"))]
mod demo {
    use std::time::Duration;

    use xiavion::app::App;
    use xiavion::engine::HeadlessEngine;
    use xiavion::services::resource_sampler::{ResourceSampler, SystemMetrics};
    use xiavion::services::settings_engine::SettingsEngine;
    use xiavion::types::geometry::Rect;
    use xiavion::types::resources::ResourceLimitsPatch;

    fn section(name: &str) {
        println!("---------------------------------------------------------------");
        println!("  {}", name);
        println!("---------------------------------------------------------------");
    }

    fn print_events(app: &mut App) {
        app.pump();
        for event in app.drain_events() {
            let line = serde_json::to_string(&event).unwrap_or_default();
            println!("  -> {}", line);
        }
    }

    pub fn app() -> App {
        let engine = HeadlessEngine::default();
        engine.probe().set_content_region(Some(Rect::new(0, 80, 1200, 720)));
        let demo_settings = std::env::temp_dir().join("xiavion-demo-settings.json");
        let settings = SettingsEngine::new(Some(demo_settings.to_string_lossy().to_string()));
        App::new(Box::new(engine), settings)
    }

    pub fn tabs(app: &mut App) {
        section("Tabs");
        for (id, url) in [("t1", "gx://speed"), ("t2", "example.com"), ("t3", "badscheme://nope")] {
            match app.create_tab(id, url) {
                Ok(()) => println!("  created {} -> {}", id, url),
                Err(e) => println!("  create {} failed: {}", id, e),
            }
            print_events(app);
        }
        if let Err(e) = app.go_back("t2") {
            println!("  goBack t2: {}", e);
        }
        println!("  closing t3");
        let _ = app.close_tab("t3");
        println!("  active tab: {:?}", app.active_id());
        println!();
    }

    pub fn layout(app: &mut App) {
        section("Layout");
        let _ = app.show_tab("t1");
        for _ in 0..5 {
            app.content_bounds_updated();
        }
        print_events(app);
        println!("  applied region: {:?}", app.layout.last_applied());
        println!();
    }

    pub fn resources(app: &mut App) {
        section("Resources");
        let limits = app.update_resource_limits(&ResourceLimitsPatch {
            cpu_limit: Some(50.0),
            ram_limit: Some(20.0),
            is_limiter_enabled: Some(true),
            ..Default::default()
        });
        println!("  limits: {:?}", limits);

        let mut sampler = ResourceSampler::new(Box::new(SystemMetrics::new()), &app.settings().resources);
        for _ in 0..2 {
            let snapshot = sampler.sample();
            app.on_resource_snapshot(snapshot);
            std::thread::sleep(Duration::from_millis(500));
        }
        print_events(app);
        println!();
    }
}
