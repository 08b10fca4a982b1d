//! The seam between the coordinator and the embedded browser engine.
//!
//! Everything the shell needs from the engine goes through [`ContentEngine`]:
//! surface lifecycle, navigation, geometry, the process-wide cache and
//! throttling knobs, and asynchronous queries. Query results and engine
//! notifications are not delivered through callbacks into the coordinator;
//! the engine queues them as [`EngineEvent`]s and the host drains them with
//! [`ContentEngine::poll_events`] on each event-loop turn.

use url::Url;

use crate::types::errors::EngineError;
use crate::types::events::EngineEvent;
use crate::types::geometry::{Rect, Size};

pub mod headless;

pub use headless::{HeadlessEngine, HeadlessProbe};

/// Schemes a content surface may navigate to.
const NAVIGABLE_SCHEMES: &[&str] = &["http", "https", "file", "data", "about"];

/// Reject URLs no content surface can load, with engine-style error codes.
pub fn check_navigable(url: &str) -> Result<(), EngineError> {
    let parsed = Url::parse(url).map_err(|_| EngineError::Navigation("ERR_INVALID_URL".into()))?;
    if !NAVIGABLE_SCHEMES.contains(&parsed.scheme()) {
        return Err(EngineError::Navigation("ERR_UNKNOWN_URL_SCHEME".into()));
    }
    Ok(())
}

/// Engine-assigned handle for one content surface.
pub type SurfaceId = u64;

/// Window-level commands issued by the chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    Minimize,
    /// Maximize, or restore when already maximized.
    ToggleMaximize,
    Close,
}

/// Operations the shell needs from the engine it embeds.
pub trait ContentEngine {
    /// Create a hidden surface attached to the host window.
    fn create_surface(&mut self) -> Result<SurfaceId, EngineError>;
    /// Detach the surface from the window and release its resources.
    fn destroy_surface(&mut self, surface: SurfaceId);
    fn set_bounds(&mut self, surface: SurfaceId, bounds: Rect) -> Result<(), EngineError>;

    /// Start a network navigation. An `Err` is an immediate rejection; later
    /// failures arrive as `SurfaceEvent::LoadFailed`.
    fn load_url(&mut self, surface: SurfaceId, url: &str) -> Result<(), EngineError>;
    /// Render locally synthesized HTML without touching the network.
    fn load_html(&mut self, surface: SurfaceId, html: &str) -> Result<(), EngineError>;
    fn go_back(&mut self, surface: SurfaceId) -> Result<(), EngineError>;
    fn go_forward(&mut self, surface: SurfaceId) -> Result<(), EngineError>;
    fn reload(&mut self, surface: SurfaceId) -> Result<(), EngineError>;
    fn can_go_back(&self, surface: SurfaceId) -> bool;
    fn can_go_forward(&self, surface: SurfaceId) -> bool;
    fn current_url(&self, surface: SurfaceId) -> Option<String>;
    fn title(&self, surface: SurfaceId) -> Option<String>;

    /// Ask the surface for its icon link; answered with `SurfaceEvent::FaviconResolved`.
    fn query_favicon(&mut self, surface: SurfaceId);
    /// Ask the chrome for the bounding rect of the first resolvable anchor;
    /// answered with `EngineEvent::ContentRegion`.
    fn query_content_region(&mut self, anchors: &[String]);
    fn window_size(&self) -> Size;
    fn window_command(&mut self, command: WindowCommand);
    /// Hand a URL to the operating system (mail client, dialer, ...).
    fn open_external(&mut self, url: &str);

    fn set_background_throttling(&mut self, surface: SurfaceId, enabled: bool);
    fn set_cache_size(&mut self, bytes: u64);
    fn clear_cache(&mut self) -> Result<(), EngineError>;
    fn clear_cookies(&mut self) -> Result<(), EngineError>;

    /// Drain notifications queued since the last call.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
}
