//! Events flowing between the engine, the coordinator and the chrome.

use serde::{Deserialize, Serialize};

use crate::engine::SurfaceId;
use crate::types::geometry::{Rect, Size};

/// Navigation sub-events an engine reports for one navigation.
///
/// Engines fire several of these per page load; they are all funneled
/// through the same de-duplicating URL publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEvent {
    Started,
    Committed,
    InPageNavigated,
    Redirected,
    FrameNavigated,
    StoppedLoading,
    FinishedLoading,
}

impl NavEvent {
    /// Whether the surface's back/forward state may have changed.
    pub fn affects_history(self) -> bool {
        matches!(
            self,
            NavEvent::Committed | NavEvent::InPageNavigated | NavEvent::FinishedLoading
        )
    }
}

/// Something that happened inside one content surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Navigation { kind: NavEvent, url: String },
    TitleChanged(String),
    /// The engine gave up on a navigation after it was accepted.
    LoadFailed { url: String, error: String },
    /// Result of a best-effort favicon query; `None` when nothing was found
    /// or the query failed.
    FaviconResolved(Option<String>),
    /// The page asked to open a new window.
    NewWindowRequested(String),
    /// A link in the page pointed at a reserved URL; the surface did not follow it.
    ReservedLinkFollowed(String),
}

/// Everything the engine hands back to the coordinator on an event-loop turn.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Surface {
        surface: SurfaceId,
        event: SurfaceEvent,
    },
    /// Result of a content-region query against the chrome layer.
    /// `Ok(None)` means none of the anchors resolved.
    ContentRegion(Result<Option<Rect>, String>),
    WindowResized(Size),
}

/// Events pushed from the coordinator to the chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PushEvent {
    PageTitleUpdated {
        id: String,
        title: String,
    },
    PageInfoUpdated {
        id: String,
        url: String,
        title: String,
        favicon: String,
    },
    UrlUpdated {
        id: String,
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    NavigationStateUpdated {
        id: String,
        can_go_back: bool,
        can_go_forward: bool,
    },
    SystemResourcesUpdated {
        cpu: u8,
        ram: u8,
        network: u8,
    },
}

impl PushEvent {
    /// The wire name of the event, e.g. `urlUpdated`.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::PageTitleUpdated { .. } => "pageTitleUpdated",
            PushEvent::PageInfoUpdated { .. } => "pageInfoUpdated",
            PushEvent::UrlUpdated { .. } => "urlUpdated",
            PushEvent::NavigationStateUpdated { .. } => "navigationStateUpdated",
            PushEvent::SystemResourcesUpdated { .. } => "systemResourcesUpdated",
        }
    }

    /// The tab this event concerns, if any.
    pub fn tab_id(&self) -> Option<&str> {
        match self {
            PushEvent::PageTitleUpdated { id, .. }
            | PushEvent::PageInfoUpdated { id, .. }
            | PushEvent::UrlUpdated { id, .. }
            | PushEvent::NavigationStateUpdated { id, .. } => Some(id),
            PushEvent::SystemResourcesUpdated { .. } => None,
        }
    }
}
