use thiserror::Error;

// === TabError ===

/// Errors related to tab lifecycle operations.
///
/// Messages are shown to the chrome verbatim, so they stay short and stable.
#[derive(Debug, Error)]
pub enum TabError {
    /// No surface is registered for the given tab ID.
    #[error("tab not found")]
    NotFound(String),
    /// The tab ID supplied by the chrome is empty or otherwise unusable.
    #[error("invalid tab id: {0:?}")]
    InvalidId(String),
    /// Back/forward was requested but the surface history does not allow it.
    #[error("cannot navigate")]
    CannotNavigate(String),
    /// The engine refused an operation on the surface.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl TabError {
    /// The tab ID the error refers to, when there is one.
    pub fn tab_id(&self) -> Option<&str> {
        match self {
            TabError::NotFound(id) | TabError::InvalidId(id) | TabError::CannotNavigate(id) => {
                Some(id)
            }
            TabError::Engine(_) => None,
        }
    }
}

// === EngineError ===

/// Errors reported by the embedded browser engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not create a new content surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreation(String),
    /// The surface handle is no longer known to the engine.
    #[error("unknown surface: {0}")]
    UnknownSurface(u64),
    /// A navigation was rejected (DNS, TLS, unsupported scheme, ...).
    #[error("{0}")]
    Navigation(String),
    /// A script evaluation or DOM query failed.
    #[error("script evaluation failed: {0}")]
    Script(String),
    /// Any other engine failure.
    #[error("engine error: {0}")]
    Other(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === CommandError ===

/// Errors raised while dispatching a chrome command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command name is not part of the command surface.
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    /// A required parameter is absent or has the wrong type.
    #[error("missing or invalid parameter: {0}")]
    InvalidParams(&'static str),
    #[error(transparent)]
    Tab(#[from] TabError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
