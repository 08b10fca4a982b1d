use xiavion::types::errors::*;

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound("tab-123".to_string());
    assert_eq!(err.to_string(), "tab not found");
    assert_eq!(err.tab_id(), Some("tab-123"));
}

#[test]
fn tab_error_invalid_id_display() {
    let err = TabError::InvalidId(String::new());
    assert_eq!(err.to_string(), "invalid tab id: \"\"");
}

#[test]
fn tab_error_cannot_navigate_display() {
    let err = TabError::CannotNavigate("t1".to_string());
    assert_eq!(err.to_string(), "cannot navigate");
}

#[test]
fn tab_error_wraps_engine_error_transparently() {
    let err: TabError = EngineError::Navigation("ERR_NAME_NOT_RESOLVED".to_string()).into();
    assert_eq!(err.to_string(), "ERR_NAME_NOT_RESOLVED");
    assert_eq!(err.tab_id(), None);
}

#[test]
fn tab_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TabError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}

// === EngineError Tests ===

#[test]
fn engine_error_display_variants() {
    assert_eq!(
        EngineError::SurfaceCreation("no display".to_string()).to_string(),
        "failed to create surface: no display"
    );
    assert_eq!(EngineError::UnknownSurface(7).to_string(), "unknown surface: 7");
    assert_eq!(
        EngineError::Script("timeout".to_string()).to_string(),
        "script evaluation failed: timeout"
    );
    assert_eq!(
        EngineError::Other("boom".to_string()).to_string(),
        "engine error: boom"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("disk full".to_string()).to_string(),
        "Settings I/O error: disk full"
    );
    assert_eq!(
        SettingsError::InvalidKey("a.b".to_string()).to_string(),
        "Invalid settings key: a.b"
    );
}

// === CommandError Tests ===

#[test]
fn command_error_display_variants() {
    assert_eq!(
        CommandError::UnknownMethod("fly".to_string()).to_string(),
        "unknown method: fly"
    );
    assert_eq!(
        CommandError::InvalidParams("id").to_string(),
        "missing or invalid parameter: id"
    );
}

#[test]
fn command_error_from_tab_error_keeps_message() {
    let err: CommandError = TabError::NotFound("x".to_string()).into();
    assert_eq!(err.to_string(), "tab not found");
}
