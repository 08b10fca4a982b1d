//! Xiavion: a desktop browser shell that hosts many embedded web views
//! behind a chrome command surface.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod engine;
pub mod managers;
pub mod platform;
pub mod services;
pub mod rpc_handler;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
