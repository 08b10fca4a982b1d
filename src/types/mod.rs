// Xiavion shared type definitions
// Each submodule defines types used across the application.

pub mod errors;
pub mod events;
pub mod geometry;
pub mod resources;
pub mod settings;
pub mod tab;
pub mod url;
