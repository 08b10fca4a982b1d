// Xiavion services
// Services react to and feed the managers: event bridging, internal pages, resource sampling and limiting, settings.

pub mod event_bridge;
pub mod internal_pages;
pub mod resource_limiter;
pub mod resource_sampler;
pub mod settings_engine;
