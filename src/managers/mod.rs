// Xiavion state managers
// Managers own the coordinator's mutable state: tabs and their surfaces, and the content-region layout.

pub mod layout_manager;
pub mod page_trail;
pub mod tab_manager;
pub mod view_registry;
