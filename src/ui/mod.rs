/// UI module exports
pub mod components;
pub mod share_panel;

pub use share_panel::ShareApp;
