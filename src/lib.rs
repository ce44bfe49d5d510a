pub mod agents;
pub mod api;
pub mod app;
pub mod assist;
pub mod config;
pub mod editor;
pub mod error;
pub mod memory;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
