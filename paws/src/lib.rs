//! Paws Core - Rust business logic for the clipboard history panel
//!
//! This library implements the non-visual core of a desktop clipboard-history panel:
//! the entry store, the virtualized list view with its removal choreography, and the
//! per-row presenters the host paints from.
//!
//! Types are exported via UniFFI proc-macros (#[derive(uniffi::Record/Enum)]).

pub mod codec;
pub mod config;
mod connection;
pub mod interface;
pub mod list_view;
pub mod logging;
pub mod models;
mod panel;
pub mod presenter;
mod scheduler;
pub mod store;
pub mod thumbnail;
pub mod time_label;

pub use config::PanelConfig;
pub use interface::*;
pub use panel::ClipboardPanel;
pub use store::EntryStore;

uniffi::setup_scaffolding!("paws");
