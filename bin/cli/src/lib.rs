//! `taskdesk`: terminal client for the taskdesk project and task manager.
//!
//! Each command restores the persisted session, runs the requested action
//! through the auth context, and renders what the route tree lets the
//! session see.

pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod intent_store;
pub mod notifier;
pub mod pages;

pub use app::{App, route_tree};
pub use config::CliConfig;
pub use error::CliError;
