//! Core domain types and utilities for the taskdesk client.
//!
//! This crate provides the foundational types shared by the session,
//! authorization and API crates: strongly-typed identifiers and the
//! rootcause-backed `Result` alias.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
