//! REST backend for taskdesk authentication.
//!
//! [`HttpAuthBackend`] implements the session core's `AuthBackend` over the
//! taskdesk REST API:
//!
//! - `POST /auth/login`, `POST /auth/register` return `{user, token}`
//! - `POST /auth/logout`, `GET /auth/verify` and `POST /auth/change-password`
//!   take the bearer token
//!
//! HTTP statuses are mapped onto `AuthError` variants; transport failures and
//! timeouts become `AuthError::Network`.

mod client;
mod config;
mod error;
mod wire;

pub use client::HttpAuthBackend;
pub use config::ApiConfig;
pub use error::ApiError;
pub use wire::Endpoint;
