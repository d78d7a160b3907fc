#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Token Plugin
//!
//! A [`crust::CredentialVerifier`] with static credential-to-identity mapping
//! for development and testing.
//!
//! Secrets are plain text and compared as plain strings. Not for production use.
//!
//! ## Modes
//!
//! - **`accept_all`** (default): accepts any non-empty bearer token or Basic
//!   login and returns the configured default identity.
//! - **`static_credentials`**: maps specific tokens and accounts to specific
//!   identities. Useful for E2E tests with distinct users.
//!
//! ## Configuration
//!
//! ```yaml
//! verifier:
//!   mode: static_credentials
//!   tokens:
//!     - token: "token-user-a"
//!       identity:
//!         subject_id: "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"
//!         authorities: ["ROLE_USER"]
//!   accounts:
//!     - principal: admin
//!       secret: password123
//!       identity:
//!         authorities: ["ROLE_ADMIN"]
//! ```

pub mod config;
pub mod service;
mod verifier;

pub use config::StaticTokenPluginConfig;
pub use service::Service;
