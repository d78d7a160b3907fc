#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Crust
//!
//! Request authorization policy for axum services. Every request is either
//! permitted anonymously or must be authenticated, depending on an ordered
//! set of path rules built once at startup.
//!
//! ## Modes
//!
//! - **stateless** (default): each request carries `Authorization: Bearer <token>`,
//!   verified per request. Logout answers `200 OK`.
//! - **session**: identity lives in a server-side session keyed by a cookie.
//!   Basic credentials establish a new session; unauthenticated requests are
//!   redirected to the login page.
//!
//! ## Configuration
//!
//! ```yaml
//! stateless: true
//! login_url: /login
//! logout_url: /logout
//! permit_urls: ["/public/**"]
//! addition_permit_urls: []
//! allow_static_urls: ["/static/**"]
//! refresh_token_name: Authorization
//! cors_enabled: true
//! ```
//!
//! ## Wiring
//!
//! ```ignore
//! let crust = Crust::builder(CrustConfig::load(Some(path))?)
//!     .verifier(verifier)
//!     .routes(&table)
//!     .build()?;
//! let app = crust.apply(table.into_router());
//! ```

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod failure;
pub mod logout;
pub mod module;
pub mod pattern;
pub mod policy;
pub mod request_data;
pub mod routes;
pub mod rules;
pub mod session;
pub mod verifier;

pub use config::CrustConfig;
pub use cors::CorsPolicy;
pub use error::CrustError;
pub use failure::{AuthFailureHandler, FailureContext, StatusFailureHandler};
pub use logout::{ContextInvalidator, NoopInvalidator};
pub use module::{Crust, CrustBuilder};
pub use pattern::PathPattern;
pub use policy::{AuthorizationPolicy, Decision, Mode, RequestDescriptor, resolve};
pub use request_data::request_data;
pub use routes::{RouteRegistry, RouteSpec, RouteTable};
pub use rules::{PermitRule, RuleContributor, RuleSet, RuleSetBuilder, RuleSource};
pub use session::{SessionCookie, SessionStore, SessionStoreError, new_session_id};
pub use verifier::{Credential, CredentialVerifier, VerifyError};

pub use crust_security::SecurityContext;
