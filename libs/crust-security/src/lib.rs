#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Security context carried through the request lifecycle.
//!
//! The authorization middleware always inserts a [`SecurityContext`] into the
//! request extensions: an authenticated one when a credential or session was
//! accepted, an anonymous one for permitted requests.

pub mod context;

pub use context::{SecurityContext, SecurityContextBuilder};
