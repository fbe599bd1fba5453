//! Countries - image loading pipeline and local store for a countries browser.
//!
//! This crate resolves images through a memory cache backed by a web
//! repository that converts vector images on the fly, and keeps countries in
//! a readiness-gated local database.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and reactive plumbing.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "countries";
