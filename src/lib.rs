//! Tootles - media previews for a terminal Mastodon client.
//!
//! This crate provides the media subsystem of the client: format
//! classification, a two-tier byte cache, a bounded media loader, external
//! viewer dispatch and the widget that renders attachments in the terminal.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the media services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing caches, transports and configuration.
pub mod infrastructure;
/// Presentation layer containing widgets and terminal output.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "tootles";
