//! Package search API library.
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]

pub mod config;
/// HTTP handlers for the single-query and batch search forms.
pub mod handlers;
pub mod models;
pub mod params;
pub mod router;
/// Query translation, execution and result shaping.
pub mod search;
