//! Client for the Solr core backing package search.
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod escape;
pub mod select;
pub mod update;
