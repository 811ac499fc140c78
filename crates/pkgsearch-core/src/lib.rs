//! Core domain types for the package search index.
//!
//! Everything in this crate is pure: packages go in, search documents and
//! ranking values come out. Talking to the database or the search engine is
//! the job of the indexer and API crates.
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]

pub mod document;
pub mod query;
pub mod signals;
pub mod tags;
pub mod text;
pub mod types;
