//! Package search indexer library.
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
/// Named run lock shared by every indexer process.
pub mod lock;
/// Batch driver: working set, document staging, commit, bookkeeping.
pub mod runner;
/// Download, favorite and trending figures per package.
pub mod signals;
/// Relational package store.
pub mod store;
