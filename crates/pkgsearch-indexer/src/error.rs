//! Error types for an indexing run.

use pkgsearch_core::document::DocumentError;
use pkgsearch_solr::error::EngineError;
use thiserror::Error;

use crate::lock::LockError;
use crate::signals::SignalError;
use crate::store::StoreError;

/// Errors raised while indexing.
///
/// Only some of these end a run: per-package and per-batch failures are
/// logged and skipped by the runner.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The requested package does not exist.
    #[error("package {0} not found")]
    PackageNotFound(String),
    /// Relational store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Search engine failure.
    #[error("search engine: {0}")]
    Engine(#[from] EngineError),
    /// Signal source failure.
    #[error(transparent)]
    Signals(#[from] SignalError),
    /// Run lock failure.
    #[error("run lock: {0}")]
    Lock(#[from] LockError),
    /// A document could not be built.
    #[error(transparent)]
    Document(#[from] DocumentError),
}
