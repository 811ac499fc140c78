//! Indexing run: lock, pick the working set, then build, commit and record
//! one batch at a time.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use pkgsearch_core::document::{self, SearchDocument};
use pkgsearch_core::types::{DocumentId, Package};
use pkgsearch_solr::client::SearchEngine;
use pkgsearch_solr::update::UpdateBatch;

use crate::config::IndexerConfig;
use crate::error::IndexError;
use crate::lock::Locker;
use crate::signals::RankingSignals;
use crate::store::PackageStore;

/// Number of packages loaded, committed and marked per batch.
pub const BATCH_SIZE: usize = 50;

/// Which packages a run should index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One package, by full name.
    Package(String),
    /// Every package; `clear_index` also wipes the index first.
    All {
        /// Delete every document before the first batch.
        clear_index: bool,
    },
    /// Packages never indexed or changed since they were.
    Stale,
}

impl Selection {
    /// Map command-line flags to a selection. A package name wins over
    /// `--force`/`--all`; only `--force` clears the index.
    #[must_use]
    pub fn from_flags(package: Option<String>, force: bool, all: bool) -> Self {
        match package {
            Some(name) => Self::Package(name),
            None if force || all => Self::All { clear_index: force },
            None => Self::Stale,
        }
    }
}

/// Bounded retry with a fixed pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Settings for a run.
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Name of the run lock.
    pub lock_name: String,
    /// Marker file that makes the run a no-op while present.
    pub deploy_lock: PathBuf,
    /// Retry policy for recording `indexed_at`.
    pub mark_retry: RetryPolicy,
}

impl From<&IndexerConfig> for IndexerOptions {
    fn from(config: &IndexerConfig) -> Self {
        Self {
            lock_name: config.lock_name.clone(),
            deploy_lock: config.deploy_lock_path(),
            mark_retry: RetryPolicy::default(),
        }
    }
}

/// Why a run did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The deploy-freeze marker exists.
    DeployFreeze(PathBuf),
    /// Another run holds the lock.
    LockHeld,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeployFreeze(path) => write!(f, "{} present", path.display()),
            Self::LockHeld => f.write_str("another task is running already"),
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Size of the working set.
    pub total: usize,
    /// Packages whose document was committed.
    pub indexed: usize,
    /// Spam packages removed from the index.
    pub deleted: usize,
    /// Virtual package documents committed.
    pub virtual_documents: usize,
    /// Packages skipped because their document could not be built.
    pub failed_packages: usize,
    /// Batches that could not be loaded or committed.
    pub failed_batches: usize,
}

/// Result of [`Indexer::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was done.
    Skipped(SkipReason),
    /// The run went through every batch.
    Completed(RunReport),
}

/// What happened to one package while staging a batch.
#[derive(Debug)]
enum PackageOutcome {
    /// The package document and its virtual documents.
    Upsert {
        id: i64,
        documents: Vec<SearchDocument>,
    },
    /// Spam: remove the document.
    Delete(i64),
    /// Building failed; the package stays stale.
    Failed { name: String, error: IndexError },
}

/// A batch ready for commit.
#[derive(Debug, Default)]
struct StagedBatch {
    update: UpdateBatch,
    processed: Vec<i64>,
    indexed: usize,
    deleted: usize,
    virtual_documents: usize,
    failed: usize,
}

impl StagedBatch {
    fn from_outcomes(outcomes: Vec<PackageOutcome>) -> Self {
        let mut staged = Self::default();
        for outcome in outcomes {
            match outcome {
                PackageOutcome::Upsert { id, documents } => {
                    staged.virtual_documents += documents.len().saturating_sub(1);
                    for doc in documents {
                        staged.update.add(doc);
                    }
                    staged.processed.push(id);
                    staged.indexed += 1;
                }
                PackageOutcome::Delete(id) => {
                    staged.update.delete_id(DocumentId::Package(id));
                    staged.processed.push(id);
                    staged.deleted += 1;
                }
                PackageOutcome::Failed { name, error } => {
                    error!("{error}, skipping package {name}");
                    staged.failed += 1;
                }
            }
        }
        staged.update.commit();
        staged
    }
}

/// Batch indexing driver.
pub struct Indexer {
    store: Arc<dyn PackageStore>,
    engine: Arc<dyn SearchEngine>,
    signals: Arc<dyn RankingSignals>,
    locker: Arc<dyn Locker>,
    options: IndexerOptions,
}

impl Indexer {
    /// Assemble an indexer from its collaborators.
    pub fn new(
        store: Arc<dyn PackageStore>,
        engine: Arc<dyn SearchEngine>,
        signals: Arc<dyn RankingSignals>,
        locker: Arc<dyn Locker>,
        options: IndexerOptions,
    ) -> Self {
        Self {
            store,
            engine,
            signals,
            locker,
            options,
        }
    }

    /// Run one indexing pass over `selection`.
    ///
    /// Returns [`RunOutcome::Skipped`] without touching anything if the
    /// deploy-freeze marker exists or the lock is held elsewhere. The lock
    /// is released on every path once taken.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the lock service fails, the working set
    /// cannot be determined, the index cannot be cleared, or `indexed_at`
    /// cannot be recorded after all retries.
    pub async fn run(&self, selection: &Selection) -> Result<RunOutcome, IndexError> {
        if self.options.deploy_lock.exists() {
            let reason = SkipReason::DeployFreeze(self.options.deploy_lock.clone());
            info!("aborting, {reason}");
            return Ok(RunOutcome::Skipped(reason));
        }

        if !self.locker.try_lock(&self.options.lock_name).await? {
            info!("aborting, {}", SkipReason::LockHeld);
            return Ok(RunOutcome::Skipped(SkipReason::LockHeld));
        }

        let result = self.run_locked(selection).await;

        if let Err(e) = self.locker.unlock(&self.options.lock_name).await {
            error!("failed to release lock {}: {e}", self.options.lock_name);
        }

        result.map(RunOutcome::Completed)
    }

    async fn run_locked(&self, selection: &Selection) -> Result<RunReport, IndexError> {
        let ids = self.working_set(selection).await?;

        if matches!(selection, Selection::All { clear_index: true }) {
            info!("deleting existing index");
            let mut clear = UpdateBatch::new();
            clear.delete_query("*:*");
            clear.commit();
            self.engine.update(&clear).await?;
        }

        let mut report = RunReport {
            total: ids.len(),
            ..RunReport::default()
        };
        let mut current = 0;

        for chunk in ids.chunks(BATCH_SIZE) {
            let index_time = Utc::now();

            let packages = match self.store.packages_by_ids(chunk).await {
                Ok(packages) => packages,
                Err(e) => {
                    error!("{e}, occurred while loading packages: {}", join_ids(chunk));
                    report.failed_batches += 1;
                    continue;
                }
            };

            let mut outcomes = Vec::with_capacity(packages.len());
            for package in &packages {
                current += 1;
                debug!(
                    "[{current:>width$}/{total}] Indexing {name}",
                    width = report.total.to_string().len(),
                    total = report.total,
                    name = package.name,
                );
                outcomes.push(self.process_package(package).await);
            }

            let staged = StagedBatch::from_outcomes(outcomes);
            report.failed_packages += staged.failed;

            if let Err(e) = self.engine.update(&staged.update).await {
                error!("{e}, occurred while processing packages: {}", join_ids(chunk));
                report.failed_batches += 1;
                continue;
            }

            report.indexed += staged.indexed;
            report.deleted += staged.deleted;
            report.virtual_documents += staged.virtual_documents;

            if !staged.processed.is_empty() {
                debug!("updating indexed_at of {} packages", staged.processed.len());
                self.mark_indexed(&staged.processed, index_time).await?;
            }
        }

        info!(
            "indexed {} of {} packages ({} removed, {} virtual, {} failed, {} failed batches)",
            report.indexed,
            report.total,
            report.deleted,
            report.virtual_documents,
            report.failed_packages,
            report.failed_batches,
        );
        Ok(report)
    }

    async fn working_set(&self, selection: &Selection) -> Result<Vec<i64>, IndexError> {
        match selection {
            Selection::Package(name) => {
                let id = self
                    .store
                    .find_id_by_name(name)
                    .await?
                    .ok_or_else(|| IndexError::PackageNotFound(name.clone()))?;
                Ok(vec![id])
            }
            Selection::All { .. } => {
                let ids = self.store.all_ids().await?;
                self.store.reset_indexed_at().await?;
                Ok(ids)
            }
            Selection::Stale => Ok(self.store.stale_ids().await?),
        }
    }

    async fn process_package(&self, package: &Package) -> PackageOutcome {
        if package.is_spam() {
            return PackageOutcome::Delete(package.id);
        }

        let document = match self.build_document(package).await {
            Ok(document) => document,
            Err(error) => {
                return PackageOutcome::Failed {
                    name: package.name.clone(),
                    error,
                }
            }
        };

        let mut documents = vec![document];
        documents.extend(self.virtual_documents(package).await);
        PackageOutcome::Upsert {
            id: package.id,
            documents,
        }
    }

    async fn build_document(&self, package: &Package) -> Result<SearchDocument, IndexError> {
        let tags = self.store.tags(package.id).await?;
        let ranking = self.signals.inputs(package.id).await?;
        Ok(document::build(package, &tags, &ranking)?)
    }

    async fn virtual_documents(&self, package: &Package) -> Vec<SearchDocument> {
        let provided = match self.store.provides(package.id).await {
            Ok(provided) => provided,
            Err(e) => {
                error!("{e}, skipping provided names of {}", package.name);
                return Vec::new();
            }
        };

        provided
            .iter()
            .filter_map(|name| match document::build_virtual(name) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    error!("{e}, skipping package {}:provide:{name}", package.name);
                    None
                }
            })
            .collect()
    }

    async fn mark_indexed(&self, ids: &[i64], at: DateTime<Utc>) -> Result<(), IndexError> {
        let policy = self.options.mark_retry;
        let mut attempt = 1;
        loop {
            match self.store.mark_indexed(ids, at).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < policy.attempts => {
                    warn!(
                        "recording indexed_at failed (attempt {attempt}/{}): {e}",
                        policy.attempts
                    );
                    tokio::time::sleep(policy.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_argument_wins_over_flags() {
        assert_eq!(
            Selection::from_flags(Some("acme/a".to_owned()), true, true),
            Selection::Package("acme/a".to_owned())
        );
    }

    #[test]
    fn only_force_clears_the_index() {
        assert_eq!(Selection::from_flags(None, true, false), Selection::All { clear_index: true });
        assert_eq!(Selection::from_flags(None, false, true), Selection::All { clear_index: false });
        assert_eq!(Selection::from_flags(None, false, false), Selection::Stale);
    }

    #[test]
    fn staged_batch_counts_outcomes() {
        let virtual_doc = document::build_virtual("psr/log-implementation").unwrap();
        let staged = StagedBatch::from_outcomes(vec![
            PackageOutcome::Upsert { id: 1, documents: vec![virtual_doc] },
            PackageOutcome::Delete(2),
            PackageOutcome::Failed {
                name: "acme/broken".to_owned(),
                error: IndexError::PackageNotFound("acme/broken".to_owned()),
            },
        ]);
        assert_eq!(staged.processed, [1, 2]);
        assert_eq!(staged.indexed, 1);
        assert_eq!(staged.deleted, 1);
        assert_eq!(staged.failed, 1);
        assert_eq!(staged.virtual_documents, 0);
        assert_eq!(staged.update.commands().len(), 3);
    }
}
