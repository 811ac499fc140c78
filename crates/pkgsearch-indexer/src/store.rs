//! Package store trait and its `PostgreSQL` implementation.

use chrono::{DateTime, Utc};
use pkgsearch_core::types::Package;
use pkgsearch_solr::client::BoxFuture;
use sqlx::PgPool;
use thiserror::Error;

/// Errors from the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx returned an error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Lock timeouts, deadlocks, serialization failures and pool exhaustion
    /// usually clear up on their own and are worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::PoolTimedOut) => true,
            Self::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001" | "40P01" | "55P03"))
            }
            Self::Database(_) => false,
        }
    }
}

/// Read access to packages plus the `indexed_at` bookkeeping the indexer owns.
pub trait PackageStore: Send + Sync {
    /// Look up a package id by its full name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_id_by_name<'a>(&'a self, name: &'a str)
        -> BoxFuture<'a, Result<Option<i64>, StoreError>>;

    /// Every package id, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn all_ids(&self) -> BoxFuture<'_, Result<Vec<i64>, StoreError>>;

    /// Set `indexed_at` to null on every package.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn reset_indexed_at(&self) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Ids of packages never indexed or changed since they were, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn stale_ids(&self) -> BoxFuture<'_, Result<Vec<i64>, StoreError>>;

    /// Full records for `ids`; unknown ids are silently absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn packages_by_ids<'a>(&'a self, ids: &'a [i64])
        -> BoxFuture<'a, Result<Vec<Package>, StoreError>>;

    /// Raw tag names attached to any version of the package.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn tags(&self, package_id: i64) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;

    /// Distinct names provided by the package's development versions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn provides(&self, package_id: i64) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;

    /// Record `at` as the indexing time of every id in `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn mark_indexed<'a>(
        &'a self,
        ids: &'a [i64],
        at: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: i64,
    name: String,
    description: Option<String>,
    package_type: Option<String>,
    repository: Option<String>,
    language: Option<String>,
    abandoned: bool,
    replacement_package: Option<String>,
    github_stars: Option<i64>,
    indexed_at: Option<DateTime<Utc>>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            package_type: row.package_type,
            repository: row.repository,
            language: row.language,
            abandoned: row.abandoned,
            replacement_package: row.replacement_package,
            github_stars: row.github_stars.and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
            indexed_at: row.indexed_at,
        }
    }
}

/// [`PackageStore`] backed by the registry database.
#[derive(Debug, Clone)]
pub struct PgPackageStore {
    pool: PgPool,
}

impl PgPackageStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PackageStore for PgPackageStore {
    fn find_id_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<i64>, StoreError>> {
        Box::pin(async move {
            let id = sqlx::query_scalar::<_, i64>("SELECT id FROM package WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
            Ok(id)
        })
    }

    fn all_ids(&self) -> BoxFuture<'_, Result<Vec<i64>, StoreError>> {
        Box::pin(async move {
            let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM package ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
            Ok(ids)
        })
    }

    fn reset_indexed_at(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("UPDATE package SET indexed_at = NULL")
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }

    fn stale_ids(&self) -> BoxFuture<'_, Result<Vec<i64>, StoreError>> {
        Box::pin(async move {
            let ids = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM package
                 WHERE indexed_at IS NULL OR indexed_at <= updated_at
                 ORDER BY id ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(ids)
        })
    }

    fn packages_by_ids<'a>(
        &'a self,
        ids: &'a [i64],
    ) -> BoxFuture<'a, Result<Vec<Package>, StoreError>> {
        Box::pin(async move {
            let rows: Vec<PackageRow> = sqlx::query_as(
                "SELECT id, name, description, type AS package_type, repository, language,
                        abandoned, replacement_package, github_stars, indexed_at
                 FROM package
                 WHERE id = ANY($1)
                 ORDER BY id ASC",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(Package::from).collect())
        })
    }

    fn tags(&self, package_id: i64) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let tags = sqlx::query_scalar::<_, String>(
                "SELECT t.name FROM package_version pv
                 JOIN version_tag vt ON vt.version_id = pv.id
                 JOIN tag t ON t.id = vt.tag_id
                 WHERE pv.package_id = $1
                 GROUP BY t.id, t.name
                 ORDER BY t.id",
            )
            .bind(package_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(tags)
        })
    }

    fn provides(&self, package_id: i64) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let names = sqlx::query_scalar::<_, String>(
                "SELECT lp.package_name FROM package_version pv
                 JOIN link_provide lp ON lp.version_id = pv.id
                 WHERE pv.package_id = $1 AND pv.development = true
                 GROUP BY lp.package_name
                 ORDER BY lp.package_name",
            )
            .bind(package_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(names)
        })
    }

    fn mark_indexed<'a>(
        &'a self,
        ids: &'a [i64],
        at: DateTime<Utc>,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("UPDATE package SET indexed_at = $1 WHERE id = ANY($2)")
                .bind(at)
                .bind(ids)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }
}
