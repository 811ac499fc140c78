//! Ranking signal sources.

use chrono::{Days, NaiveDate, Utc};
use pkgsearch_core::signals::RankingInputs;
use pkgsearch_solr::client::BoxFuture;
use redis::aio::MultiplexedConnection;
use thiserror::Error;

/// Number of daily download counters summed into the monthly figure.
pub const MONTHLY_WINDOW_DAYS: u64 = 30;

const TRENDING_KEY: &str = "downloads:trending";

/// Errors from the signal source.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Redis returned an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Supplies the raw popularity figures for a package.
pub trait RankingSignals: Send + Sync {
    /// Downloads, favorites and trending score for `package_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] if the figures cannot be read.
    fn inputs(&self, package_id: i64) -> BoxFuture<'_, Result<RankingInputs, SignalError>>;
}

/// Redis-backed [`RankingSignals`].
///
/// Reads `dl:<id>` for lifetime downloads, the daily `dl:<id>:<YYYYMMDD>`
/// counters of the last 30 days for monthly downloads, the size of the
/// `pkg:<id>:fav` sorted set for favorites and the package's score in
/// `downloads:trending`.
#[derive(Clone)]
pub struct RedisSignals {
    conn: MultiplexedConnection,
}

impl RedisSignals {
    /// Open a multiplexed connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Redis`] if the URL is invalid or unreachable.
    pub async fn connect(url: &str) -> Result<Self, SignalError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

/// Daily counter keys for the window ending on `today`, newest first.
#[must_use]
pub fn daily_keys(package_id: i64, today: NaiveDate) -> Vec<String> {
    (0..MONTHLY_WINDOW_DAYS)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|day| format!("dl:{package_id}:{}", day.format("%Y%m%d")))
        .collect()
}

impl RankingSignals for RedisSignals {
    fn inputs(&self, package_id: i64) -> BoxFuture<'_, Result<RankingInputs, SignalError>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let days = daily_keys(package_id, Utc::now().date_naive());

            let (total, daily, favers, trending): (Option<u64>, Vec<Option<u64>>, u64, Option<f64>) =
                redis::pipe()
                    .cmd("GET")
                    .arg(format!("dl:{package_id}"))
                    .cmd("MGET")
                    .arg(&days)
                    .cmd("ZCARD")
                    .arg(format!("pkg:{package_id}:fav"))
                    .cmd("ZSCORE")
                    .arg(TRENDING_KEY)
                    .arg(package_id)
                    .query_async(&mut conn)
                    .await?;

            Ok(RankingInputs {
                monthly_downloads: daily.into_iter().flatten().sum(),
                total_downloads: total.unwrap_or(0),
                favers,
                trending_score: trending.unwrap_or(0.0),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_keys_cover_thirty_days_across_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let keys = daily_keys(42, today);
        assert_eq!(keys.len(), 30);
        assert_eq!(keys[0], "dl:42:20240305");
        assert_eq!(keys[5], "dl:42:20240229");
        assert_eq!(keys[29], "dl:42:20240205");
    }
}
