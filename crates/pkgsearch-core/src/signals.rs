//! Ranking signals stored alongside each document.
//!
//! Both values are log-compressed so that packages spanning several orders
//! of magnitude of usage end up in a small numeric range that works as a
//! sort key or boost input.

/// Raw popularity figures collected for one package before indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankingInputs {
    /// Downloads over the last 30 days.
    pub monthly_downloads: u64,
    /// Lifetime downloads.
    pub total_downloads: u64,
    /// Number of users who starred the package on the registry.
    pub favers: u64,
    /// Time-decayed download score, `0.0` when the package is not trending.
    pub trending_score: f64,
}

/// `round(log10(monthly_downloads) + log10(github_stars))`, where a zero
/// input contributes `0` instead of being undefined.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn popularity(monthly_downloads: u64, github_stars: u64) -> i64 {
    let score = log10_or_zero(monthly_downloads as f64) + log10_or_zero(github_stars as f64);
    score.round() as i64
}

/// `log10(trending_score)` for positive scores, else `0`.
#[must_use]
pub fn trendiness(trending_score: f64) -> f64 {
    log10_or_zero(trending_score)
}

fn log10_or_zero(value: f64) -> f64 {
    if value > 0.0 {
        value.log10()
    } else {
        0.0
    }
}
