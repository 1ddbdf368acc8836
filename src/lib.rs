//! # Clan Tracker
//!
//! War performance tracking for a game clan: players, match results and
//! per-attack performances, rolled up into monthly and all-time summaries.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, matches, performances, summaries)
//! - **calculate**: Performance aggregation over time windows
//! - **storage**: JSONL tables and the repository that joins them
//! - **auth**: Expiring admin sessions
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod auth;
pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a session lifetime such as "12h", "30m", "90s" or "7d".
///
/// A bare number is taken as seconds. Returns `None` on overflow.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit_secs) = match s.char_indices().last()? {
        (i, 'd') => (&s[..i], 86_400),
        (i, 'h') => (&s[..i], 3_600),
        (i, 'm') => (&s[..i], 60),
        (i, 's') => (&s[..i], 1),
        _ => (s, 1),
    };

    let count: u64 = digits.trim().parse().ok()?;
    count.checked_mul(unit_secs).map(Duration::from_secs)
}
