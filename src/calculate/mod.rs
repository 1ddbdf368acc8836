//! Statistics calculation engine.
//!
//! Rolls per-attack performance records into player-level summaries:
//! - Average stars and average destruction (one decimal)
//! - Three/two/one star histogram
//! - Current-month, all-time and custom-month windows
//!
//! Everything here is pure. The only input that is not an argument is the
//! clock, and `Aggregator` is the one place that reads it.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{
    Calendar, PerformanceRecord, PlayerRecords, PlayerSummary, StarShares, StatSummary,
    TimeWindow, YearMonth,
};

/// Round to one decimal place, halves away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of `total` over `count`, rounded to one decimal. Zero when `count` is zero.
pub fn calculate_average(total: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_one_decimal(total / count as f64)
    }
}

/// Percentage of `part` in `whole`, rounded to one decimal. Zero when `whole` is zero.
pub fn calculate_share(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_one_decimal(part as f64 / whole as f64 * 100.0)
    }
}

/// Running totals for one summary.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    total_matches: u32,
    star_sum: u64,
    destruction_sum: f64,
    three_star_count: u32,
    two_star_count: u32,
    one_star_count: u32,
}

impl StatAccumulator {
    pub fn push(&mut self, record: &PerformanceRecord) {
        self.total_matches += 1;
        self.star_sum += u64::from(record.stars);
        self.destruction_sum += record.destruction_percentage;

        match record.stars {
            3 => self.three_star_count += 1,
            2 => self.two_star_count += 1,
            1 => self.one_star_count += 1,
            _ => {}
        }
    }

    pub fn finish(&self) -> StatSummary {
        if self.total_matches == 0 {
            return StatSummary::default();
        }

        StatSummary {
            average_stars: calculate_average(self.star_sum as f64, self.total_matches),
            total_matches: self.total_matches,
            three_star_count: self.three_star_count,
            two_star_count: self.two_star_count,
            one_star_count: self.one_star_count,
            average_destruction: calculate_average(self.destruction_sum, self.total_matches),
        }
    }
}

/// Summarize the records inside `window`, with "today" given explicitly.
pub fn summarize_on(
    records: &[PerformanceRecord],
    window: TimeWindow,
    today: NaiveDate,
) -> StatSummary {
    let month = window.resolve(today);
    let mut acc = StatAccumulator::default();

    for record in records {
        if in_month(month, record.match_date) {
            acc.push(record);
        }
    }

    acc.finish()
}

/// Summarize one player for the current month, all time, and (for an
/// explicit month window) that month, in a single pass over their records.
pub fn summarize_player_on(
    player: &PlayerRecords,
    window: TimeWindow,
    today: NaiveDate,
) -> PlayerSummary {
    let current = YearMonth::of(today);
    let custom = match window {
        TimeWindow::Month(ym) => Some(ym),
        TimeWindow::CurrentMonth | TimeWindow::AllTime => None,
    };

    let mut monthly = StatAccumulator::default();
    let mut overall = StatAccumulator::default();
    let mut custom_acc = StatAccumulator::default();

    for record in &player.performances {
        overall.push(record);
        if current.contains(record.match_date) {
            monthly.push(record);
        }
        if custom.is_some_and(|ym| ym.contains(record.match_date)) {
            custom_acc.push(record);
        }
    }

    PlayerSummary {
        monthly: monthly.finish(),
        overall: overall.finish(),
        custom: custom.map(|_| custom_acc.finish()),
        ..PlayerSummary::empty(&player.player)
    }
}

/// Summarize every player. Nobody is dropped for having no records; a
/// repeated player ID keeps its first occurrence.
pub fn summarize_per_player_on(
    players: &[PlayerRecords],
    window: TimeWindow,
    today: NaiveDate,
) -> Vec<PlayerSummary> {
    let mut seen = HashSet::new();

    players
        .iter()
        .filter(|p| seen.insert(p.player.id.as_str()))
        .map(|p| summarize_player_on(p, window, today))
        .collect()
}

/// Star distribution of a summary as percentages.
pub fn calculate_star_shares(summary: &StatSummary) -> StarShares {
    StarShares {
        three_star: calculate_share(summary.three_star_count, summary.total_matches),
        two_star: calculate_share(summary.two_star_count, summary.total_matches),
        one_star: calculate_share(summary.one_star_count, summary.total_matches),
    }
}

fn in_month(month: Option<YearMonth>, date: NaiveDate) -> bool {
    month.map_or(true, |ym| ym.contains(date))
}

/// Clock-aware front end to the pure functions above.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    calendar: Calendar,
}

impl Aggregator {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    pub fn summarize(&self, records: &[PerformanceRecord], window: TimeWindow) -> StatSummary {
        summarize_on(records, window, self.today())
    }

    pub fn summarize_player(&self, player: &PlayerRecords, window: TimeWindow) -> PlayerSummary {
        summarize_player_on(player, window, self.today())
    }

    pub fn summarize_per_player(
        &self,
        players: &[PlayerRecords],
        window: TimeWindow,
    ) -> Vec<PlayerSummary> {
        summarize_per_player_on(players, window, self.today())
    }
}
