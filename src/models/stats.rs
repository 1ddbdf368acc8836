//! Derived statistics models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{MatchResultId, Player, PlayerId, YearMonth};

/// Performance grade derived from average stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StarRating {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl StarRating {
    pub fn from_average_stars(average_stars: f64) -> Self {
        if average_stars >= 2.8 {
            StarRating::Excellent
        } else if average_stars >= 2.5 {
            StarRating::Good
        } else if average_stars >= 2.0 {
            StarRating::Average
        } else {
            StarRating::NeedsImprovement
        }
    }
}

impl std::fmt::Display for StarRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StarRating::Excellent => write!(f, "Excellent"),
            StarRating::Good => write!(f, "Good"),
            StarRating::Average => write!(f, "Average"),
            StarRating::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

/// Summary of a set of attacks. Every field is zero for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    /// Mean stars per attack, one decimal
    pub average_stars: f64,

    pub total_matches: u32,

    pub three_star_count: u32,
    pub two_star_count: u32,
    pub one_star_count: u32,

    /// Mean destruction percentage, one decimal
    pub average_destruction: f64,
}

impl StatSummary {
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    pub fn rating(&self) -> StarRating {
        StarRating::from_average_stars(self.average_stars)
    }
}

/// Share of attacks at each star count, as percentages with one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarShares {
    pub three_star: f64,
    pub two_star: f64,
    pub one_star: f64,
}

/// Per-player statistics as handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub player_tag: String,

    /// Current calendar month
    pub monthly: StatSummary,

    /// Every recorded attack
    pub overall: StatSummary,

    /// Explicitly requested month, when one was asked for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<StatSummary>,
}

impl PlayerSummary {
    /// Summary with all-zero statistics.
    pub fn empty(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            player_tag: player.player_tag.clone(),
            monthly: StatSummary::default(),
            overall: StatSummary::default(),
            custom: None,
        }
    }
}

/// One attack as listed in a player's recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPerformance {
    pub match_result_id: MatchResultId,
    pub opponent_clan_name: String,
    pub match_date: NaiveDate,
    pub stars: u8,
    pub destruction_percentage: f64,
}

/// Everything the player detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub summary: PlayerSummary,

    /// Grade for the all-time summary
    pub rating: StarRating,

    /// All-time star distribution
    pub star_shares: StarShares,

    /// Month the `custom` summary covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_month: Option<YearMonth>,

    pub recent_performances: Vec<RecentPerformance>,
}
