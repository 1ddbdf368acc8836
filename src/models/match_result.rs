//! Clan war result model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::validation::{require_percentage, require_text, ValidationError};
use super::{EntityId, MatchResultId, PerformanceId, PlayerId, ScheduledMatchId};

/// Outcome of a war from the clan's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Victory,
    Defeat,
    Draw,
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchOutcome::Victory => write!(f, "victory"),
            MatchOutcome::Defeat => write!(f, "defeat"),
            MatchOutcome::Draw => write!(f, "draw"),
        }
    }
}

/// The final score of a war against another clan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: MatchResultId,

    /// Opposing clan
    pub opponent_clan_name: String,

    /// Total stars earned by the clan
    pub clan_stars: u32,

    /// Overall destruction achieved by the clan (0-100)
    pub clan_percentage: f64,

    /// Total stars earned by the opponent
    pub enemy_stars: u32,

    /// Overall destruction achieved by the opponent (0-100)
    pub enemy_percentage: f64,

    /// Day the war was fought
    pub match_date: NaiveDate,

    /// The schedule entry this result closes, if any
    #[serde(default)]
    pub scheduled_match_id: Option<ScheduledMatchId>,

    /// When this record was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl MatchResult {
    /// Create a new MatchResult with a freshly issued ID and no scores.
    pub fn new(opponent_clan_name: String, match_date: NaiveDate) -> Self {
        Self {
            id: EntityId::random(),
            opponent_clan_name,
            clan_stars: 0,
            clan_percentage: 0.0,
            enemy_stars: 0,
            enemy_percentage: 0.0,
            match_date,
            scheduled_match_id: None,
            created_at: Utc::now(),
        }
    }

    /// Builder method to pin the ID.
    pub fn with_id(mut self, id: impl Into<MatchResultId>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder method to set both sides' scores.
    pub fn with_score(
        mut self,
        clan_stars: u32,
        clan_percentage: f64,
        enemy_stars: u32,
        enemy_percentage: f64,
    ) -> Self {
        self.clan_stars = clan_stars;
        self.clan_percentage = clan_percentage;
        self.enemy_stars = enemy_stars;
        self.enemy_percentage = enemy_percentage;
        self
    }

    /// Builder method to link the schedule entry.
    pub fn with_scheduled_match(mut self, id: impl Into<ScheduledMatchId>) -> Self {
        self.scheduled_match_id = Some(id.into());
        self
    }

    /// Stars decide the war; destruction breaks a star tie.
    pub fn outcome(&self) -> MatchOutcome {
        let by_destruction = self
            .clan_percentage
            .partial_cmp(&self.enemy_percentage)
            .unwrap_or(Ordering::Equal);

        match self.clan_stars.cmp(&self.enemy_stars).then(by_destruction) {
            Ordering::Greater => MatchOutcome::Victory,
            Ordering::Less => MatchOutcome::Defeat,
            Ordering::Equal => MatchOutcome::Draw,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("opponentClanName", &self.opponent_clan_name)?;
        require_percentage("clanPercentage", self.clan_percentage)?;
        require_percentage("enemyPercentage", self.enemy_percentage)
    }
}

/// One player's attack as listed under a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPerformance {
    pub id: PerformanceId,
    pub player_id: PlayerId,

    /// None when the player has since been removed
    pub player_name: Option<String>,

    pub stars: u8,
    pub destruction_percentage: f64,
}

/// A match result with its outcome and the attacks recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    #[serde(flatten)]
    pub result: MatchResult,

    pub outcome: MatchOutcome,

    pub performances: Vec<MatchPerformance>,
}

impl MatchReport {
    pub fn new(result: MatchResult, performances: Vec<MatchPerformance>) -> Self {
        let outcome = result.outcome();
        Self {
            result,
            outcome,
            performances,
        }
    }
}
