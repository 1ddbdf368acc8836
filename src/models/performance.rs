//! Per-player attack performance within a match.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_percentage, ValidationError};
use super::{EntityId, MatchResultId, PerformanceId, PlayerId};

/// Lowest star count a recorded attack may carry.
pub const MIN_STARS: u8 = 1;

/// Highest star count a recorded attack may carry.
pub const MAX_STARS: u8 = 3;

/// A stored performance row, as written by the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPerformance {
    pub id: PerformanceId,

    /// The attacking player
    pub player_id: PlayerId,

    /// The match this attack belongs to
    pub match_result_id: MatchResultId,

    /// Stars earned (1-3)
    pub stars: u8,

    /// Destruction percentage (0-100)
    pub destruction_percentage: f64,

    /// When this record was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PlayerPerformance {
    /// Create a new performance row with a freshly issued ID.
    pub fn new(
        player_id: PlayerId,
        match_result_id: MatchResultId,
        stars: u8,
        destruction_percentage: f64,
    ) -> Self {
        Self {
            id: EntityId::random(),
            player_id,
            match_result_id,
            stars,
            destruction_percentage,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_STARS..=MAX_STARS).contains(&self.stars) {
            return Err(ValidationError::StarsOutOfRange(self.stars));
        }
        require_percentage("destructionPercentage", self.destruction_percentage)
    }

    /// Join this row with its parent match's date.
    pub fn to_record(&self, match_date: NaiveDate) -> PerformanceRecord {
        PerformanceRecord {
            player_id: self.player_id.clone(),
            match_result_id: self.match_result_id.clone(),
            stars: self.stars,
            destruction_percentage: self.destruction_percentage,
            match_date,
        }
    }
}

/// Aggregation input: one attack, already joined with the date of its match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub player_id: PlayerId,
    pub match_result_id: MatchResultId,
    pub stars: u8,
    pub destruction_percentage: f64,
    pub match_date: NaiveDate,
}

impl PerformanceRecord {
    pub fn new(
        player_id: impl Into<PlayerId>,
        stars: u8,
        destruction_percentage: f64,
        match_date: NaiveDate,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            match_result_id: EntityId::from(""),
            stars,
            destruction_percentage,
            match_date,
        }
    }

    /// Builder method to set the parent match.
    pub fn with_match(mut self, match_result_id: impl Into<MatchResultId>) -> Self {
        self.match_result_id = match_result_id.into();
        self
    }
}
