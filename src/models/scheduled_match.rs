//! Upcoming war schedule model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_text, ValidationError};
use super::{EntityId, ScheduledMatchId};

/// A war that has been arranged but not necessarily played yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMatch {
    pub id: ScheduledMatchId,

    /// Opposing clan
    pub opponent_clan_name: String,

    /// Start time of the war
    pub match_time_utc: DateTime<Utc>,

    /// Free-form notes for the roster
    #[serde(default)]
    pub notes: Option<String>,

    /// When this record was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ScheduledMatch {
    pub fn new(opponent_clan_name: String, match_time_utc: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::random(),
            opponent_clan_name,
            match_time_utc,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Builder method to pin the ID.
    pub fn with_id(mut self, id: impl Into<ScheduledMatchId>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder method to attach notes.
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("opponentClanName", &self.opponent_clan_name)
    }
}
