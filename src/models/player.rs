//! Clan member model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{require_text, ValidationError};
use super::{EntityId, PerformanceRecord, PlayerId};

/// A clan member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// In-game player tag (e.g. "#ABC123")
    pub player_tag: String,

    /// When this record was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a new Player with a freshly issued ID.
    pub fn new(name: String, player_tag: String) -> Self {
        Self {
            id: EntityId::random(),
            name,
            player_tag,
            created_at: Utc::now(),
        }
    }

    /// Builder method to pin the ID (used by fixtures and imports).
    pub fn with_id(mut self, id: impl Into<PlayerId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("playerTag", &self.player_tag)
    }
}

/// A player together with every performance recorded for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecords {
    #[serde(flatten)]
    pub player: Player,

    #[serde(default)]
    pub performances: Vec<PerformanceRecord>,
}

impl PlayerRecords {
    pub fn new(player: Player, performances: Vec<PerformanceRecord>) -> Self {
        Self {
            player,
            performances,
        }
    }
}
