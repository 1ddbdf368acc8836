//! Repository over the JSONL tables.
//!
//! Reads always load a fresh snapshot of the tables; nothing is cached.
//! Writes are serialized through a single lock since deletes rewrite
//! whole tables.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{dedup_by_id, EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{
    EntityId, MatchPerformance, MatchReport, MatchResult, Player, PlayerId, PlayerPerformance,
    PlayerRecords, RecentPerformance, ScheduledMatch,
};

/// Access to the clan's tables, already joined for display and aggregation.
#[async_trait]
pub trait ClanRepository: Send + Sync {
    /// Every player with their performances, each joined to its match date.
    async fn players_with_records(&self) -> Result<Vec<PlayerRecords>, StorageError>;

    /// One player's joined records and latest attacks (newest match first),
    /// both taken from the same snapshot. `None` for an unknown player.
    async fn player_history(
        &self,
        player_id: &PlayerId,
        recent_limit: usize,
    ) -> Result<Option<PlayerHistory>, StorageError>;

    /// Match results, newest first, with outcome and attacks.
    async fn past_matches(&self) -> Result<Vec<MatchReport>, StorageError>;

    /// Scheduled matches that have no result yet, soonest first.
    async fn upcoming_matches(&self) -> Result<Vec<ScheduledMatch>, StorageError>;

    async fn insert_player(&self, player: Player) -> Result<Player, StorageError>;

    async fn insert_match_result(&self, result: MatchResult) -> Result<MatchResult, StorageError>;

    async fn insert_performance(
        &self,
        performance: PlayerPerformance,
    ) -> Result<PlayerPerformance, StorageError>;

    async fn insert_scheduled_match(
        &self,
        scheduled: ScheduledMatch,
    ) -> Result<ScheduledMatch, StorageError>;

    /// Remove a row. Removing a player or a match result also removes the
    /// performances that reference it.
    async fn delete(&self, entity: EntityType, id: &EntityId) -> Result<(), StorageError>;
}

/// A player's records together with their most recent attacks.
#[derive(Debug, Clone)]
pub struct PlayerHistory {
    pub records: PlayerRecords,
    pub recent: Vec<RecentPerformance>,
}

/// One consistent read of all four tables.
#[derive(Debug, Default)]
struct Tables {
    players: Vec<Player>,
    match_results: Vec<MatchResult>,
    performances: Vec<PlayerPerformance>,
    scheduled_matches: Vec<ScheduledMatch>,
}

impl Tables {
    fn load(config: &StorageConfig) -> Result<Self, StorageError> {
        let players = read_table::<Player>(config, EntityType::Player)?;
        let match_results = read_table::<MatchResult>(config, EntityType::MatchResult)?;
        let performances = read_table::<PlayerPerformance>(config, EntityType::PlayerPerformance)?;
        let scheduled_matches = read_table::<ScheduledMatch>(config, EntityType::ScheduledMatch)?;

        Ok(Self {
            players: dedup_by_id(players, |p| p.id.as_str()),
            match_results: dedup_by_id(match_results, |m| m.id.as_str()),
            performances: dedup_by_id(performances, |p| p.id.as_str()),
            scheduled_matches: dedup_by_id(scheduled_matches, |s| s.id.as_str()),
        })
    }

    fn match_dates(&self) -> HashMap<&str, NaiveDate> {
        self.match_results
            .iter()
            .map(|m| (m.id.as_str(), m.match_date))
            .collect()
    }

    /// Join performances to players and match dates.
    ///
    /// A performance whose match is missing cannot be placed in any window
    /// and is dropped. Performances of unknown players are ignored.
    fn player_records(&self) -> Vec<PlayerRecords> {
        let match_dates = self.match_dates();
        let mut by_player: HashMap<&str, Vec<_>> = HashMap::new();

        for perf in &self.performances {
            match match_dates.get(perf.match_result_id.as_str()) {
                Some(date) => by_player
                    .entry(perf.player_id.as_str())
                    .or_default()
                    .push(perf.to_record(*date)),
                None => warn!(
                    "Skipping performance {}: match result {} not found",
                    perf.id, perf.match_result_id
                ),
            }
        }

        let records: Vec<PlayerRecords> = self
            .players
            .iter()
            .map(|p| {
                let perfs = by_player.remove(p.id.as_str()).unwrap_or_default();
                PlayerRecords::new(p.clone(), perfs)
            })
            .collect();

        if !by_player.is_empty() {
            debug!(
                "Ignored performances for {} unknown players",
                by_player.len()
            );
        }

        records
    }
    /// A player's attacks joined to their matches, newest match first.
    fn recent_performances(&self, player_id: &PlayerId, limit: usize) -> Vec<RecentPerformance> {
        let matches: HashMap<&str, &MatchResult> = self
            .match_results
            .iter()
            .map(|m| (m.id.as_str(), m))
            .collect();

        let mut joined: Vec<(&PlayerPerformance, &MatchResult)> = self
            .performances
            .iter()
            .filter(|p| &p.player_id == player_id)
            .filter_map(|p| matches.get(p.match_result_id.as_str()).map(|m| (p, *m)))
            .collect();

        joined.sort_by(|(pa, ma), (pb, mb)| {
            mb.match_date
                .cmp(&ma.match_date)
                .then_with(|| pb.created_at.cmp(&pa.created_at))
        });

        joined
            .into_iter()
            .take(limit)
            .map(|(perf, m)| RecentPerformance {
                match_result_id: m.id.clone(),
                opponent_clan_name: m.opponent_clan_name.clone(),
                match_date: m.match_date,
                stars: perf.stars,
                destruction_percentage: perf.destruction_percentage,
            })
            .collect()
    }
}

fn read_table<T: DeserializeOwned>(
    config: &StorageConfig,
    entity: EntityType,
) -> Result<Vec<T>, StorageError> {
    JsonlReader::<T>::for_entity(config, entity).read_all()
}

/// Drop the rows `remove` selects from a table. Returns how many went.
fn remove_rows<T, F>(config: &StorageConfig, entity: EntityType, remove: F) -> Result<usize, StorageError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> bool,
{
    JsonlWriter::<T>::for_entity(config, entity).remove_where(remove)
}

fn not_found(entity: EntityType, id: &EntityId) -> StorageError {
    StorageError::NotFound {
        entity: entity.label(),
        id: id.clone(),
    }
}

/// Repository backed by JSONL tables on the local filesystem.
pub struct JsonlRepository {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlRepository {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn append<T: Serialize>(&self, entity: EntityType, row: &T) -> Result<(), StorageError> {
        JsonlWriter::<T>::for_entity(&self.config, entity).append(row)
    }
}

#[async_trait]
impl ClanRepository for JsonlRepository {
    async fn players_with_records(&self) -> Result<Vec<PlayerRecords>, StorageError> {
        let tables = Tables::load(&self.config)?;
        Ok(tables.player_records())
    }

    async fn player_history(
        &self,
        player_id: &PlayerId,
        recent_limit: usize,
    ) -> Result<Option<PlayerHistory>, StorageError> {
        let tables = Tables::load(&self.config)?;
        let records = tables
            .player_records()
            .into_iter()
            .find(|p| &p.player.id == player_id);

        Ok(records.map(|records| PlayerHistory {
            recent: tables.recent_performances(player_id, recent_limit),
            records,
        }))
    }

    async fn past_matches(&self) -> Result<Vec<MatchReport>, StorageError> {
        let tables = Tables::load(&self.config)?;
        let names: HashMap<&str, &str> = tables
            .players
            .iter()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .collect();

        let mut by_match: HashMap<&str, Vec<MatchPerformance>> = HashMap::new();
        for perf in &tables.performances {
            by_match
                .entry(perf.match_result_id.as_str())
                .or_default()
                .push(MatchPerformance {
                    id: perf.id.clone(),
                    player_id: perf.player_id.clone(),
                    player_name: names.get(perf.player_id.as_str()).map(|n| n.to_string()),
                    stars: perf.stars,
                    destruction_percentage: perf.destruction_percentage,
                });
        }

        let mut results = tables.match_results.clone();
        results.sort_by(|a, b| b.match_date.cmp(&a.match_date));

        Ok(results
            .into_iter()
            .map(|result| {
                let perfs = by_match.remove(result.id.as_str()).unwrap_or_default();
                MatchReport::new(result, perfs)
            })
            .collect())
    }

    async fn upcoming_matches(&self) -> Result<Vec<ScheduledMatch>, StorageError> {
        let tables = Tables::load(&self.config)?;
        let completed: HashSet<&str> = tables
            .match_results
            .iter()
            .filter_map(|m| m.scheduled_match_id.as_ref().map(|id| id.as_str()))
            .collect();

        let mut upcoming: Vec<ScheduledMatch> = tables
            .scheduled_matches
            .iter()
            .filter(|s| !completed.contains(s.id.as_str()))
            .cloned()
            .collect();
        upcoming.sort_by_key(|s| s.match_time_utc);

        debug!(
            "{} of {} scheduled matches still upcoming",
            upcoming.len(),
            tables.scheduled_matches.len()
        );
        Ok(upcoming)
    }

    async fn insert_player(&self, player: Player) -> Result<Player, StorageError> {
        player.validate()?;
        let _guard = self.write_lock.lock().await;

        self.append(EntityType::Player, &player)?;
        info!("Added player {} ({})", player.name, player.id);
        Ok(player)
    }

    async fn insert_match_result(&self, result: MatchResult) -> Result<MatchResult, StorageError> {
        result.validate()?;
        let _guard = self.write_lock.lock().await;

        if let Some(scheduled_id) = &result.scheduled_match_id {
            let scheduled = read_table::<ScheduledMatch>(&self.config, EntityType::ScheduledMatch)?;
            if !scheduled.iter().any(|s| &s.id == scheduled_id) {
                return Err(not_found(EntityType::ScheduledMatch, scheduled_id));
            }
        }

        self.append(EntityType::MatchResult, &result)?;
        info!(
            "Recorded {} against {} on {}",
            result.outcome(),
            result.opponent_clan_name,
            result.match_date
        );
        Ok(result)
    }

    async fn insert_performance(
        &self,
        performance: PlayerPerformance,
    ) -> Result<PlayerPerformance, StorageError> {
        performance.validate()?;
        let _guard = self.write_lock.lock().await;

        let players = read_table::<Player>(&self.config, EntityType::Player)?;
        if !players.iter().any(|p| p.id == performance.player_id) {
            return Err(not_found(EntityType::Player, &performance.player_id));
        }

        let results = read_table::<MatchResult>(&self.config, EntityType::MatchResult)?;
        if !results.iter().any(|m| m.id == performance.match_result_id) {
            return Err(not_found(
                EntityType::MatchResult,
                &performance.match_result_id,
            ));
        }

        self.append(EntityType::PlayerPerformance, &performance)?;
        info!(
            "Recorded {}-star attack for player {}",
            performance.stars, performance.player_id
        );
        Ok(performance)
    }

    async fn insert_scheduled_match(
        &self,
        scheduled: ScheduledMatch,
    ) -> Result<ScheduledMatch, StorageError> {
        scheduled.validate()?;
        let _guard = self.write_lock.lock().await;

        self.append(EntityType::ScheduledMatch, &scheduled)?;
        info!(
            "Scheduled match against {} at {}",
            scheduled.opponent_clan_name, scheduled.match_time_utc
        );
        Ok(scheduled)
    }

    async fn delete(&self, entity: EntityType, id: &EntityId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let config = &self.config;

        let removed = match entity {
            EntityType::Player => remove_rows::<Player, _>(config, entity, |p| &p.id == id)?,
            EntityType::MatchResult => {
                remove_rows::<MatchResult, _>(config, entity, |m| &m.id == id)?
            }
            EntityType::PlayerPerformance => {
                remove_rows::<PlayerPerformance, _>(config, entity, |p| &p.id == id)?
            }
            EntityType::ScheduledMatch => {
                remove_rows::<ScheduledMatch, _>(config, entity, |s| &s.id == id)?
            }
        };

        if removed == 0 {
            return Err(not_found(entity, id));
        }

        let cascaded = match entity {
            EntityType::Player => remove_rows::<PlayerPerformance, _>(
                config,
                EntityType::PlayerPerformance,
                |p| &p.player_id == id,
            ),
            EntityType::MatchResult => remove_rows::<PlayerPerformance, _>(
                config,
                EntityType::PlayerPerformance,
                |p| &p.match_result_id == id,
            ),
            EntityType::PlayerPerformance | EntityType::ScheduledMatch => Ok(0),
        }
        .map_err(|e| {
            error!(
                "Deleted {} {} but failed to remove its performances: {}",
                entity.label(),
                id,
                e
            );
            e
        })?;

        info!(
            "Deleted {} {} ({} dependent performances)",
            entity.label(),
            id,
            cascaded
        );
        Ok(())
    }
}
