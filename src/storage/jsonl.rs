//! JSONL (JSON Lines) tables.
//!
//! JSONL is the source of truth for every entity.
//! Each line is a valid JSON object representing one row.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Player,
    MatchResult,
    PlayerPerformance,
    ScheduledMatch,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Player => "players.jsonl",
            EntityType::MatchResult => "match_results.jsonl",
            EntityType::PlayerPerformance => "player_performances.jsonl",
            EntityType::ScheduledMatch => "scheduled_matches.jsonl",
        }
    }

    /// Singular name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Player => "player",
            EntityType::MatchResult => "match result",
            EntityType::PlayerPerformance => "performance",
            EntityType::ScheduledMatch => "scheduled match",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for an entity's table.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.table_path(entity))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single row to the file.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended row to {:?}", self.path);
        Ok(())
    }

    /// Remove the rows `remove` selects and return how many went.
    ///
    /// Lines that do not parse as `T` are carried over untouched, so a
    /// delete never loses rows this build cannot read. The new contents go
    /// to a sibling temp file which is then renamed over the table.
    pub fn remove_where<F>(&self, remove: F) -> Result<usize, StorageError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        if !self.path.exists() {
            return Ok(0);
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut kept = Vec::new();
        let mut removed = 0;

        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<T>(line) {
                Ok(row) if remove(&row) => removed += 1,
                Ok(_) => kept.push(line),
                Err(e) => {
                    debug!("Keeping unparseable line in {:?}: {}", self.path, e);
                    kept.push(line);
                }
            }
        }

        if removed > 0 {
            self.replace_lines(&kept)?;
            info!(
                "Removed {} rows from {:?}, {} lines remain",
                removed,
                self.path,
                kept.len()
            );
        }
        Ok(removed)
    }

    fn replace_lines(&self, lines: &[&str]) -> Result<(), StorageError> {
        let tmp_path = self.path.with_extension("jsonl.tmp");
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for an entity's table.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.table_path(entity))
    }

    /// Read all rows from the file. A missing file is an empty table.
    ///
    /// Lines that do not parse as `T` are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num, self.path, e
                    );
                }
            }
        }

        debug!("Read {} rows from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRow {
        id: String,
        name: String,
        value: u32,
    }

    fn row(id: &str, name: &str, value: u32) -> TestRow {
        TestRow {
            id: id.to_string(),
            name: name.to_string(),
            value,
        }
    }

    fn append_rows(path: &std::path::Path, rows: &[TestRow]) {
        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.to_path_buf());
        for r in rows {
            writer.append(r).unwrap();
        }
    }

    #[test]
    fn test_jsonl_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("append.jsonl");

        let rows = vec![row("1", "First", 100), row("2", "Second", 200)];
        append_rows(&path, &rows);

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), rows);
    }

    #[test]
    fn test_jsonl_read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<TestRow> =
            JsonlReader::new(temp_dir.path().join("nonexistent.jsonl"));

        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");

        std::fs::write(
            &path,
            r#"{"id":"1","name":"Good","value":1}
not-valid-json
{"id":"2","name":"Missing value"}

{"id":"3","name":"Also Good","value":3}
"#,
        )
        .unwrap();

        let reader: JsonlReader<TestRow> = JsonlReader::new(path);
        let rows = reader.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Good");
        assert_eq!(rows[1].name, "Also Good");
    }

    #[test]
    fn test_remove_where() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("remove.jsonl");
        append_rows(&path, &[row("1", "A", 50), row("2", "B", 150), row("3", "C", 250)]);

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        assert_eq!(writer.remove_where(|r| r.value > 100).unwrap(), 2);

        let reader: JsonlReader<TestRow> = JsonlReader::new(path.clone());
        assert_eq!(reader.read_all().unwrap(), vec![row("1", "A", 50)]);
        assert!(!path.with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_remove_where_keeps_unparseable_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drifted.jsonl");
        std::fs::write(
            &path,
            r#"{"id":"1","name":"A","value":1}
{"id":"2","name":"B","value":2}
{"id":"3","name":"C","value":null}
garbage
"#,
        )
        .unwrap();

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        assert_eq!(writer.remove_where(|r| r.id == "1").unwrap(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"id":"2","name":"B","value":2}"#,
                r#"{"id":"3","name":"C","value":null}"#,
                "garbage",
            ]
        );
    }

    #[test]
    fn test_remove_where_without_match_leaves_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("untouched.jsonl");
        std::fs::write(&path, "not-json\n\n").unwrap();

        let writer: JsonlWriter<TestRow> = JsonlWriter::new(path.clone());
        assert_eq!(writer.remove_where(|_| true).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not-json\n\n");

        let missing: JsonlWriter<TestRow> = JsonlWriter::new(temp_dir.path().join("absent.jsonl"));
        assert_eq!(missing.remove_where(|_| true).unwrap(), 0);
    }

    #[test]
    fn test_for_entity_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());

        let writer: JsonlWriter<TestRow> =
            JsonlWriter::for_entity(&config, EntityType::PlayerPerformance);
        assert_eq!(
            writer.path,
            config.tables_dir().join("player_performances.jsonl")
        );
    }

    #[test]
    fn test_entity_type_filenames() {
        assert_eq!(EntityType::Player.filename(), "players.jsonl");
        assert_eq!(EntityType::MatchResult.filename(), "match_results.jsonl");
        assert_eq!(
            EntityType::ScheduledMatch.filename(),
            "scheduled_matches.jsonl"
        );
        assert_eq!(EntityType::PlayerPerformance.label(), "performance");
    }
}
