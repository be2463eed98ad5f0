use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, WinProbError};

pub mod models;
use models::*;

/// Load a parsed match from disk. SQLite exports are recognised by their
/// extension (`.db`, `.sqlite`, `.sqlite3`); everything else is read as JSON.
pub fn load_match(path: impl AsRef<Path>) -> Result<ParsedMatch> {
    let path = path.as_ref();
    let is_sqlite = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "db" | "sqlite" | "sqlite3"))
        .unwrap_or(false);

    if is_sqlite {
        MatchStore::open(path)?.load()
    } else {
        load_json(path)
    }
}

/// Read a parsed match serialized as JSON
pub fn load_json(path: impl AsRef<Path>) -> Result<ParsedMatch> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let parsed: ParsedMatch = serde_json::from_str(&raw).map_err(|e| {
        WinProbError::Parse(format!("{}: {}", path.as_ref().display(), e))
    })?;
    debug!(
        "Loaded {} tick rows from {}",
        parsed.ticks.len(),
        path.as_ref().display()
    );
    Ok(parsed)
}

/// SQLite export of a parsed match: a `ticks` table plus an optional
/// key/value `header` table.
pub struct MatchStore {
    conn: Connection,
}

impl MatchStore {
    /// Open an existing export read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        Ok(MatchStore { conn })
    }

    /// Open (or create) an export and make sure the schema exists
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(MatchStore { conn })
    }

    /// Write a parsed match into the export
    pub fn insert_match(&mut self, parsed: &ParsedMatch) -> Result<()> {
        let tx = self.conn.transaction()?;
        if let Some(map_name) = &parsed.header.map_name {
            tx.execute(
                "INSERT OR REPLACE INTO header (key, value) VALUES ('map_name', ?1)",
                params![map_name],
            )?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ticks (
                    tick, round, side, health, armor_value, has_helmet,
                    current_equip_value, is_bomb_planted, steamid
                 ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            )?;
            for rec in &parsed.ticks {
                stmt.execute(params![
                    rec.tick,
                    rec.round,
                    rec.side.as_str(),
                    rec.health,
                    rec.armor_value,
                    rec.has_helmet,
                    rec.current_equip_value,
                    rec.is_bomb_planted,
                    rec.steamid as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Read the whole export into memory
    pub fn load(&self) -> Result<ParsedMatch> {
        let columns = self.tick_columns()?;
        if columns.is_empty() {
            return Err(WinProbError::Parse("export has no ticks table".into()));
        }
        let has = |name: &str| columns.iter().any(|c| c == name);

        let side_column = if has("side") {
            "side"
        } else if has("team_name") {
            "team_name"
        } else {
            return Err(WinProbError::Parse(
                "ticks table has neither a side nor a team_name column".into(),
            ));
        };
        let armor_column = if has("armor_value") { "armor_value" } else { "NULL" };
        let helmet_column = if has("has_helmet") { "has_helmet" } else { "NULL" };

        let sql = format!(
            "SELECT tick, round, {side_column}, health, {armor_column}, {helmet_column},
                    current_equip_value, is_bomb_planted, steamid
             FROM ticks ORDER BY tick, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ticks = stmt
            .query_map([], map_tick_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(RawTickRow::into_record)
            .collect::<Result<Vec<_>>>()?;

        let header = MatchHeader {
            map_name: self.header_value("map_name")?,
        };
        debug!("Loaded {} tick rows from SQLite export", ticks.len());
        Ok(ParsedMatch { header, ticks })
    }

    fn tick_columns(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(ticks)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    fn header_value(&self, key: &str) -> Result<Option<String>> {
        let has_header: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name='header')",
            [],
            |row| row.get(0),
        )?;
        if !has_header {
            return Ok(None);
        }
        let value = self
            .conn
            .query_row(
                "SELECT value FROM header WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// A `ticks` row before the side column has been interpreted
struct RawTickRow {
    tick: i64,
    round: i32,
    side: String,
    health: i32,
    armor_value: Option<i32>,
    has_helmet: Option<bool>,
    current_equip_value: i64,
    is_bomb_planted: bool,
    steamid: i64,
}

impl RawTickRow {
    fn into_record(self) -> Result<TickRecord> {
        Ok(TickRecord {
            tick: self.tick,
            round: self.round,
            side: self.side.parse()?,
            health: self.health,
            armor_value: self.armor_value,
            has_helmet: self.has_helmet,
            current_equip_value: self.current_equip_value,
            is_bomb_planted: self.is_bomb_planted,
            steamid: self.steamid as u64,
        })
    }
}

fn map_tick_row(row: &rusqlite::Row) -> rusqlite::Result<RawTickRow> {
    Ok(RawTickRow {
        tick: row.get(0)?,
        round: row.get(1)?,
        side: row.get(2)?,
        health: row.get(3)?,
        armor_value: row.get(4)?,
        has_helmet: row.get(5)?,
        current_equip_value: row.get(6)?,
        is_bomb_planted: row.get(7)?,
        steamid: row.get(8)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS header (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ticks (
    tick                INTEGER NOT NULL,
    round               INTEGER NOT NULL,
    side                TEXT    NOT NULL,
    health              INTEGER NOT NULL,
    armor_value         INTEGER,
    has_helmet          INTEGER,
    current_equip_value INTEGER NOT NULL,
    is_bomb_planted     INTEGER NOT NULL DEFAULT 0,
    steamid             INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ticks_tick ON ticks(tick);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_match() -> ParsedMatch {
        ParsedMatch {
            header: MatchHeader {
                map_name: Some("de_mirage".into()),
            },
            ticks: vec![
                TickRecord {
                    tick: 64,
                    round: 1,
                    side: Side::Ct,
                    health: 100,
                    armor_value: Some(100),
                    has_helmet: Some(true),
                    current_equip_value: 1000,
                    is_bomb_planted: false,
                    steamid: 76561198000000001,
                },
                TickRecord {
                    tick: 64,
                    round: 1,
                    side: Side::Terrorist,
                    health: 0,
                    armor_value: None,
                    has_helmet: None,
                    current_equip_value: 800,
                    is_bomb_planted: false,
                    steamid: 76561198000000002,
                },
            ],
        }
    }

    #[test]
    fn sqlite_export_round_trips_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("demo.db");
        let mut store = MatchStore::create(&path).unwrap();
        store.insert_match(&sample_match()).unwrap();
        drop(store);

        let loaded = load_match(&path).unwrap();
        assert_eq!(loaded, sample_match());
    }

    #[test]
    fn sqlite_export_with_team_name_and_no_armor_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE ticks (
                tick INTEGER, round INTEGER, team_name TEXT, health INTEGER,
                current_equip_value INTEGER, is_bomb_planted INTEGER, steamid INTEGER
             );
             INSERT INTO ticks VALUES (10, 2, 'TERRORIST', 70, 3100, 1, 42);",
        )
        .unwrap();
        drop(conn);

        let loaded = MatchStore::open(&path).unwrap().load().unwrap();
        assert!(loaded.header.map_name.is_none());
        assert_eq!(loaded.ticks.len(), 1);
        let rec = &loaded.ticks[0];
        assert_eq!(rec.side, Side::Terrorist);
        assert_eq!(rec.armor_value, None);
        assert_eq!(rec.has_helmet, None);
        assert!(rec.is_bomb_planted);
    }

    #[test]
    fn sqlite_export_with_unknown_side_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spectators.db");
        let mut store = MatchStore::create(&path).unwrap();
        store.insert_match(&sample_match()).unwrap();
        store
            .conn
            .execute("UPDATE ticks SET side = 'SPECTATOR' WHERE steamid = 76561198000000002", [])
            .unwrap();
        drop(store);

        let err = load_match(&path).unwrap_err();
        assert!(matches!(err, WinProbError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn json_match_loads_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, serde_json::to_string(&sample_match()).unwrap()).unwrap();
        let loaded = load_match(&path).unwrap();
        assert_eq!(loaded.header.map_name.as_deref(), Some("de_mirage"));
        assert_eq!(loaded.ticks.len(), 2);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_match(&path), Err(WinProbError::Parse(_))));
    }
}
