//! Storage layer for the lap tracker.
//!
//! Provides persistence for tracks and recorded lap times using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! Times are stored twice: `time_str` keeps the exact text the user entered
//! and `time_ms` keeps the parsed millisecond magnitude for ordering and
//! `MIN()` aggregation. Timestamps are stored as TEXT in ISO 8601 format
//! (e.g. `2024-01-15T10:30:00.000Z`) so lexicographic ordering matches
//! chronological ordering.
//!
//! A `(track, time_str, speed, items)` UNIQUE constraint makes duplicate
//! submissions a no-op rather than a second row.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ffi, params};
use thiserror::Error;

use lt_core::{Category, CategoryError, LapTime, TimeError};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to read an import file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A time in the database or an import file failed to parse.
    #[error("invalid stored time for {context}: {source}")]
    InvalidTime {
        context: String,
        #[source]
        source: TimeError,
    },
    /// A stored category label failed to parse.
    #[error("invalid stored category for row {id}: {source}")]
    InvalidCategory {
        id: i64,
        #[source]
        source: CategoryError,
    },
    /// An import file line did not have the expected shape.
    #[error("malformed line {line} in {path}: {content:?}")]
    MalformedCsvLine {
        path: String,
        line: usize,
        content: String,
    },
    /// A time referenced a track that does not exist.
    #[error("unknown track: {name}")]
    UnknownTrack { name: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A track in course order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    /// 1-based course position; the timesheet row order.
    pub number: i64,
    pub cup: String,
    pub cup_type: String,
    pub name: String,
    pub abbrev: String,
}

/// One recorded time for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub id: i64,
    pub time: LapTime,
    pub recorded_at: String,
}

/// A recently added time joined with its track's abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTime {
    pub id: i64,
    pub track: String,
    pub abbrev: String,
    pub time: LapTime,
    pub category: Category,
    pub recorded_at: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tracks (
                number INTEGER PRIMARY KEY,
                cup TEXT NOT NULL,
                cup_type TEXT NOT NULL,
                name TEXT NOT NULL UNIQUE,
                abbrev TEXT NOT NULL
            );

            -- time_str: exact text as entered, compact variant
            -- time_ms: parsed magnitude, used for ordering and MIN()
            CREATE TABLE IF NOT EXISTS lap_times (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                track TEXT NOT NULL,
                time_str TEXT NOT NULL,
                time_ms INTEGER NOT NULL,
                speed TEXT NOT NULL,
                items TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                UNIQUE (track, time_str, speed, items),
                FOREIGN KEY (track) REFERENCES tracks(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_lap_times_track ON lap_times(track);
            CREATE INDEX IF NOT EXISTS idx_lap_times_category ON lap_times(speed, items);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of tracks, ignoring duplicates by name.
    pub fn insert_tracks(&mut self, tracks: &[TrackRecord]) -> Result<usize, DbError> {
        if tracks.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO tracks (number, cup, cup_type, name, abbrev)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for track in tracks {
                inserted += stmt.execute(params![
                    track.number,
                    track.cup,
                    track.cup_type,
                    track.name,
                    track.abbrev,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Records a time for a track.
    ///
    /// Returns `Ok(false)` when an identical time already exists for the same
    /// track and category. An unknown track name is an error, not a silent
    /// orphan row.
    pub fn insert_time(
        &mut self,
        track: &str,
        time: LapTime,
        category: Category,
        recorded_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = self.conn.execute(
            "
            INSERT INTO lap_times (track, time_str, time_ms, speed, items, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
            params![
                track,
                time.to_string(),
                i64::try_from(time.total_millis()).unwrap_or(i64::MAX),
                category.speed.as_str(),
                category.items.as_str(),
                format_timestamp(recorded_at),
            ],
        );
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                tracing::debug!(track, %time, "duplicate time ignored");
                Ok(false)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Err(DbError::UnknownTrack {
                    name: track.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a recorded time by ID. Returns whether a row was removed.
    pub fn delete_time(&mut self, id: i64) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM lap_times WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }

    /// Lists all tracks in course order.
    pub fn list_tracks(&self) -> Result<Vec<TrackRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT number, cup, cup_type, name, abbrev
            FROM tracks
            ORDER BY number ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TrackRecord {
                number: row.get(0)?,
                cup: row.get(1)?,
                cup_type: row.get(2)?,
                name: row.get(3)?,
                abbrev: row.get(4)?,
            })
        })?;
        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(row?);
        }
        Ok(tracks)
    }

    /// Returns the personal best per track for a category, one entry per
    /// track in course order.
    ///
    /// A LEFT JOIN keeps every track in the result; tracks with no recorded
    /// time for the category yield `None`. The ungrouped `time_str` is paired
    /// with `MIN(time_ms)` by SQLite's bare-column-in-aggregate rule, so the
    /// string always belongs to the fastest row.
    pub fn best_times(&self, category: Category) -> Result<Vec<Option<String>>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT MIN(lt.time_ms), lt.time_str
            FROM tracks t
            LEFT JOIN lap_times lt
                ON t.name = lt.track
                AND lt.speed = ?
                AND lt.items = ?
            GROUP BY t.name
            ORDER BY t.number ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![category.speed.as_str(), category.items.as_str()],
            |row| {
                let best_ms: Option<i64> = row.get(0)?;
                let time_str: Option<String> = row.get(1)?;
                Ok(best_ms.and(time_str))
            },
        )?;
        let mut times = Vec::new();
        for row in rows {
            times.push(row?);
        }
        Ok(times)
    }

    /// Returns the `n` most recently added times, newest first.
    pub fn recent_times(&self, n: usize) -> Result<Vec<RecentTime>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT lt.id, lt.track, t.abbrev, lt.time_str, lt.speed, lt.items, lt.recorded_at
            FROM lap_times lt
            JOIN tracks t ON lt.track = t.name
            ORDER BY lt.id DESC
            LIMIT ?
            ",
        )?;
        let rows = stmt.query_map(params![i64::try_from(n).unwrap_or(i64::MAX)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;
        let mut times = Vec::new();
        for row in rows {
            let (id, track, abbrev, time_str, speed, items, recorded_at) = row?;
            times.push(RecentTime {
                id,
                track,
                abbrev,
                time: parse_stored_time(&time_str, &format!("lap_times row {id}"))?,
                category: parse_stored_category(id, &speed, &items)?,
                recorded_at,
            });
        }
        Ok(times)
    }

    /// Returns every recorded time for one track and category, fastest first.
    pub fn times_for_track(
        &self,
        track: &str,
        category: Category,
    ) -> Result<Vec<TimeRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, time_str, recorded_at
            FROM lap_times
            WHERE track = ? AND speed = ? AND items = ?
            ORDER BY time_ms ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![track, category.speed.as_str(), category.items.as_str()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;
        let mut times = Vec::new();
        for row in rows {
            let (id, time_str, recorded_at) = row?;
            times.push(TimeRow {
                id,
                time: parse_stored_time(&time_str, &format!("lap_times row {id}"))?,
                recorded_at,
            });
        }
        Ok(times)
    }

    /// Loads tracks from a CSV file with lines of the form
    /// `number,cup,cup_type,name,abbrev`. Blank lines are skipped.
    pub fn import_tracks_csv(&mut self, path: &Path) -> Result<usize, DbError> {
        let content = fs::read_to_string(path)?;
        let mut tracks = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(5, ',').map(str::trim).collect();
            let [number, cup, cup_type, name, abbrev] = fields.as_slice() else {
                return Err(malformed(path, line_no, line));
            };
            let number = number
                .parse::<i64>()
                .map_err(|_| malformed(path, line_no, line))?;
            tracks.push(TrackRecord {
                number,
                cup: (*cup).to_string(),
                cup_type: (*cup_type).to_string(),
                name: (*name).to_string(),
                abbrev: (*abbrev).to_string(),
            });
        }
        let inserted = self.insert_tracks(&tracks)?;
        tracing::info!(path = %path.display(), inserted, "imported tracks");
        Ok(inserted)
    }

    /// Loads recorded times from a CSV file with lines of the form
    /// `track_name,time`. Duplicates are skipped, not errors.
    pub fn import_times_csv(
        &mut self,
        path: &Path,
        category: Category,
        recorded_at: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let content = fs::read_to_string(path)?;
        let mut inserted = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Track names may contain commas; the time is always last.
            let Some((track, raw_time)) = line.rsplit_once(',') else {
                return Err(malformed(path, line_no, line));
            };
            let time = raw_time
                .trim()
                .parse::<LapTime>()
                .map_err(|source| DbError::InvalidTime {
                    context: format!("{}:{}", path.display(), line_no + 1),
                    source,
                })?;
            if self.insert_time(track.trim(), time, category, recorded_at)? {
                inserted += 1;
            }
        }
        tracing::info!(path = %path.display(), inserted, %category, "imported times");
        Ok(inserted)
    }
}

fn malformed(path: &Path, line_no: usize, content: &str) -> DbError {
    DbError::MalformedCsvLine {
        path: path.display().to_string(),
        line: line_no + 1,
        content: content.to_string(),
    }
}

fn parse_stored_time(time_str: &str, context: &str) -> Result<LapTime, DbError> {
    time_str.parse().map_err(|source| DbError::InvalidTime {
        context: context.to_string(),
        source,
    })
}

fn parse_stored_category(id: i64, speed: &str, items: &str) -> Result<Category, DbError> {
    let speed = speed
        .parse()
        .map_err(|source| DbError::InvalidCategory { id, source })?;
    let items = items
        .parse()
        .map_err(|source| DbError::InvalidCategory { id, source })?;
    Ok(Category::new(speed, items))
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
