//! Sleep night repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/update/get/list/clear over `daily_sleep_quality_table`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Lists are ordered most-recent first (`night_id DESC`).
//! - Read paths reject rows that break the open/closed time invariant.

use crate::db::DbError;
use crate::model::sleep_night::{NightId, SleepNight};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NIGHT_SELECT_SQL: &str = "SELECT
    night_id,
    start_time_milli,
    end_time_milli,
    quality_rating
FROM daily_sleep_quality_table";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for sleep night persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NightId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "sleep night not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted sleep night: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data access contract for sleep nights.
pub trait SleepRepository {
    /// Inserts a night and returns the storage-assigned id.
    ///
    /// The incoming `night_id` is ignored.
    fn insert(&self, night: &SleepNight) -> RepoResult<NightId>;
    /// Replaces every mutable field of an existing night.
    fn update(&self, night: &SleepNight) -> RepoResult<()>;
    /// Gets one night by id.
    fn get(&self, id: NightId) -> RepoResult<Option<SleepNight>>;
    /// Gets the most recently inserted night, open or not.
    fn get_latest(&self) -> RepoResult<Option<SleepNight>>;
    /// Lists all nights, most recent first.
    fn get_all_nights(&self) -> RepoResult<Vec<SleepNight>>;
    /// Deletes every night and returns how many were removed.
    fn clear(&self) -> RepoResult<usize>;
}

/// SQLite-backed sleep repository.
pub struct SqliteSleepRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSleepRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SleepRepository for SqliteSleepRepository<'_> {
    fn insert(&self, night: &SleepNight) -> RepoResult<NightId> {
        self.conn.execute(
            "INSERT INTO daily_sleep_quality_table (
                start_time_milli,
                end_time_milli,
                quality_rating
            ) VALUES (?1, ?2, ?3);",
            params![
                night.start_time_milli,
                night.end_time_milli,
                night.sleep_quality
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, night: &SleepNight) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE daily_sleep_quality_table
             SET
                start_time_milli = ?1,
                end_time_milli = ?2,
                quality_rating = ?3
             WHERE night_id = ?4;",
            params![
                night.start_time_milli,
                night.end_time_milli,
                night.sleep_quality,
                night.night_id
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(night.night_id));
        }
        Ok(())
    }

    fn get(&self, id: NightId) -> RepoResult<Option<SleepNight>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{NIGHT_SELECT_SQL} WHERE night_id = ?1;"))?;
        let row = stmt.query_row([id], row_values).optional()?;
        row.map(parse_night).transpose()
    }

    fn get_latest(&self) -> RepoResult<Option<SleepNight>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{NIGHT_SELECT_SQL} ORDER BY night_id DESC LIMIT 1;"
        ))?;
        let row = stmt.query_row([], row_values).optional()?;
        row.map(parse_night).transpose()
    }

    fn get_all_nights(&self) -> RepoResult<Vec<SleepNight>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{NIGHT_SELECT_SQL} ORDER BY night_id DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut nights = Vec::new();
        while let Some(row) = rows.next()? {
            nights.push(parse_night(row_values(row)?)?);
        }
        Ok(nights)
    }

    fn clear(&self) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM daily_sleep_quality_table;", [])?;
        Ok(removed)
    }
}

fn row_values(row: &Row<'_>) -> rusqlite::Result<SleepNight> {
    Ok(SleepNight {
        night_id: row.get("night_id")?,
        start_time_milli: row.get("start_time_milli")?,
        end_time_milli: row.get("end_time_milli")?,
        sleep_quality: row.get("quality_rating")?,
    })
}

fn parse_night(night: SleepNight) -> RepoResult<SleepNight> {
    if night.end_time_milli < night.start_time_milli {
        return Err(RepoError::InvalidData(format!(
            "night {} ends at {} before it starts at {}",
            night.night_id, night.end_time_milli, night.start_time_milli
        )));
    }
    Ok(night)
}
