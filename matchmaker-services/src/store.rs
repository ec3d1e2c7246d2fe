//! Match Store
//!
//! The storage boundary of the engine. `MatchStore` is everything the
//! generator and match service need from the document store; `SqliteMatchStore`
//! implements it on SQLite, with profiles kept as JSON documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matchmaker_core::{
    CandidateKind, CandidateProfile, MatchError, MatchQuery, MatchRecord, MatchResult,
    MatchStats, MatchStatus, StartupProfile,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Which side of a match a listing is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOwner {
    /// Matches generated for a startup
    Startup(String),
    /// Matches in which a candidate was recommended
    Candidate { id: String, kind: CandidateKind },
}

/// Storage capabilities consumed by the engine
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fetch a startup profile by id
    async fn load_startup(&self, startup_id: &str) -> MatchResult<Option<StartupProfile>>;

    /// All active candidates of `kind`, in pool (insertion) order
    async fn list_active_candidates(
        &self,
        kind: CandidateKind,
        exclude_unavailable: bool,
    ) -> MatchResult<Vec<CandidateProfile>>;

    /// Delete every match for a (startup, kind) pair
    async fn delete_matches(&self, startup_id: &str, kind: CandidateKind) -> MatchResult<usize>;

    /// Insert a batch of matches
    async fn bulk_insert_matches(&self, records: &[MatchRecord]) -> MatchResult<usize>;

    /// Atomically replace the match set of a (startup, kind) pair
    ///
    /// Observers see either the previous set or the new one, never an empty
    /// window in between.
    async fn replace_match_set(
        &self,
        startup_id: &str,
        kind: CandidateKind,
        records: Vec<MatchRecord>,
    ) -> MatchResult<Vec<MatchRecord>>;

    /// Fetch a single match by id (active or not)
    async fn get_match(&self, match_id: &str) -> MatchResult<Option<MatchRecord>>;

    /// Persist status / notes / timestamps / active flag of an existing match
    async fn update_match(&self, record: &MatchRecord) -> MatchResult<()>;

    /// Page through active matches, highest score first, newest first on ties
    ///
    /// Returns the total number of matching records alongside the page.
    async fn query_matches(
        &self,
        owner: &MatchOwner,
        query: &MatchQuery,
    ) -> MatchResult<(usize, Vec<MatchRecord>)>;

    /// Per-kind statistics over a startup's active matches
    async fn match_stats(&self, startup_id: &str) -> MatchResult<Vec<MatchStats>>;
}

fn db_err(e: rusqlite::Error) -> MatchError {
    MatchError::storage(e.to_string())
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

const MATCH_COLUMNS: &str = "id, startup_id, candidate_id, candidate_kind, match_type, score, \
     factors, reason, highlights, status, notes, is_active, viewed_at, contacted_at, \
     created_at, updated_at";

/// SQLite-backed store
pub struct SqliteMatchStore {
    conn: Mutex<Connection>,
}

impl SqliteMatchStore {
    /// Open (or create) the store at `db_path`
    ///
    /// Creates the database file and tables if they don't exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> MatchResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MatchError::storage(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path.as_ref()).map_err(db_err)?;
        info!("Opened match store at {:?}", db_path.as_ref());

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn new_in_memory() -> MatchResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> MatchResult<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS startups (
                id TEXT PRIMARY KEY,
                is_active INTEGER NOT NULL,
                data JSON NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS candidates (
                kind TEXT NOT NULL,
                id TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                is_available INTEGER NOT NULL,
                data JSON NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (kind, id)
            );

            CREATE INDEX IF NOT EXISTS idx_candidates_pool
            ON candidates(kind, is_active, is_available);

            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                startup_id TEXT NOT NULL,
                candidate_id TEXT NOT NULL,
                candidate_kind TEXT NOT NULL,
                match_type TEXT NOT NULL,
                score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
                factors JSON NOT NULL,
                reason TEXT NOT NULL,
                highlights JSON NOT NULL,
                status TEXT NOT NULL,
                notes TEXT,
                is_active INTEGER NOT NULL,
                viewed_at INTEGER,
                contacted_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_matches_startup
            ON matches(startup_id, match_type, score DESC);

            CREATE INDEX IF NOT EXISTS idx_matches_candidate
            ON matches(candidate_id, candidate_kind, score DESC);

            CREATE INDEX IF NOT EXISTS idx_matches_status
            ON matches(status, created_at DESC);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    /// Insert or replace a startup document
    pub fn upsert_startup(&self, startup: &StartupProfile) -> MatchResult<()> {
        let data = serde_json::to_string(startup)?;
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO startups (id, is_active, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                is_active = excluded.is_active,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
            params![startup.id, startup.is_active, data, to_millis(Utc::now())],
        )
        .map_err(db_err)?;

        Ok(())
    }

    /// Insert or replace a candidate document. Updating keeps the
    /// candidate's original position in the pool.
    pub fn upsert_candidate(&self, candidate: &CandidateProfile) -> MatchResult<()> {
        let data = serde_json::to_string(candidate)?;
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO candidates (kind, id, is_active, is_available, data, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(kind, id) DO UPDATE SET
                is_active = excluded.is_active,
                is_available = excluded.is_available,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
            params![
                candidate.kind().as_str(),
                candidate.id(),
                candidate.is_active(),
                candidate.is_available(),
                data,
                to_millis(Utc::now()),
            ],
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn insert_match(conn: &Connection, record: &MatchRecord) -> MatchResult<()> {
        let factors = serde_json::to_string(&record.factors)?;
        let highlights = serde_json::to_string(&record.highlights)?;

        conn.execute(
            &format!(
                "INSERT INTO matches ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                MATCH_COLUMNS
            ),
            params![
                record.id,
                record.startup_id,
                record.candidate_id,
                record.candidate_kind.as_str(),
                record.match_type.as_str(),
                record.score,
                factors,
                record.reason,
                highlights,
                record.status.as_str(),
                record.notes,
                record.is_active,
                record.viewed_at.map(to_millis),
                record.contacted_at.map(to_millis),
                to_millis(record.created_at),
                to_millis(record.updated_at),
            ],
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn row_to_match(row: &Row<'_>) -> rusqlite::Result<RawMatchRow> {
        Ok(RawMatchRow {
            id: row.get(0)?,
            startup_id: row.get(1)?,
            candidate_id: row.get(2)?,
            candidate_kind: row.get(3)?,
            match_type: row.get(4)?,
            score: row.get(5)?,
            factors: row.get(6)?,
            reason: row.get(7)?,
            highlights: row.get(8)?,
            status: row.get(9)?,
            notes: row.get(10)?,
            is_active: row.get(11)?,
            viewed_at: row.get(12)?,
            contacted_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

/// A match row before enum / JSON decoding
struct RawMatchRow {
    id: String,
    startup_id: String,
    candidate_id: String,
    candidate_kind: String,
    match_type: String,
    score: u8,
    factors: String,
    reason: String,
    highlights: String,
    status: String,
    notes: Option<String>,
    is_active: bool,
    viewed_at: Option<i64>,
    contacted_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<RawMatchRow> for MatchRecord {
    type Error = MatchError;

    fn try_from(row: RawMatchRow) -> Result<Self, Self::Error> {
        let parse_kind = |s: &str| s.parse::<CandidateKind>().map_err(MatchError::serialization);

        Ok(MatchRecord {
            candidate_kind: parse_kind(&row.candidate_kind)?,
            match_type: parse_kind(&row.match_type)?,
            factors: serde_json::from_str(&row.factors)?,
            highlights: serde_json::from_str(&row.highlights)?,
            status: row
                .status
                .parse::<MatchStatus>()
                .map_err(MatchError::serialization)?,
            id: row.id,
            startup_id: row.startup_id,
            candidate_id: row.candidate_id,
            score: row.score,
            reason: row.reason,
            notes: row.notes,
            is_active: row.is_active,
            viewed_at: row.viewed_at.map(from_millis),
            contacted_at: row.contacted_at.map(from_millis),
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
        })
    }
}

#[async_trait]
impl MatchStore for SqliteMatchStore {
    #[instrument(skip(self))]
    async fn load_startup(&self, startup_id: &str) -> MatchResult<Option<StartupProfile>> {
        let conn = self.conn.lock();

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM startups WHERE id = ?1",
                params![startup_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        match data {
            Some(data) => serde_json::from_str(&data).map(Some).map_err(|e| {
                MatchError::invalid_profile(startup_id, format!("undecodable document: {}", e))
            }),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_active_candidates(
        &self,
        kind: CandidateKind,
        exclude_unavailable: bool,
    ) -> MatchResult<Vec<CandidateProfile>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, data FROM candidates
                WHERE kind = ?1 AND is_active = 1 AND (?2 = 0 OR is_available = 1)
                ORDER BY rowid
                "#,
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![kind.as_str(), exclude_unavailable], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;

        let mut candidates = Vec::new();
        for row in rows {
            let (id, data) = row.map_err(db_err)?;
            match serde_json::from_str::<CandidateProfile>(&data) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!("Skipping undecodable {} {}: {}", kind, id, e),
            }
        }

        debug!("Loaded {} active {} candidates", candidates.len(), kind);
        Ok(candidates)
    }

    async fn delete_matches(&self, startup_id: &str, kind: CandidateKind) -> MatchResult<usize> {
        let conn = self.conn.lock();

        conn.execute(
            "DELETE FROM matches WHERE startup_id = ?1 AND match_type = ?2",
            params![startup_id, kind.as_str()],
        )
        .map_err(db_err)
    }

    async fn bulk_insert_matches(&self, records: &[MatchRecord]) -> MatchResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        for record in records {
            Self::insert_match(&tx, record)?;
        }

        tx.commit().map_err(db_err)?;
        Ok(records.len())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn replace_match_set(
        &self,
        startup_id: &str,
        kind: CandidateKind,
        records: Vec<MatchRecord>,
    ) -> MatchResult<Vec<MatchRecord>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let deleted = tx
            .execute(
                "DELETE FROM matches WHERE startup_id = ?1 AND match_type = ?2",
                params![startup_id, kind.as_str()],
            )
            .map_err(db_err)?;

        for record in &records {
            Self::insert_match(&tx, record)?;
        }

        // Dropping the transaction without commit rolls back the delete
        tx.commit().map_err(db_err)?;

        info!(
            "Replaced {} {} matches for startup {} with {}",
            deleted,
            kind,
            startup_id,
            records.len()
        );
        Ok(records)
    }

    async fn get_match(&self, match_id: &str) -> MatchResult<Option<MatchRecord>> {
        let conn = self.conn.lock();

        let raw = conn
            .query_row(
                &format!("SELECT {} FROM matches WHERE id = ?1", MATCH_COLUMNS),
                params![match_id],
                Self::row_to_match,
            )
            .optional()
            .map_err(db_err)?;

        raw.map(MatchRecord::try_from).transpose()
    }

    async fn update_match(&self, record: &MatchRecord) -> MatchResult<()> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                r#"
                UPDATE matches
                SET status = ?2, notes = ?3, is_active = ?4, viewed_at = ?5,
                    contacted_at = ?6, updated_at = ?7
                WHERE id = ?1
                "#,
                params![
                    record.id,
                    record.status.as_str(),
                    record.notes,
                    record.is_active,
                    record.viewed_at.map(to_millis),
                    record.contacted_at.map(to_millis),
                    to_millis(record.updated_at),
                ],
            )
            .map_err(db_err)?;

        if updated == 0 {
            return Err(MatchError::not_found(format!("Match not found: {}", record.id)));
        }
        Ok(())
    }

    async fn query_matches(
        &self,
        owner: &MatchOwner,
        query: &MatchQuery,
    ) -> MatchResult<(usize, Vec<MatchRecord>)> {
        let (owner_clause, owner_id, owner_kind) = match owner {
            MatchOwner::Startup(id) => ("startup_id = ?1 AND (?2 IS NULL OR match_type = ?2)", id, query.kind),
            MatchOwner::Candidate { id, kind } => {
                ("candidate_id = ?1 AND candidate_kind = ?2", id, Some(*kind))
            }
        };
        let where_clause = format!(
            "WHERE {} AND is_active = 1 AND (?3 IS NULL OR status = ?3)",
            owner_clause
        );
        let kind = owner_kind.map(|k| k.as_str());
        let status = query.status.map(|s| s.as_str());

        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM matches {}", where_clause),
                params![owner_id, kind, status],
                |row| row.get(0),
            )
            .map_err(db_err)?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM matches {} ORDER BY score DESC, created_at DESC LIMIT ?4 OFFSET ?5",
                MATCH_COLUMNS, where_clause
            ))
            .map_err(db_err)?;

        let rows = stmt
            .query_map(
                params![
                    owner_id,
                    kind,
                    status,
                    i64::try_from(query.limit()).unwrap_or(i64::MAX),
                    i64::try_from(query.offset()).unwrap_or(i64::MAX)
                ],
                Self::row_to_match,
            )
            .map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(MatchRecord::try_from(row.map_err(db_err)?)?);
        }

        Ok((count as usize, records))
    }

    async fn match_stats(&self, startup_id: &str) -> MatchResult<Vec<MatchStats>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT match_type,
                       COUNT(*),
                       AVG(score),
                       SUM(CASE WHEN status = 'Contacted' THEN 1 ELSE 0 END),
                       SUM(CASE WHEN status = 'Accepted' THEN 1 ELSE 0 END)
                FROM matches
                WHERE startup_id = ?1 AND is_active = 1
                GROUP BY match_type
                ORDER BY match_type DESC
                "#,
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![startup_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(db_err)?;

        let mut stats = Vec::new();
        for row in rows {
            let (kind, total, avg_score, contacted, accepted) = row.map_err(db_err)?;
            stats.push(MatchStats {
                kind: kind.parse().map_err(MatchError::serialization)?,
                total: total as usize,
                avg_score,
                contacted: contacted as usize,
                accepted: accepted as usize,
            });
        }

        Ok(stats)
    }
}
