//! Match Generator
//!
//! Orchestrates one generation run for a startup: fetch the candidate pools,
//! score every candidate, rank, and atomically replace the stored match set.
//! The investor and advisor pipelines run concurrently and fail independently.

use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use matchmaker_core::{
    CandidateKind, CandidateProfile, MatchError, MatchRecord, MatchResult, StartupProfile,
};
use matchmaker_embedding::EmbeddingProvider;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::composer::{compose_match, score_candidate};
use crate::store::MatchStore;

/// Generation tuning
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Minimum weighted total a candidate needs to be persisted
    pub min_score: f64,
    /// Maximum number of matches kept per (startup, kind)
    pub top_n: usize,
    /// How many candidates are scored at once
    pub scoring_concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_score: 30.0,
            top_n: 20,
            scoring_concurrency: 8,
        }
    }
}

impl GeneratorConfig {
    /// Read `MATCH_MIN_SCORE`, `MATCH_TOP_N` and `MATCH_SCORING_CONCURRENCY`,
    /// keeping the default for anything missing or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            min_score: env_or("MATCH_MIN_SCORE", defaults.min_score)
                .clamp(0.0, 100.0),
            top_n: env_or("MATCH_TOP_N", defaults.top_n),
            scoring_concurrency: env_or("MATCH_SCORING_CONCURRENCY", defaults.scoring_concurrency)
                .max(1),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparsable {}={:?}, using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Result of one kind's pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KindOutcome {
    /// Pipeline ran; the stored set (possibly empty)
    Completed { matches: Vec<MatchRecord> },
    /// Pipeline could not finish; the previous set is untouched
    Failed { error: String },
}

impl KindOutcome {
    /// Persisted matches, empty when the pipeline failed
    pub fn matches(&self) -> &[MatchRecord] {
        match self {
            KindOutcome::Completed { matches } => matches,
            KindOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, KindOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            KindOutcome::Completed { .. } => None,
            KindOutcome::Failed { error } => Some(error),
        }
    }
}

impl From<MatchResult<Vec<MatchRecord>>> for KindOutcome {
    fn from(result: MatchResult<Vec<MatchRecord>>) -> Self {
        match result {
            Ok(matches) => KindOutcome::Completed { matches },
            Err(e) => KindOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Outcome of a full generation run
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedMatches {
    pub startup_id: String,
    pub investor_matches: KindOutcome,
    pub advisor_matches: KindOutcome,
}

/// Keep totals at or above `min_score`, order by stored score descending
/// (ties keep pool order) and cap at `top_n`
pub fn rank_and_truncate(
    scored: Vec<(f64, MatchRecord)>,
    min_score: f64,
    top_n: usize,
) -> Vec<MatchRecord> {
    let mut kept: Vec<(f64, MatchRecord)> = scored
        .into_iter()
        .filter(|(total, _)| *total >= min_score)
        .collect();

    // sort_by is stable; candidates whose totals round to the same score tie
    kept.sort_by(|a, b| b.1.score.cmp(&a.1.score));
    kept.truncate(top_n);

    kept.into_iter().map(|(_, record)| record).collect()
}

/// Generates and persists ranked match sets
pub struct MatchGenerator {
    store: Arc<dyn MatchStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: GeneratorConfig,
    /// Serializes the replace step per (startup, kind)
    replace_locks: DashMap<(String, CandidateKind), Arc<Mutex<()>>>,
}

impl MatchGenerator {
    pub fn new(
        store: Arc<dyn MatchStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
            replace_locks: DashMap::new(),
        }
    }

    /// Regenerate both investor and advisor matches for a startup
    ///
    /// Fails as a whole only when the startup is missing or malformed; any
    /// other failure is reported on the affected kind.
    #[instrument(skip(self))]
    pub async fn generate_matches(&self, startup_id: &str) -> MatchResult<GeneratedMatches> {
        let startup = self.load_startup(startup_id).await?;

        let (investors, advisors) = tokio::join!(
            self.run_kind(&startup, CandidateKind::Investor),
            self.run_kind(&startup, CandidateKind::Advisor),
        );

        let generated = GeneratedMatches {
            startup_id: startup.id.clone(),
            investor_matches: investors.into(),
            advisor_matches: advisors.into(),
        };

        info!(
            "Generated matches for {}: {} investors, {} advisors",
            startup.id,
            generated.investor_matches.matches().len(),
            generated.advisor_matches.matches().len()
        );
        Ok(generated)
    }

    /// Regenerate a single kind's matches for a startup
    #[instrument(skip(self))]
    pub async fn generate_for_kind(
        &self,
        startup_id: &str,
        kind: CandidateKind,
    ) -> MatchResult<Vec<MatchRecord>> {
        let startup = self.load_startup(startup_id).await?;
        self.run_kind(&startup, kind).await
    }

    async fn load_startup(&self, startup_id: &str) -> MatchResult<StartupProfile> {
        let startup = self
            .store
            .load_startup(startup_id)
            .await?
            .ok_or_else(|| MatchError::not_found(format!("Startup not found: {}", startup_id)))?;

        startup.validate()?;
        Ok(startup)
    }

    async fn run_kind(
        &self,
        startup: &StartupProfile,
        kind: CandidateKind,
    ) -> MatchResult<Vec<MatchRecord>> {
        let exclude_unavailable = kind == CandidateKind::Advisor;
        let pool = self
            .store
            .list_active_candidates(kind, exclude_unavailable)
            .await
            .inspect_err(|e| warn!("Failed to load {} pool: {}", kind, e))?;

        let candidates: Vec<CandidateProfile> = pool
            .into_iter()
            .filter(|candidate| match candidate.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping {} {}: {}", kind, candidate.id(), e);
                    false
                }
            })
            .collect();

        debug!("Scoring {} {} candidates", candidates.len(), kind);

        let embedder = self.embedder.as_ref();
        let scored: Vec<(f64, MatchRecord)> = stream::iter(candidates)
            .map(|candidate| async move {
                let scored = score_candidate(embedder, startup, &candidate).await;
                (scored.total(), compose_match(startup, &scored))
            })
            .buffered(self.config.scoring_concurrency.max(1))
            .collect()
            .await;

        let ranked = rank_and_truncate(scored, self.config.min_score, self.config.top_n);

        let key = (startup.id.clone(), kind);
        let lock = self.replace_locks.entry(key.clone()).or_default().clone();
        let stored = {
            let _guard = lock.lock().await;
            self.store.replace_match_set(&startup.id, kind, ranked).await
        };

        // Drop the entry once no other run holds or waits on it
        drop(lock);
        self.replace_locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        stored.inspect_err(|e| warn!("Failed to store {} matches for {}: {}", kind, startup.id, e))
    }
}
