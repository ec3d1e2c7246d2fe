//! Stored match records and the query/summary types around them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CandidateKind;

/// Maximum length of the generated reason text
pub const MAX_REASON_LEN: usize = 500;

/// Maximum length of user-supplied notes on a match
pub const MAX_NOTES_LEN: usize = 1000;

/// Lifecycle status of a match. Only "Recommended" is ever set by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatchStatus {
    #[default]
    Recommended,
    Viewed,
    Contacted,
    #[serde(rename = "In Discussion")]
    InDiscussion,
    Accepted,
    Rejected,
    Closed,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 7] = [
        MatchStatus::Recommended,
        MatchStatus::Viewed,
        MatchStatus::Contacted,
        MatchStatus::InDiscussion,
        MatchStatus::Accepted,
        MatchStatus::Rejected,
        MatchStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Recommended => "Recommended",
            MatchStatus::Viewed => "Viewed",
            MatchStatus::Contacted => "Contacted",
            MatchStatus::InDiscussion => "In Discussion",
            MatchStatus::Accepted => "Accepted",
            MatchStatus::Rejected => "Rejected",
            MatchStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatchStatus::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown match status: {}", s))
    }
}

/// Per-factor breakdown of a match score (each 0 - 100).
///
/// Only the factors that apply to the candidate kind are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFactors {
    /// Sector match for investors, industry match for advisors
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sector_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stage_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub funding_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub experience_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rating_match: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub semantic_match: Option<u8>,
}

/// A persisted recommendation linking a startup to a candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Store-assigned identifier
    pub id: String,

    pub startup_id: String,

    pub candidate_id: String,

    /// Which collection `candidate_id` refers to
    pub candidate_kind: CandidateKind,

    /// Match partition; always equal to `candidate_kind`
    #[serde(rename = "type")]
    pub match_type: CandidateKind,

    /// Weighted total (0 - 100)
    pub score: u8,

    pub factors: MatchFactors,

    pub reason: String,

    pub highlights: Vec<String>,

    pub status: MatchStatus,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,

    /// False once the match has been removed by a user
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub viewed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contacted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a fresh "Recommended" record with a new identifier
    pub fn new(
        startup_id: impl Into<String>,
        candidate_id: impl Into<String>,
        kind: CandidateKind,
        score: u8,
        factors: MatchFactors,
        reason: String,
        highlights: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            startup_id: startup_id.into(),
            candidate_id: candidate_id.into(),
            candidate_kind: kind,
            match_type: kind,
            score,
            factors,
            reason,
            highlights,
            status: MatchStatus::Recommended,
            notes: None,
            is_active: true,
            viewed_at: None,
            contacted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition. `viewed_at` and `contacted_at` are only
    /// stamped on the first transition into that status.
    pub fn apply_status(&mut self, status: MatchStatus, at: DateTime<Utc>) {
        self.status = status;
        match status {
            MatchStatus::Viewed if self.viewed_at.is_none() => self.viewed_at = Some(at),
            MatchStatus::Contacted if self.contacted_at.is_none() => self.contacted_at = Some(at),
            _ => {}
        }
        self.updated_at = at;
    }
}

/// Filter for listing matches
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub kind: Option<CandidateKind>,
    pub status: Option<MatchStatus>,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

impl MatchQuery {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    /// Page number clamped to at least 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Page size, falling back to the default when unset and capped at
    /// [`Self::MAX_LIMIT`]
    pub fn limit(&self) -> usize {
        if self.limit == 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit.min(Self::MAX_LIMIT)
        }
    }

    /// Rows to skip; saturates for out of range pages
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One page of matches
#[derive(Debug, Clone, Serialize)]
pub struct MatchPage {
    /// Total number of records matching the filter
    pub count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub data: Vec<MatchRecord>,
}

/// Aggregate statistics for one kind of match on a startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub total: usize,
    pub avg_score: f64,
    pub contacted: usize,
    pub accepted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MatchRecord {
        MatchRecord::new(
            "s1",
            "i1",
            CandidateKind::Investor,
            72,
            MatchFactors::default(),
            "Strong sector alignment".to_string(),
            vec![],
        )
    }

    #[test]
    fn test_new_record_is_recommended_and_active() {
        let record = record();
        assert_eq!(record.status, MatchStatus::Recommended);
        assert_eq!(record.match_type, record.candidate_kind);
        assert!(record.is_active);
    }

    #[test]
    fn test_viewed_timestamp_is_set_once() {
        let mut record = record();
        let first = Utc::now();
        record.apply_status(MatchStatus::Viewed, first);
        record.apply_status(MatchStatus::InDiscussion, first);
        record.apply_status(MatchStatus::Viewed, first + chrono::Duration::hours(1));

        assert_eq!(record.viewed_at, Some(first));
        assert!(record.contacted_at.is_none());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in discussion".parse::<MatchStatus>(), Ok(MatchStatus::InDiscussion));
        assert!("archived".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn test_query_pagination_defaults() {
        let query = MatchQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 0);

        let query = MatchQuery {
            page: 3,
            limit: 5,
            ..Default::default()
        };
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn test_query_pagination_extremes() {
        let query = MatchQuery {
            page: usize::MAX,
            limit: usize::MAX,
            ..Default::default()
        };
        assert_eq!(query.limit(), MatchQuery::MAX_LIMIT);
        assert_eq!(query.offset(), usize::MAX);

        let query = MatchQuery {
            page: 0,
            limit: 250,
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_factors_skip_absent_entries() {
        let factors = MatchFactors {
            sector_match: Some(100),
            ..Default::default()
        };
        let json = serde_json::to_string(&factors).unwrap();
        assert_eq!(json, r#"{"sector_match":100}"#);
    }
}
