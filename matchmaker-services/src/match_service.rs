//! Match Service - lifecycle operations on stored matches
//!
//! Listing, status transitions, soft removal and per-kind statistics. Match
//! records are only ever created by the generator.

use std::sync::Arc;

use chrono::Utc;
use matchmaker_core::{
    CandidateKind, MatchError, MatchPage, MatchQuery, MatchRecord, MatchResult, MatchStats,
    MatchStatus, MAX_NOTES_LEN,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::store::{MatchOwner, MatchStore};

/// Requested status change for a match
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: MatchStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Service for managing generated matches
pub struct MatchService {
    store: Arc<dyn MatchStore>,
}

impl MatchService {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self { store }
    }

    /// Active matches for a startup, best first
    #[instrument(skip(self))]
    pub async fn list_for_startup(
        &self,
        startup_id: &str,
        query: &MatchQuery,
    ) -> MatchResult<MatchPage> {
        if self.store.load_startup(startup_id).await?.is_none() {
            return Err(MatchError::not_found(format!(
                "Startup not found: {}",
                startup_id
            )));
        }

        self.page(&MatchOwner::Startup(startup_id.to_string()), query)
            .await
    }

    /// Active matches in which an investor or advisor was recommended
    #[instrument(skip(self))]
    pub async fn list_for_candidate(
        &self,
        candidate_id: &str,
        kind: CandidateKind,
        query: &MatchQuery,
    ) -> MatchResult<MatchPage> {
        let owner = MatchOwner::Candidate {
            id: candidate_id.to_string(),
            kind,
        };
        self.page(&owner, query).await
    }

    async fn page(&self, owner: &MatchOwner, query: &MatchQuery) -> MatchResult<MatchPage> {
        let (count, data) = self.store.query_matches(owner, query).await?;

        Ok(MatchPage {
            count,
            total_pages: count.div_ceil(query.limit()),
            current_page: query.page(),
            data,
        })
    }

    pub async fn get_match(&self, match_id: &str) -> MatchResult<MatchRecord> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| MatchError::not_found(format!("Match not found: {}", match_id)))
    }

    /// Move a match to a new status, optionally replacing its notes
    #[instrument(skip(self, update), fields(status = %update.status))]
    pub async fn update_status(
        &self,
        match_id: &str,
        update: StatusUpdate,
    ) -> MatchResult<MatchRecord> {
        if let Some(notes) = &update.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(MatchError::validation(format!(
                    "Notes must be at most {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }

        let mut record = self.get_match(match_id).await?;
        record.apply_status(update.status, Utc::now());
        if let Some(notes) = update.notes {
            record.notes = Some(notes);
        }

        self.store.update_match(&record).await?;

        info!("Match {} moved to {}", match_id, record.status);
        Ok(record)
    }

    /// Soft delete: the record stays stored but drops out of listings
    pub async fn remove_match(&self, match_id: &str) -> MatchResult<()> {
        let mut record = self.get_match(match_id).await?;
        record.is_active = false;
        record.updated_at = Utc::now();

        self.store.update_match(&record).await?;

        info!("Removed match {}", match_id);
        Ok(())
    }

    pub async fn stats(&self, startup_id: &str) -> MatchResult<Vec<MatchStats>> {
        self.store.match_stats(startup_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteMatchStore;
    use matchmaker_core::{FundingRange, MatchFactors, Sector, Stage, StartupProfile};

    async fn setup() -> (MatchService, Vec<MatchRecord>) {
        let store = SqliteMatchStore::new_in_memory().expect("Failed to create test store");
        store
            .upsert_startup(&StartupProfile {
                id: "s1".to_string(),
                name: "PayFlow".to_string(),
                sector: Sector::Fintech,
                stage: Stage::Seed,
                funding_required: FundingRange::new(50_000.0, 200_000.0),
                description: String::new(),
                tags: vec![],
                location: String::new(),
                is_active: true,
            })
            .unwrap();

        let records: Vec<MatchRecord> = [("i1", 90), ("i2", 70), ("i3", 50)]
            .into_iter()
            .map(|(id, score)| {
                MatchRecord::new(
                    "s1",
                    id,
                    CandidateKind::Investor,
                    score,
                    MatchFactors::default(),
                    "Strong sector alignment".to_string(),
                    vec![],
                )
            })
            .collect();
        store.bulk_insert_matches(&records).await.unwrap();

        (MatchService::new(Arc::new(store)), records)
    }

    #[tokio::test]
    async fn test_list_for_unknown_startup_is_not_found() {
        let (service, _) = setup().await;
        let result = service
            .list_for_startup("missing", &MatchQuery::default())
            .await;
        assert!(matches!(result, Err(MatchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pagination() {
        let (service, _) = setup().await;
        let query = MatchQuery {
            page: 2,
            limit: 2,
            ..Default::default()
        };

        let page = service.list_for_startup("s1", &query).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].candidate_id, "i3");
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let (service, _) = setup().await;
        let query = MatchQuery {
            page: usize::MAX,
            limit: usize::MAX,
            ..Default::default()
        };

        let page = service.list_for_startup("s1", &query).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, usize::MAX);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_status_timestamps_set_once() {
        let (service, records) = setup().await;
        let id = &records[0].id;

        let viewed = service
            .update_status(
                id,
                StatusUpdate {
                    status: MatchStatus::Viewed,
                    notes: None,
                },
            )
            .await
            .unwrap();
        let first_view = viewed.viewed_at.expect("viewed_at set");
        assert!(viewed.contacted_at.is_none());

        let contacted = service
            .update_status(
                id,
                StatusUpdate {
                    status: MatchStatus::Contacted,
                    notes: Some("Sent intro email".to_string()),
                },
            )
            .await
            .unwrap();
        let first_contact = contacted.contacted_at.expect("contacted_at set");

        service
            .update_status(
                id,
                StatusUpdate {
                    status: MatchStatus::Viewed,
                    notes: None,
                },
            )
            .await
            .unwrap();
        let again = service
            .update_status(
                id,
                StatusUpdate {
                    status: MatchStatus::Contacted,
                    notes: None,
                },
            )
            .await
            .unwrap();

        // Stored with millisecond precision
        assert_eq!(
            again.viewed_at.map(|t| t.timestamp_millis()),
            Some(first_view.timestamp_millis())
        );
        assert_eq!(
            again.contacted_at.map(|t| t.timestamp_millis()),
            Some(first_contact.timestamp_millis())
        );
        // Notes are kept when not provided
        assert_eq!(again.notes.as_deref(), Some("Sent intro email"));
    }

    #[tokio::test]
    async fn test_notes_too_long_rejected() {
        let (service, records) = setup().await;

        let result = service
            .update_status(
                &records[0].id,
                StatusUpdate {
                    status: MatchStatus::Viewed,
                    notes: Some("x".repeat(MAX_NOTES_LEN + 1)),
                },
            )
            .await;
        assert!(matches!(result, Err(MatchError::Validation(_))));

        let unchanged = service.get_match(&records[0].id).await.unwrap();
        assert_eq!(unchanged.status, MatchStatus::Recommended);
    }

    #[tokio::test]
    async fn test_remove_hides_from_listing() {
        let (service, records) = setup().await;
        service.remove_match(&records[0].id).await.unwrap();

        let page = service
            .list_for_startup("s1", &MatchQuery::default())
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert!(page.data.iter().all(|m| m.id != records[0].id));

        // Record retained
        let removed = service.get_match(&records[0].id).await.unwrap();
        assert!(!removed.is_active);
    }

    #[tokio::test]
    async fn test_unknown_match_is_not_found() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.get_match("nope").await,
            Err(MatchError::NotFound(_))
        ));
        assert!(matches!(
            service.remove_match("nope").await,
            Err(MatchError::NotFound(_))
        ));
    }
}
