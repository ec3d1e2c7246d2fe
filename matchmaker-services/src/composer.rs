//! Match composition
//!
//! Turns a candidate's sub-scores into a weighted total, a short reason and
//! a list of highlights, and builds the match record that gets persisted.

use matchmaker_core::{
    AdvisorProfile, CandidateKind, CandidateProfile, InvestorProfile, MatchFactors, MatchRecord,
    StartupProfile, MAX_REASON_LEN,
};
use matchmaker_embedding::EmbeddingProvider;

use crate::scoring::{
    advisor_text, experience_score, funding_score, investor_text, location_score, rating_score,
    sector_score, semantic_score, stage_score, startup_text,
};

/// Maximum number of highlights attached to a match
pub const MAX_HIGHLIGHTS: usize = 4;

const FALLBACK_REASON: &str = "Potential good fit based on profile analysis";

/// Factor weights for investor candidates
#[derive(Debug, Clone, Copy)]
pub struct InvestorWeights {
    pub sector: f64,
    pub stage: f64,
    pub funding: f64,
    pub location: f64,
    pub semantic: f64,
}

impl InvestorWeights {
    pub fn sum(&self) -> f64 {
        self.sector + self.stage + self.funding + self.location + self.semantic
    }
}

/// Factor weights for advisor candidates
#[derive(Debug, Clone, Copy)]
pub struct AdvisorWeights {
    pub industry: f64,
    pub experience: f64,
    pub semantic: f64,
    pub rating: f64,
}

impl AdvisorWeights {
    pub fn sum(&self) -> f64 {
        self.industry + self.experience + self.semantic + self.rating
    }
}

pub const INVESTOR_WEIGHTS: InvestorWeights = InvestorWeights {
    sector: 0.25,
    stage: 0.20,
    funding: 0.20,
    location: 0.10,
    semantic: 0.25,
};

pub const ADVISOR_WEIGHTS: AdvisorWeights = AdvisorWeights {
    industry: 0.30,
    experience: 0.25,
    semantic: 0.30,
    rating: 0.15,
};

/// Raw (unrounded) sub-scores for an investor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestorScores {
    pub sector: f64,
    pub stage: f64,
    pub funding: f64,
    pub location: f64,
    pub semantic: f64,
}

/// Raw (unrounded) sub-scores for an advisor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisorScores {
    pub industry: f64,
    pub experience: f64,
    pub semantic: f64,
    pub rating: f64,
}

/// Sub-scores of one candidate, by kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubScores {
    Investor(InvestorScores),
    Advisor(AdvisorScores),
}

impl SubScores {
    /// Weighted total in [0, 100]
    pub fn total(&self) -> f64 {
        let total = match self {
            SubScores::Investor(s) => {
                let w = INVESTOR_WEIGHTS;
                s.sector * w.sector
                    + s.stage * w.stage
                    + s.funding * w.funding
                    + s.location * w.location
                    + s.semantic * w.semantic
            }
            SubScores::Advisor(s) => {
                let w = ADVISOR_WEIGHTS;
                s.industry * w.industry
                    + s.experience * w.experience
                    + s.semantic * w.semantic
                    + s.rating * w.rating
            }
        };
        total.clamp(0.0, 100.0)
    }

    /// Rounded total as stored on the match
    pub fn rounded_total(&self) -> u8 {
        round_score(self.total())
    }

    /// Rounded per-factor breakdown
    pub fn factors(&self) -> MatchFactors {
        match self {
            SubScores::Investor(s) => MatchFactors {
                sector_match: Some(round_score(s.sector)),
                stage_match: Some(round_score(s.stage)),
                funding_match: Some(round_score(s.funding)),
                location_match: Some(round_score(s.location)),
                semantic_match: Some(round_score(s.semantic)),
                ..Default::default()
            },
            SubScores::Advisor(s) => MatchFactors {
                sector_match: Some(round_score(s.industry)),
                experience_match: Some(round_score(s.experience)),
                rating_match: Some(round_score(s.rating)),
                semantic_match: Some(round_score(s.semantic)),
                ..Default::default()
            },
        }
    }
}

fn round_score(score: f64) -> u8 {
    score.clamp(0.0, 100.0).round() as u8
}

/// Structured sub-scores for an investor; `semantic` is supplied by the caller
pub fn investor_scores(
    startup: &StartupProfile,
    investor: &InvestorProfile,
    semantic: f64,
) -> InvestorScores {
    InvestorScores {
        sector: sector_score(startup.sector, &investor.sectors),
        stage: stage_score(startup.stage, &investor.preferred_stages),
        funding: funding_score(&startup.funding_required, &investor.investment_range),
        location: location_score(&startup.location, &investor.geographic_focus),
        semantic,
    }
}

/// Structured sub-scores for an advisor; `semantic` is supplied by the caller
pub fn advisor_scores(
    startup: &StartupProfile,
    advisor: &AdvisorProfile,
    semantic: f64,
) -> AdvisorScores {
    AdvisorScores {
        industry: sector_score(startup.sector, &advisor.industries),
        experience: experience_score(advisor.years_of_experience),
        semantic,
        rating: rating_score(advisor.average_rating),
    }
}

/// A candidate paired with the sub-scores computed for it
#[derive(Debug, Clone, Copy)]
pub enum ScoredCandidate<'a> {
    Investor(&'a InvestorProfile, InvestorScores),
    Advisor(&'a AdvisorProfile, AdvisorScores),
}

impl<'a> ScoredCandidate<'a> {
    pub fn scores(&self) -> SubScores {
        match self {
            ScoredCandidate::Investor(_, scores) => SubScores::Investor(*scores),
            ScoredCandidate::Advisor(_, scores) => SubScores::Advisor(*scores),
        }
    }

    /// Unrounded weighted total
    pub fn total(&self) -> f64 {
        self.scores().total()
    }

    pub fn candidate_id(&self) -> &'a str {
        match self {
            ScoredCandidate::Investor(investor, _) => &investor.id,
            ScoredCandidate::Advisor(advisor, _) => &advisor.id,
        }
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            ScoredCandidate::Investor(..) => CandidateKind::Investor,
            ScoredCandidate::Advisor(..) => CandidateKind::Advisor,
        }
    }
}

/// Run every scorer for one candidate
pub async fn score_candidate<'a>(
    provider: &dyn EmbeddingProvider,
    startup: &StartupProfile,
    candidate: &'a CandidateProfile,
) -> ScoredCandidate<'a> {
    let startup_text = startup_text(startup);

    match candidate {
        CandidateProfile::Investor(investor) => {
            let semantic = semantic_score(provider, &startup_text, &investor_text(investor)).await;
            ScoredCandidate::Investor(investor, investor_scores(startup, investor, semantic))
        }
        CandidateProfile::Advisor(advisor) => {
            let semantic = semantic_score(provider, &startup_text, &advisor_text(advisor)).await;
            ScoredCandidate::Advisor(advisor, advisor_scores(startup, advisor, semantic))
        }
    }
}

/// Human readable reason for the match
pub fn match_reason(scores: &SubScores) -> String {
    let mut reasons: Vec<&str> = Vec::new();

    match scores {
        SubScores::Investor(s) => {
            if s.sector >= 80.0 {
                reasons.push("Strong sector alignment");
            }
            if s.stage >= 80.0 {
                reasons.push("Perfect stage match");
            }
            if s.funding >= 80.0 {
                reasons.push("Funding range fits well");
            }
            if s.semantic >= 70.0 {
                reasons.push("High interest alignment");
            }
        }
        SubScores::Advisor(s) => {
            if s.industry >= 80.0 {
                reasons.push("Industry expertise match");
            }
            if s.experience >= 70.0 {
                reasons.push("Extensive experience");
            }
            if s.semantic >= 70.0 {
                reasons.push("Relevant background");
            }
            if s.rating >= 80.0 {
                reasons.push("Highly rated advisor");
            }
        }
    }

    if reasons.is_empty() {
        return FALLBACK_REASON.to_string();
    }

    truncate_chars(reasons.join(", "), MAX_REASON_LEN)
}

/// Short highlight strings shown next to the match
pub fn match_highlights(scored: &ScoredCandidate<'_>) -> Vec<String> {
    let mut highlights = Vec::new();

    match scored {
        ScoredCandidate::Investor(investor, s) => {
            if s.sector >= 80.0 {
                highlights.push(format!("Invests in {}", join_display(&investor.sectors)));
            }
            if s.stage >= 80.0 {
                highlights.push(format!(
                    "Focuses on {} stage",
                    join_display(&investor.preferred_stages)
                ));
            }
            if investor.previous_investments > 0 {
                highlights.push(format!(
                    "{} previous investments",
                    investor.previous_investments
                ));
            }
        }
        ScoredCandidate::Advisor(advisor, s) => {
            if s.industry >= 80.0 {
                highlights.push(format!("Expert in {}", join_display(&advisor.industries)));
            }
            highlights.push(format!(
                "{}+ years of experience",
                advisor.years_of_experience
            ));
            if advisor.average_rating >= 4.0 {
                highlights.push(format!("{:.1}⭐ rating", advisor.average_rating));
            }
            if !advisor.specializations.is_empty() {
                let top: Vec<&str> = advisor
                    .specializations
                    .iter()
                    .take(2)
                    .map(String::as_str)
                    .collect();
                highlights.push(format!("Specializes in {}", top.join(", ")));
            }
        }
    }

    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

/// Build the "Recommended" match record for a scored candidate
pub fn compose_match(startup: &StartupProfile, scored: &ScoredCandidate<'_>) -> MatchRecord {
    let scores = scored.scores();

    MatchRecord::new(
        startup.id.clone(),
        scored.candidate_id(),
        scored.kind(),
        scores.rounded_total(),
        scores.factors(),
        match_reason(&scores),
        match_highlights(scored),
    )
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchmaker_core::{Availability, FundingRange, Sector, Stage};

    fn investor() -> InvestorProfile {
        InvestorProfile {
            id: "i1".to_string(),
            name: "Northwind Ventures".to_string(),
            sectors: vec![Sector::Fintech, Sector::SaaS],
            preferred_stages: vec![Stage::Seed],
            investment_range: FundingRange::new(100_000.0, 500_000.0),
            geographic_focus: vec![],
            bio: String::new(),
            looking_for: None,
            previous_investments: 12,
            is_active: true,
        }
    }

    fn advisor(years: f64, rating: f64) -> AdvisorProfile {
        AdvisorProfile {
            id: "a1".to_string(),
            name: "Grace".to_string(),
            industries: vec![Sector::Fintech],
            years_of_experience: years,
            bio: "Operator".to_string(),
            specializations: vec![
                "Growth Strategy".to_string(),
                "Operations".to_string(),
                "Legal & Compliance".to_string(),
            ],
            expertise: vec![],
            average_rating: rating,
            availability: Availability::Available,
            is_active: true,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        assert!((INVESTOR_WEIGHTS.sum() - 1.0).abs() < 1e-12);
        assert!((ADVISOR_WEIGHTS.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_investor_total_is_weighted_sum() {
        let scores = SubScores::Investor(InvestorScores {
            sector: 100.0,
            stage: 75.0,
            funding: 40.0,
            location: 50.0,
            semantic: 60.0,
        });
        let expected = 100.0 * 0.25 + 75.0 * 0.20 + 40.0 * 0.20 + 50.0 * 0.10 + 60.0 * 0.25;
        assert!((scores.total() - expected).abs() < 1e-9);
        assert_eq!(scores.rounded_total(), 68);
    }

    #[test]
    fn test_advisor_total_is_weighted_sum() {
        let scores = SubScores::Advisor(AdvisorScores {
            industry: 50.0,
            experience: 100.0,
            semantic: 0.0,
            rating: 80.0,
        });
        // 15 + 25 + 0 + 12
        assert!((scores.total() - 52.0).abs() < 1e-9);
        assert_eq!(scores.rounded_total(), 52);
    }

    #[test]
    fn test_total_stays_in_range_at_extremes() {
        let max = SubScores::Investor(InvestorScores {
            sector: 100.0,
            stage: 100.0,
            funding: 100.0,
            location: 100.0,
            semantic: 100.0,
        });
        assert_eq!(max.rounded_total(), 100);

        let min = SubScores::Advisor(AdvisorScores {
            industry: 0.0,
            experience: 0.0,
            semantic: 0.0,
            rating: 0.0,
        });
        assert_eq!(min.rounded_total(), 0);
    }

    #[test]
    fn test_factors_only_include_applicable_entries() {
        let scores = SubScores::Advisor(AdvisorScores {
            industry: 100.0,
            experience: 62.5,
            semantic: 33.3,
            rating: 80.0,
        });
        let factors = scores.factors();
        assert_eq!(factors.sector_match, Some(100));
        assert_eq!(factors.experience_match, Some(63));
        assert_eq!(factors.semantic_match, Some(33));
        assert_eq!(factors.rating_match, Some(80));
        assert!(factors.stage_match.is_none());
        assert!(factors.funding_match.is_none());
        assert!(factors.location_match.is_none());
    }

    #[test]
    fn test_investor_reason_and_highlights() {
        let investor = investor();
        let scored = ScoredCandidate::Investor(
            &investor,
            InvestorScores {
                sector: 100.0,
                stage: 100.0,
                funding: 20.0,
                location: 50.0,
                semantic: 75.0,
            },
        );

        assert_eq!(
            match_reason(&scored.scores()),
            "Strong sector alignment, Perfect stage match, High interest alignment"
        );
        assert_eq!(
            match_highlights(&scored),
            vec![
                "Invests in Fintech, SaaS".to_string(),
                "Focuses on Seed stage".to_string(),
                "12 previous investments".to_string(),
            ]
        );
    }

    #[test]
    fn test_fallback_reason() {
        let scores = SubScores::Investor(InvestorScores {
            sector: 50.0,
            stage: 75.0,
            funding: 10.0,
            location: 30.0,
            semantic: 10.0,
        });
        assert_eq!(match_reason(&scores), FALLBACK_REASON);
    }

    #[test]
    fn test_advisor_highlights_are_capped_and_ordered() {
        let advisor = advisor(15.0, 4.5);
        let scores = advisor_scores(
            &StartupProfile {
                id: "s1".to_string(),
                name: "PayFlow".to_string(),
                sector: Sector::Fintech,
                stage: Stage::Seed,
                funding_required: FundingRange::new(1.0, 2.0),
                description: String::new(),
                tags: vec![],
                location: String::new(),
                is_active: true,
            },
            &advisor,
            0.0,
        );
        let scored = ScoredCandidate::Advisor(&advisor, scores);

        let highlights = match_highlights(&scored);
        assert_eq!(highlights.len(), MAX_HIGHLIGHTS);
        assert_eq!(highlights[0], "Expert in Fintech");
        assert_eq!(highlights[1], "15+ years of experience");
        assert_eq!(highlights[2], "4.5⭐ rating");
        assert_eq!(highlights[3], "Specializes in Growth Strategy, Operations");

        assert_eq!(
            match_reason(&scored.scores()),
            "Industry expertise match, Extensive experience, Highly rated advisor"
        );
    }

    #[test]
    fn test_low_rated_advisor_has_no_rating_highlight() {
        let advisor = advisor(3.0, 3.9);
        let scored = ScoredCandidate::Advisor(
            &advisor,
            AdvisorScores {
                industry: 0.0,
                experience: 15.0,
                semantic: 0.0,
                rating: 78.0,
            },
        );
        let highlights = match_highlights(&scored);
        assert!(!highlights.iter().any(|h| h.contains('⭐')));
        assert_eq!(highlights[0], "3+ years of experience");
    }

    #[test]
    fn test_compose_match_builds_recommended_record() {
        let startup = StartupProfile {
            id: "s1".to_string(),
            name: "PayFlow".to_string(),
            sector: Sector::Fintech,
            stage: Stage::Seed,
            funding_required: FundingRange::new(50_000.0, 200_000.0),
            description: "payments API for SMBs".to_string(),
            tags: vec![],
            location: "Austin".to_string(),
            is_active: true,
        };
        let investor = investor();
        let scored = ScoredCandidate::Investor(&investor, investor_scores(&startup, &investor, 0.0));

        let record = compose_match(&startup, &scored);
        assert_eq!(record.startup_id, "s1");
        assert_eq!(record.candidate_id, "i1");
        assert_eq!(record.candidate_kind, CandidateKind::Investor);
        // 25 + 20 + 20 + 5 + 0
        assert_eq!(record.score, 70);
        assert!(record.reason.len() <= MAX_REASON_LEN);
    }
}
