//! Attribute scorers
//!
//! Every scorer is a pure function of the startup and candidate fields it
//! needs and returns a sub-score in [0, 100]. The semantic scorer is the
//! only one that suspends, since it has to embed both texts.

use matchmaker_core::{
    AdvisorProfile, FundingRange, InvestorProfile, Sector, Stage, StartupProfile,
};
use matchmaker_embedding::{similarity_score, EmbeddingProvider};
use tracing::warn;

/// Score for a sector set that contains the catch-all "Other"
const OTHER_SECTOR_SCORE: f64 = 50.0;
/// Points lost per step of stage distance
const STAGE_STEP_PENALTY: f64 = 25.0;
/// Investor has regions but none overlap the startup's location
const LOCATION_MISS_SCORE: f64 = 30.0;
/// Investor declared no regional preference
const LOCATION_NEUTRAL_SCORE: f64 = 50.0;
/// Years of experience that earn the full experience score
const FULL_EXPERIENCE_YEARS: f64 = 20.0;
const MAX_RATING: f64 = 5.0;

/// Sector (investor) or industry (advisor) match
pub fn sector_score(startup_sector: Sector, candidate_sectors: &[Sector]) -> f64 {
    if candidate_sectors.contains(&startup_sector) {
        100.0
    } else if candidate_sectors.contains(&Sector::Other) {
        OTHER_SECTOR_SCORE
    } else {
        0.0
    }
}

/// Stage proximity: exact membership scores 100, each step away costs 25
pub fn stage_score(startup_stage: Stage, preferred: &[Stage]) -> f64 {
    if preferred.contains(&startup_stage) {
        return 100.0;
    }

    match preferred.iter().map(|s| startup_stage.distance(*s)).min() {
        Some(distance) => (100.0 - distance as f64 * STAGE_STEP_PENALTY).max(0.0),
        None => 0.0,
    }
}

/// Funding fit between what the startup needs and the investor's range
///
/// Outside the range the score falls off linearly with the distance to the
/// investor's midpoint, normalized by the investor's upper bound.
pub fn funding_score(required: &FundingRange, investor: &FundingRange) -> f64 {
    let needed = required.midpoint();

    if investor.contains(needed) {
        return 100.0;
    }

    if investor.max <= 0.0 {
        return 0.0;
    }

    let difference = (needed - investor.midpoint()).abs();
    (100.0 - (difference / investor.max) * 100.0).max(0.0)
}

/// Geographic fit: any case-insensitive substring overlap counts as a hit
pub fn location_score(startup_location: &str, geographic_focus: &[String]) -> f64 {
    let focus: Vec<String> = geographic_focus
        .iter()
        .map(|region| region.trim().to_lowercase())
        .filter(|region| !region.is_empty())
        .collect();

    if focus.is_empty() {
        return LOCATION_NEUTRAL_SCORE;
    }

    let location = startup_location.trim().to_lowercase();
    let hit = !location.is_empty()
        && focus
            .iter()
            .any(|region| location.contains(region.as_str()) || region.contains(location.as_str()));

    if hit { 100.0 } else { LOCATION_MISS_SCORE }
}

/// Linear ramp capped at 20 years
pub fn experience_score(years_of_experience: f64) -> f64 {
    ((years_of_experience / FULL_EXPERIENCE_YEARS) * 100.0).clamp(0.0, 100.0)
}

/// Average rating mapped from 0-5 onto 0-100
pub fn rating_score(average_rating: f64) -> f64 {
    ((average_rating / MAX_RATING) * 100.0).clamp(0.0, 100.0)
}

/// Composite text describing the startup: name, description and tags
pub fn startup_text(startup: &StartupProfile) -> String {
    join_non_empty(
        [startup.name.as_str(), startup.description.as_str()]
            .into_iter()
            .chain(startup.tags.iter().map(String::as_str)),
    )
}

/// Composite text describing an investor: bio, what they look for, sectors
pub fn investor_text(investor: &InvestorProfile) -> String {
    join_non_empty(
        [
            investor.bio.as_str(),
            investor.looking_for.as_deref().unwrap_or(""),
        ]
        .into_iter()
        .chain(investor.sectors.iter().map(|s| s.as_str())),
    )
}

/// Composite text describing an advisor: bio, specializations, expertise
/// areas and industries
pub fn advisor_text(advisor: &AdvisorProfile) -> String {
    join_non_empty(
        std::iter::once(advisor.bio.as_str())
            .chain(advisor.specializations.iter().map(String::as_str))
            .chain(advisor.expertise.iter().map(|e| e.area.as_str()))
            .chain(advisor.industries.iter().map(|s| s.as_str())),
    )
}

fn join_non_empty<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Semantic similarity of two texts on the 0 - 100 scale
///
/// Best effort: any embedding failure degrades the score to 0.
pub async fn semantic_score(
    provider: &dyn EmbeddingProvider,
    startup_text: &str,
    candidate_text: &str,
) -> f64 {
    if startup_text.is_empty() || candidate_text.is_empty() {
        return 0.0;
    }

    let startup_embedding = match provider.embed(startup_text).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!("Startup embedding failed, semantic score degraded to 0: {}", e);
            return 0.0;
        }
    };

    let candidate_embedding = match provider.embed(candidate_text).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!("Candidate embedding failed, semantic score degraded to 0: {}", e);
            return 0.0;
        }
    };

    similarity_score(&startup_embedding, &candidate_embedding)
}
