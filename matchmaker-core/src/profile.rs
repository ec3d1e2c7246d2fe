//! Startup and candidate profile structures
//!
//! Profiles are owned by the external profile CRUD layer. The engine only
//! reads them, so every type here is a plain serde document.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CandidateKind, MatchError, MatchResult};

/// Industry sector shared by startups, investors and advisors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Fintech,
    Edtech,
    Healthtech,
    #[serde(rename = "E-commerce")]
    ECommerce,
    SaaS,
    #[serde(rename = "AI/ML")]
    AiMl,
    Blockchain,
    IoT,
    Cleantech,
    Agritech,
    Foodtech,
    Proptech,
    Logistics,
    Entertainment,
    /// Catch-all; earns partial sector credit
    Other,
}

impl Sector {
    pub const ALL: [Sector; 15] = [
        Sector::Fintech,
        Sector::Edtech,
        Sector::Healthtech,
        Sector::ECommerce,
        Sector::SaaS,
        Sector::AiMl,
        Sector::Blockchain,
        Sector::IoT,
        Sector::Cleantech,
        Sector::Agritech,
        Sector::Foodtech,
        Sector::Proptech,
        Sector::Logistics,
        Sector::Entertainment,
        Sector::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Fintech => "Fintech",
            Sector::Edtech => "Edtech",
            Sector::Healthtech => "Healthtech",
            Sector::ECommerce => "E-commerce",
            Sector::SaaS => "SaaS",
            Sector::AiMl => "AI/ML",
            Sector::Blockchain => "Blockchain",
            Sector::IoT => "IoT",
            Sector::Cleantech => "Cleantech",
            Sector::Agritech => "Agritech",
            Sector::Foodtech => "Foodtech",
            Sector::Proptech => "Proptech",
            Sector::Logistics => "Logistics",
            Sector::Entertainment => "Entertainment",
            Sector::Other => "Other",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sector::ALL
            .iter()
            .find(|sector| sector.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown sector: {}", s))
    }
}

/// Funding stage. Declaration order is the stage order used for
/// proximity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Idea,
    #[serde(rename = "Pre-seed")]
    PreSeed,
    Seed,
    #[serde(rename = "Series A")]
    SeriesA,
    #[serde(rename = "Series B")]
    SeriesB,
    #[serde(rename = "Series C+")]
    SeriesCPlus,
    Growth,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Idea,
        Stage::PreSeed,
        Stage::Seed,
        Stage::SeriesA,
        Stage::SeriesB,
        Stage::SeriesCPlus,
        Stage::Growth,
    ];

    /// Position along the stage order (Idea = 0)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Number of steps between two stages
    pub fn distance(&self, other: Stage) -> usize {
        self.index().abs_diff(other.index())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idea => "Idea",
            Stage::PreSeed => "Pre-seed",
            Stage::Seed => "Seed",
            Stage::SeriesA => "Series A",
            Stage::SeriesB => "Series B",
            Stage::SeriesCPlus => "Series C+",
            Stage::Growth => "Growth",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown stage: {}", s))
    }
}

/// Monetary range (USD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingRange {
    pub min: f64,
    pub max: f64,
}

impl FundingRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Arithmetic mean of the bounds
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Inclusive containment
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }

    fn validate(&self, owner: &str, label: &str) -> MatchResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(MatchError::invalid_profile(
                owner,
                format!("{} bounds must be finite", label),
            ));
        }
        if self.min < 0.0 || self.max < 0.0 {
            return Err(MatchError::invalid_profile(
                owner,
                format!("{} bounds must not be negative", label),
            ));
        }
        if self.min > self.max {
            return Err(MatchError::invalid_profile(
                owner,
                format!("{} min {} exceeds max {}", label, self.min, self.max),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn require_id(id: &str) -> MatchResult<()> {
    if id.trim().is_empty() {
        return Err(MatchError::invalid_profile("<empty>", "identifier is empty"));
    }
    Ok(())
}

/// A startup looking for investors and advisors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupProfile {
    /// Unique identifier
    pub id: String,

    /// Company name
    pub name: String,

    pub sector: Sector,

    pub stage: Stage,

    /// Amount the startup is looking to raise
    pub funding_required: FundingRange,

    /// Free-text pitch / description
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form location, e.g. "Berlin, Germany"
    #[serde(default)]
    pub location: String,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl StartupProfile {
    /// Check the fields the scorers depend on
    pub fn validate(&self) -> MatchResult<()> {
        require_id(&self.id)?;
        self.funding_required.validate(&self.id, "funding_required")
    }
}

/// An investor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub id: String,

    pub name: String,

    /// Sectors the investor invests in
    #[serde(default)]
    pub sectors: Vec<Sector>,

    /// Stages the investor prefers to enter at
    #[serde(default)]
    pub preferred_stages: Vec<Stage>,

    /// Typical ticket size
    pub investment_range: FundingRange,

    /// Regions the investor focuses on. Empty means no preference.
    #[serde(default)]
    pub geographic_focus: Vec<String>,

    #[serde(default)]
    pub bio: String,

    /// What the investor is looking for, in their own words
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub looking_for: Option<String>,

    /// Number of previous investments on record
    #[serde(default)]
    pub previous_investments: u32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl InvestorProfile {
    pub fn validate(&self) -> MatchResult<()> {
        require_id(&self.id)?;
        self.investment_range.validate(&self.id, "investment_range")
    }
}

/// Availability of an advisor for new engagements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Availability {
    #[default]
    Available,
    Limited,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl Availability {
    /// Whether the advisor may be recommended at all
    pub fn is_available(&self) -> bool {
        !matches!(self, Availability::NotAvailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Limited => "Limited",
            Availability::NotAvailable => "Not Available",
        }
    }
}

/// An area of expertise declared by an advisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expertise {
    pub area: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub years_of_experience: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// An advisor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorProfile {
    pub id: String,

    pub name: String,

    /// Industries the advisor has worked in
    #[serde(default)]
    pub industries: Vec<Sector>,

    pub years_of_experience: f64,

    pub bio: String,

    /// e.g. "Growth Strategy", "Finance & Fundraising"
    #[serde(default)]
    pub specializations: Vec<String>,

    #[serde(default)]
    pub expertise: Vec<Expertise>,

    /// Mean of all review ratings (0 - 5), maintained by the review flow
    #[serde(default)]
    pub average_rating: f64,

    #[serde(default)]
    pub availability: Availability,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl AdvisorProfile {
    pub fn validate(&self) -> MatchResult<()> {
        require_id(&self.id)?;
        if !self.years_of_experience.is_finite() || self.years_of_experience < 0.0 {
            return Err(MatchError::invalid_profile(
                &self.id,
                format!("years_of_experience {} is invalid", self.years_of_experience),
            ));
        }
        if !(0.0..=5.0).contains(&self.average_rating) {
            return Err(MatchError::invalid_profile(
                &self.id,
                format!("average_rating {} is outside 0-5", self.average_rating),
            ));
        }
        Ok(())
    }
}

/// A candidate that can be scored against a startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CandidateProfile {
    Investor(InvestorProfile),
    Advisor(AdvisorProfile),
}

impl CandidateProfile {
    pub fn id(&self) -> &str {
        match self {
            CandidateProfile::Investor(investor) => &investor.id,
            CandidateProfile::Advisor(advisor) => &advisor.id,
        }
    }

    pub fn kind(&self) -> CandidateKind {
        match self {
            CandidateProfile::Investor(_) => CandidateKind::Investor,
            CandidateProfile::Advisor(_) => CandidateKind::Advisor,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            CandidateProfile::Investor(investor) => investor.is_active,
            CandidateProfile::Advisor(advisor) => advisor.is_active,
        }
    }

    /// Advisors marked "Not Available" are never eligible
    pub fn is_available(&self) -> bool {
        match self {
            CandidateProfile::Investor(_) => true,
            CandidateProfile::Advisor(advisor) => advisor.availability.is_available(),
        }
    }

    pub fn validate(&self) -> MatchResult<()> {
        match self {
            CandidateProfile::Investor(investor) => investor.validate(),
            CandidateProfile::Advisor(advisor) => advisor.validate(),
        }
    }
}

impl From<InvestorProfile> for CandidateProfile {
    fn from(investor: InvestorProfile) -> Self {
        CandidateProfile::Investor(investor)
    }
}

impl From<AdvisorProfile> for CandidateProfile {
    fn from(advisor: AdvisorProfile) -> Self {
        CandidateProfile::Advisor(advisor)
    }
}
