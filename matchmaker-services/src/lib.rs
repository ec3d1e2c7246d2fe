//! Business logic services for the startup matchmaking engine
//!
//! This crate scores startups against the investor and advisor pools,
//! persists the ranked match sets and serves match management queries.

pub mod composer;
pub mod generator;
pub mod match_service;
pub mod scoring;
pub mod store;

pub use composer::{
    compose_match, score_candidate, AdvisorScores, AdvisorWeights, InvestorScores,
    InvestorWeights, ScoredCandidate, SubScores, ADVISOR_WEIGHTS, INVESTOR_WEIGHTS,
};
pub use generator::{
    rank_and_truncate, GeneratedMatches, GeneratorConfig, KindOutcome, MatchGenerator,
};
pub use match_service::{MatchService, StatusUpdate};
pub use store::{MatchOwner, MatchStore, SqliteMatchStore};
