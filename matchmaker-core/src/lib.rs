//! Core types for the startup matchmaking engine
//!
//! This crate defines the shared data structures used across the engine,
//! including startup and candidate profiles, stored match records and the
//! error type shared by every layer.

pub mod error;
pub mod kind;
pub mod match_record;
pub mod profile;

pub use error::{MatchError, MatchResult};
pub use kind::CandidateKind;
pub use match_record::{
    MatchFactors, MatchPage, MatchQuery, MatchRecord, MatchStatus, MatchStats, MAX_NOTES_LEN,
    MAX_REASON_LEN,
};
pub use profile::{
    AdvisorProfile, Availability, CandidateProfile, Expertise, FundingRange, InvestorProfile,
    Sector, Stage, StartupProfile,
};
