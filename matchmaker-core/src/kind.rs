//! Candidate kind definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of candidate a startup can be matched with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Capital provider
    Investor,
    /// Mentor / domain expert
    Advisor,
}

impl CandidateKind {
    /// Stable string stored in the database and used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Investor => "Investor",
            CandidateKind::Advisor => "Advisor",
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CandidateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "investor" | "investors" => Ok(CandidateKind::Investor),
            "advisor" | "advisors" => Ok(CandidateKind::Advisor),
            _ => Err(format!("Unknown candidate kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!("Investor".parse::<CandidateKind>(), Ok(CandidateKind::Investor));
        assert_eq!("advisors".parse::<CandidateKind>(), Ok(CandidateKind::Advisor));
        assert!("founder".parse::<CandidateKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_display_name() {
        let json = serde_json::to_string(&CandidateKind::Advisor).unwrap();
        assert_eq!(json, "\"Advisor\"");
    }
}
