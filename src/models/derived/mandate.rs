//! Reconstructed terms of office.

use serde::Serialize;

/// Term length in years; a mandate always spans election_year+1 through
/// election_year+4.
pub const TERM_LENGTH: i32 = 4;

/// How contested the deciding round was, banded on the winner-vs-runner-up
/// vote-share margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompetitionLevel {
    /// Single candidate in the deciding round
    Uncontested,
    /// Margin of 15 percentage points or more
    Low,
    /// Margin of 5 to 15 percentage points
    Moderate,
    /// Margin under 5 percentage points
    High,
}

impl CompetitionLevel {
    /// Band a winner-minus-runner-up margin (percentage points).
    #[must_use]
    pub fn from_margin(margin: Option<f64>) -> Self {
        match margin {
            None => Self::Uncontested,
            Some(m) if m < 5.0 => Self::High,
            Some(m) if m < 15.0 => Self::Moderate,
            Some(_) => Self::Low,
        }
    }

    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uncontested => "uncontested",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Magnitude and direction of the ideological transition between two
/// consecutive terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionCategory {
    /// First mandate on record, or either party lacks an ideology score
    NoHistory,
    /// |delta| < 1
    Stable,
    /// 1 <= |delta| < 2, score moved left
    ModerateShiftLeft,
    /// 1 <= |delta| < 2, score moved right
    ModerateShiftRight,
    /// |delta| >= 2, score moved left
    StrongShiftLeft,
    /// |delta| >= 2, score moved right
    StrongShiftRight,
}

impl TransitionCategory {
    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoHistory => "no_history",
            Self::Stable => "stable",
            Self::ModerateShiftLeft => "moderate_shift_left",
            Self::ModerateShiftRight => "moderate_shift_right",
            Self::StrongShiftLeft => "strong_shift_left",
            Self::StrongShiftRight => "strong_shift_right",
        }
    }
}

/// One reconstructed term of office.
///
/// Grain: (entity, election year), and only entity-years where some
/// candidate was actually elected. An entity-year with no elected candidate
/// produces no row; downstream reports it as a coverage gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mandate {
    /// Deterministic surrogate id of (entity_id, election_year)
    pub mandate_id: String,
    /// Canonical 7-digit entity id
    pub entity_id: String,
    /// Year the election was held
    pub election_year: i32,
    /// First year in office (election_year + 1)
    pub term_start: i32,
    /// Last year in office (election_year + 4)
    pub term_end: i32,
    /// Winning party abbreviation
    pub winning_party: String,
    /// Winner's share of the deciding-round votes, percent
    pub vote_share: Option<f64>,
    /// Competition band of the deciding round
    pub competition: String,
    /// 1-based position of this mandate in the entity's history
    pub sequence: u32,
    /// Winning party of the immediately preceding mandate, if any
    pub predecessor_party: Option<String>,
    /// Election year of the immediately preceding mandate, if any
    pub predecessor_election_year: Option<i32>,
    /// Same party as the predecessor AND contiguous terms
    pub continuity: bool,
    /// Ideology score of the winning party, if known
    pub ideology_score: Option<f64>,
    /// 5-point spectrum label of the winning party, if known
    pub ideology_spectrum: Option<String>,
    /// Ideology bloc label of the winning party, if known
    pub ideology_bloc: Option<String>,
    /// Current score minus predecessor score; null without full history
    pub ideology_delta: Option<f64>,
    /// Transition category label
    pub transition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_bands() {
        assert_eq!(
            CompetitionLevel::from_margin(None),
            CompetitionLevel::Uncontested
        );
        assert_eq!(
            CompetitionLevel::from_margin(Some(2.0)),
            CompetitionLevel::High
        );
        assert_eq!(
            CompetitionLevel::from_margin(Some(5.0)),
            CompetitionLevel::Moderate
        );
        assert_eq!(
            CompetitionLevel::from_margin(Some(40.0)),
            CompetitionLevel::Low
        );
    }
}
