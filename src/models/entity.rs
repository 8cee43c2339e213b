//! Municipality reference data.
//!
//! A [`Municipality`] is created once by the normalizer from the reference
//! directory snapshot and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Numeric state prefix (first two digits of the entity id) paired with its
/// canonical 2-letter code. This is the closed set of 27 administrative
/// units; anything outside it is rejected by the normalizer.
pub const STATE_CODES: [(u8, &str); 27] = [
    (11, "RO"),
    (12, "AC"),
    (13, "AM"),
    (14, "RR"),
    (15, "PA"),
    (16, "AP"),
    (17, "TO"),
    (21, "MA"),
    (22, "PI"),
    (23, "CE"),
    (24, "RN"),
    (25, "PB"),
    (26, "PE"),
    (27, "AL"),
    (28, "SE"),
    (29, "BA"),
    (31, "MG"),
    (32, "ES"),
    (33, "RJ"),
    (35, "SP"),
    (41, "PR"),
    (42, "SC"),
    (43, "RS"),
    (50, "MS"),
    (51, "MT"),
    (52, "GO"),
    (53, "DF"),
];

/// Macro-region an entity belongs to, derived from its state prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    Northeast,
    Southeast,
    South,
    CenterWest,
}

impl Region {
    /// Region for a numeric state prefix, if the prefix is valid.
    #[must_use]
    pub fn from_state_prefix(prefix: u8) -> Option<Self> {
        if !STATE_CODES.iter().any(|(p, _)| *p == prefix) {
            return None;
        }
        match prefix / 10 {
            1 => Some(Self::North),
            2 => Some(Self::Northeast),
            3 => Some(Self::Southeast),
            4 => Some(Self::South),
            5 => Some(Self::CenterWest),
            _ => None,
        }
    }

    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::Northeast => "northeast",
            Self::Southeast => "southeast",
            Self::South => "south",
            Self::CenterWest => "center_west",
        }
    }
}

/// Population-size tier of a municipality.
///
/// Fixed tiers; the thresholds follow the national small/medium/large/metro
/// classification used by the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// Under 20,000 inhabitants
    SmallI,
    /// 20,000 to 49,999
    SmallII,
    /// 50,000 to 99,999
    Medium,
    /// 100,000 to 499,999
    Large,
    /// 500,000 and above
    Metropolis,
}

impl SizeClass {
    /// Tier for a population count.
    #[must_use]
    pub fn from_population(population: u64) -> Self {
        match population {
            0..=19_999 => Self::SmallI,
            20_000..=49_999 => Self::SmallII,
            50_000..=99_999 => Self::Medium,
            100_000..=499_999 => Self::Large,
            _ => Self::Metropolis,
        }
    }

    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallI => "small_i",
            Self::SmallII => "small_ii",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Metropolis => "metropolis",
        }
    }
}

/// One administrative entity, immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    /// Canonical 7-digit identifier
    pub id: String,
    /// Official name
    pub name: String,
    /// Canonical 2-letter state code
    pub state: String,
    /// Macro-region derived from the state prefix
    pub region: Region,
    /// Population-size tier (from the latest population count)
    pub size_class: SizeClass,
}

/// Whether `code` is one of the 27 canonical state codes.
#[must_use]
pub fn is_valid_state_code(code: &str) -> bool {
    STATE_CODES.iter().any(|(_, c)| *c == code)
}
