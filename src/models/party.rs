//! Party reference data.
//!
//! Ideology placements follow the expert-survey scores used by the source
//! system: a numeric score in [-2, +2], a 5-point spectrum, and a 3-point
//! bloc. The table is reference data, immutable for a run; parties absent
//! from it simply have no ideology information.

use serde::{Deserialize, Serialize};

/// 5-point ideology spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdeologySpectrum {
    FarLeft,
    CenterLeft,
    Center,
    CenterRight,
    FarRight,
}

impl IdeologySpectrum {
    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FarLeft => "far_left",
            Self::CenterLeft => "center_left",
            Self::Center => "center",
            Self::CenterRight => "center_right",
            Self::FarRight => "far_right",
        }
    }
}

/// 3-point ideology bloc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdeologyBloc {
    Left,
    Center,
    Right,
}

impl IdeologyBloc {
    /// Stable label used in the derived tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// One party in the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Party {
    /// Official abbreviation as it appears in the electoral snapshots
    pub abbreviation: &'static str,
    /// Numeric ideology score in [-2, +2]
    pub score: f64,
    /// 5-point spectrum placement
    pub spectrum: IdeologySpectrum,
    /// 3-point bloc placement
    pub bloc: IdeologyBloc,
}

use IdeologyBloc as B;
use IdeologySpectrum as S;

const fn party(abbreviation: &'static str, score: f64, spectrum: S, bloc: B) -> Party {
    Party {
        abbreviation,
        score,
        spectrum,
        bloc,
    }
}

/// Static party ideology table.
pub const PARTIES: [Party; 26] = [
    party("PSTU", -2.0, S::FarLeft, B::Left),
    party("PCO", -2.0, S::FarLeft, B::Left),
    party("PCB", -1.9, S::FarLeft, B::Left),
    party("PSOL", -1.8, S::FarLeft, B::Left),
    party("PCDOB", -1.6, S::FarLeft, B::Left),
    party("PT", -1.4, S::CenterLeft, B::Left),
    party("PDT", -0.8, S::CenterLeft, B::Left),
    party("PSB", -0.7, S::CenterLeft, B::Left),
    party("REDE", -0.5, S::CenterLeft, B::Left),
    party("PV", -0.3, S::Center, B::Center),
    party("CIDADANIA", -0.1, S::Center, B::Center),
    party("MDB", 0.3, S::Center, B::Center),
    party("PSD", 0.4, S::Center, B::Center),
    party("PSDB", 0.6, S::CenterRight, B::Right),
    party("PODE", 0.6, S::CenterRight, B::Right),
    party("PTB", 0.8, S::CenterRight, B::Right),
    party("PP", 1.0, S::CenterRight, B::Right),
    party("UNIAO", 1.1, S::CenterRight, B::Right),
    party("PL", 1.2, S::CenterRight, B::Right),
    party("REPUBLICANOS", 1.2, S::CenterRight, B::Right),
    party("PFL", 1.3, S::CenterRight, B::Right),
    party("DEM", 1.3, S::CenterRight, B::Right),
    party("PSC", 1.5, S::FarRight, B::Right),
    party("NOVO", 1.6, S::FarRight, B::Right),
    party("PRTB", 1.7, S::FarRight, B::Right),
    party("PSL", 1.8, S::FarRight, B::Right),
];

/// Look up a party by abbreviation (case-insensitive).
#[must_use]
pub fn lookup(abbreviation: &str) -> Option<&'static Party> {
    let upper = abbreviation.to_ascii_uppercase();
    // "PC do B" appears with spaces in older snapshots
    let key = upper.replace(' ', "");
    PARTIES.iter().find(|p| p.abbreviation == key)
}

/// Ideology score for a party abbreviation, if it is in the table.
#[must_use]
pub fn score_of(abbreviation: &str) -> Option<f64> {
    lookup(abbreviation).map(|p| p.score)
}

/// Bloc for a party abbreviation, if it is in the table.
#[must_use]
pub fn bloc_of(abbreviation: &str) -> Option<IdeologyBloc> {
    lookup(abbreviation).map(|p| p.bloc)
}

/// Spectrum placement for a party abbreviation, if it is in the table.
#[must_use]
pub fn spectrum_of(abbreviation: &str) -> Option<IdeologySpectrum> {
    lookup(abbreviation).map(|p| p.spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("pt").map(|p| p.abbreviation), Some("PT"));
        assert_eq!(lookup("PC do B").map(|p| p.abbreviation), Some("PCDOB"));
        assert!(lookup("UNKNOWN").is_none());
    }

    #[test]
    fn scores_stay_in_domain() {
        for p in &PARTIES {
            assert!((-2.0..=2.0).contains(&p.score), "{}", p.abbreviation);
        }
    }

    #[test]
    fn blocs_follow_score_sign() {
        assert_eq!(bloc_of("PSOL"), Some(IdeologyBloc::Left));
        assert_eq!(bloc_of("MDB"), Some(IdeologyBloc::Center));
        assert_eq!(bloc_of("PL"), Some(IdeologyBloc::Right));
    }

    #[test]
    fn spectrum_refines_the_bloc() {
        assert_eq!(spectrum_of("PSTU"), Some(IdeologySpectrum::FarLeft));
        assert_eq!(spectrum_of("PT"), Some(IdeologySpectrum::CenterLeft));
        assert_eq!(spectrum_of("PSL"), Some(IdeologySpectrum::FarRight));
        assert_eq!(spectrum_of("XYZ"), None);
    }
}
