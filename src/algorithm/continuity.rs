//! Continuity classification: ideology deltas and transition categories.
//!
//! The delta is measured against the immediately preceding mandate of the
//! same entity in election-year order, whether or not the terms are
//! contiguous (the continuity *flag* is stricter and lives in the
//! resolver). A first mandate, or a party missing from the ideology table,
//! yields a null delta and the explicit `no_history` category instead of
//! being passed off as ideologically stable.

use rustc_hash::FxHashMap;

use crate::models::derived::mandate::{Mandate, TransitionCategory};
use crate::models::party;

/// Threshold for a strong ideological shift
pub const STRONG_SHIFT: f64 = 2.0;
/// Threshold for a moderate ideological shift
pub const MODERATE_SHIFT: f64 = 1.0;

/// Category for an ideology delta. Positive deltas are rightward shifts.
#[must_use]
pub fn classify_delta(delta: Option<f64>) -> TransitionCategory {
    let Some(delta) = delta else {
        return TransitionCategory::NoHistory;
    };
    if delta.abs() >= STRONG_SHIFT {
        if delta > 0.0 {
            TransitionCategory::StrongShiftRight
        } else {
            TransitionCategory::StrongShiftLeft
        }
    } else if delta.abs() >= MODERATE_SHIFT {
        if delta > 0.0 {
            TransitionCategory::ModerateShiftRight
        } else {
            TransitionCategory::ModerateShiftLeft
        }
    } else {
        TransitionCategory::Stable
    }
}

/// Fill ideology score, spectrum, bloc, delta and transition category on
/// resolved mandates, per entity in election-year order.
pub fn annotate(mandates: &mut [Mandate]) {
    // Indices per entity; mandates arrive sorted by (entity, year) from
    // the resolver, but the scan re-sorts to stay independent of that.
    let mut by_entity: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (idx, mandate) in mandates.iter().enumerate() {
        by_entity
            .entry(mandate.entity_id.clone())
            .or_default()
            .push(idx);
    }

    for indices in by_entity.values_mut() {
        indices.sort_by_key(|&i| mandates[i].election_year);
        let mut previous_score: Option<f64> = None;
        let mut has_predecessor = false;
        for &idx in indices.iter() {
            let current_score = party::score_of(&mandates[idx].winning_party);
            let delta = match (has_predecessor, current_score, previous_score) {
                (true, Some(current), Some(previous)) => Some(current - previous),
                _ => None,
            };

            let mandate = &mut mandates[idx];
            mandate.ideology_score = current_score;
            mandate.ideology_spectrum = party::spectrum_of(&mandate.winning_party)
                .map(|spectrum| spectrum.as_str().to_string());
            mandate.ideology_bloc = party::bloc_of(&mandate.winning_party)
                .map(|bloc| bloc.as_str().to_string());
            mandate.ideology_delta = delta;
            mandate.transition = classify_delta(delta).as_str().to_string();

            previous_score = current_score;
            has_predecessor = true;
        }
    }
}
