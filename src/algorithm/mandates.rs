//! Mandate resolution: election winners, term boundaries, predecessor
//! linkage.
//!
//! For each (entity, election year) the winner is the elected candidate
//! with the highest round, ties broken by highest vote count; remaining
//! exact ties fall to the first candidate in a *stable* sort of the input,
//! which keeps resolution deterministic for a given snapshot without
//! inventing a secondary key. An entity-year where nobody was elected
//! produces no mandate; it is reported as a coverage gap, not an error.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::models::derived::mandate::{CompetitionLevel, Mandate, TERM_LENGTH, TransitionCategory};
use crate::models::raw::RawElectionResult;
use crate::utils::ids::entity_year_id;
use crate::utils::stats::guarded_ratio;

/// Result of mandate resolution.
#[derive(Debug)]
pub struct ResolvedMandates {
    /// One mandate per (entity, election year) with a winner, sorted by
    /// (entity, election year)
    pub mandates: Vec<Mandate>,
    /// Entity-years with election rows but no elected candidate
    pub coverage_gaps: usize,
}

/// Winner and context of one entity-year contest.
struct Contest<'a> {
    winner: &'a RawElectionResult,
    /// Winner share of the deciding-round votes, percent
    vote_share: Option<f64>,
    /// Winner-minus-runner-up share margin in the deciding round
    margin: Option<f64>,
}

/// Pick the winner of one entity-year from its candidate rows.
///
/// `rows` must be in source order; the sort below is stable, so candidates
/// tied on (round, votes) keep that order and the first one wins.
fn decide_contest<'a>(rows: &[&'a RawElectionResult]) -> Option<Contest<'a>> {
    let mut elected: Vec<&RawElectionResult> = rows.iter().copied().filter(|r| r.elected).collect();
    if elected.is_empty() {
        return None;
    }
    elected.sort_by(|a, b| b.round.cmp(&a.round).then(b.votes.cmp(&a.votes)));
    let winner = elected[0];

    // Shares are computed over every candidate of the deciding round,
    // elected or not.
    let round_votes: Vec<i64> = rows
        .iter()
        .filter(|r| r.round == winner.round)
        .map(|r| r.votes)
        .collect();
    let total: i64 = round_votes.iter().sum();
    let vote_share = guarded_ratio(winner.votes as f64, total as f64);

    let runner_up = rows
        .iter()
        .filter(|r| r.round == winner.round && !std::ptr::eq(**r, winner))
        .map(|r| r.votes)
        .max();
    // A non-elected candidate can out-poll the winner (annulled votes,
    // court-overturned results); the margin floors at zero so such races
    // band as maximally contested instead of going negative.
    let margin = match (vote_share, runner_up) {
        (Some(winner_share), Some(votes)) => {
            guarded_ratio(votes as f64, total as f64).map(|share| (winner_share - share).max(0.0))
        }
        _ => None,
    };

    Some(Contest {
        winner,
        vote_share,
        margin,
    })
}

/// Resolve all mandates from the normalized election results.
///
/// Per-entity work runs in parallel; the output is sorted afterwards so the
/// result is independent of scheduling.
#[must_use]
pub fn resolve_mandates(elections: &[RawElectionResult]) -> ResolvedMandates {
    // Group rows per entity, then per election year, preserving source
    // order inside each group (the tie-break depends on it).
    let mut by_entity: FxHashMap<&str, Vec<&RawElectionResult>> = FxHashMap::default();
    for row in elections {
        by_entity.entry(row.entity_id.as_str()).or_default().push(row);
    }

    let mut entities: Vec<(&str, Vec<&RawElectionResult>)> = by_entity.into_iter().collect();
    entities.sort_by_key(|(id, _)| *id);

    let per_entity: Vec<(Vec<Mandate>, usize)> = entities
        .par_iter()
        .map(|(entity_id, rows)| {
            let mut by_year: FxHashMap<i32, Vec<&RawElectionResult>> = FxHashMap::default();
            for row in rows {
                by_year.entry(row.year).or_default().push(row);
            }
            let mut years: Vec<i32> = by_year.keys().copied().collect();
            years.sort_unstable();

            let mut mandates = Vec::with_capacity(years.len());
            let mut gaps = 0;
            let mut previous: Option<(i32, String)> = None;

            for year in &years {
                let Some(contest) = decide_contest(&by_year[year]) else {
                    gaps += 1;
                    continue;
                };
                let (predecessor_election_year, predecessor_party) = match &previous {
                    Some((prev_year, prev_party)) => (Some(*prev_year), Some(prev_party.clone())),
                    None => (None, None),
                };
                // Continuity needs both the same party and a contiguous
                // term; a 4-year gap in the record breaks it even when the
                // party matches.
                let continuity = predecessor_party.as_deref() == Some(contest.winner.party.as_str())
                    && predecessor_election_year == Some(year - TERM_LENGTH);

                mandates.push(Mandate {
                    mandate_id: entity_year_id(entity_id, *year),
                    entity_id: (*entity_id).to_string(),
                    election_year: *year,
                    term_start: year + 1,
                    term_end: year + TERM_LENGTH,
                    winning_party: contest.winner.party.clone(),
                    vote_share: contest.vote_share,
                    competition: CompetitionLevel::from_margin(contest.margin)
                        .as_str()
                        .to_string(),
                    sequence: 0, // assigned below, after gaps are known
                    predecessor_party,
                    predecessor_election_year,
                    continuity,
                    ideology_score: None,
                    ideology_spectrum: None,
                    ideology_bloc: None,
                    ideology_delta: None,
                    transition: TransitionCategory::NoHistory.as_str().to_string(),
                });
                previous = Some((*year, contest.winner.party.clone()));
            }

            // Sequence counts resolved mandates only, so a skipped
            // entity-year does not leave a hole in the numbering.
            for (i, mandate) in mandates.iter_mut().enumerate() {
                mandate.sequence = i as u32 + 1;
            }
            (mandates, gaps)
        })
        .collect();

    let mut mandates = Vec::new();
    let mut coverage_gaps = 0;
    for (entity_mandates, gaps) in per_entity {
        mandates.extend(entity_mandates);
        coverage_gaps += gaps;
    }

    log::info!(
        "Resolved {} mandates ({} coverage gaps)",
        mandates.len(),
        coverage_gaps
    );
    ResolvedMandates {
        mandates,
        coverage_gaps,
    }
}
