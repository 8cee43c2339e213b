//! Year-level lookup flags.
//!
//! The pipeline only ever deals in whole calendar years; this module is a
//! set of pure predicates over the supported year domain. Nothing here owns
//! data.

/// First year the pipeline accepts anywhere
pub const MIN_YEAR: i32 = 1990;
/// Last year the pipeline accepts anywhere
pub const MAX_YEAR: i32 = 2030;

/// First municipal election covered by the electoral snapshots
pub const FIRST_ELECTION_YEAR: i32 = 1996;
/// Last municipal election covered by the electoral snapshots
pub const LAST_ELECTION_YEAR: i32 = 2024;

/// Census years with social-index snapshots
pub const CENSUS_YEARS: [i32; 4] = [1991, 2000, 2010, 2022];

/// First fiscal year with national benchmark coverage
pub const FIRST_BENCHMARK_YEAR: i32 = 2013;
/// Last fiscal year with national benchmark coverage
pub const LAST_BENCHMARK_YEAR: i32 = 2023;

/// Whether `year` lies in the supported domain.
#[must_use]
pub fn in_domain(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Whether a municipal election was held in `year`.
///
/// Municipal elections run on a fixed 4-year cycle.
#[must_use]
pub fn is_election_year(year: i32) -> bool {
    (FIRST_ELECTION_YEAR..=LAST_ELECTION_YEAR).contains(&year)
        && (year - FIRST_ELECTION_YEAR) % 4 == 0
}

/// Whether `year` is a census year with a social snapshot.
#[must_use]
pub fn is_census_year(year: i32) -> bool {
    CENSUS_YEARS.contains(&year)
}

/// Whether national fiscal benchmarks can be computed for `year`.
#[must_use]
pub fn has_benchmark_data(year: i32) -> bool {
    (FIRST_BENCHMARK_YEAR..=LAST_BENCHMARK_YEAR).contains(&year)
}

/// The most recent census year at or before `year`, if any.
#[must_use]
pub fn latest_census_at(year: i32) -> Option<i32> {
    CENSUS_YEARS.iter().copied().filter(|&c| c <= year).max()
}
