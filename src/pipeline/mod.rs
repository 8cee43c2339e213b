//! End-to-end batch pipeline.
//!
//! A run loads the five input snapshots once, derives every table in
//! memory, and only then writes the output. Nothing is persisted before
//! the whole derivation has succeeded, so the output directory never holds
//! a partial run.

pub mod writer;

use std::time::Instant;

use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::algorithm::cluster::ClusterCounters;
use crate::algorithm::efficiency::EfficiencyCounters;
use crate::algorithm::fiscal::DependencyCounters;
use crate::algorithm::{cluster, continuity, efficiency, fiscal, mandates, panel};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::normalize::{self, NormalizeReport};
use crate::sources::{
    DirectorySource, ElectionsSource, ExpenseSource, PopulationSource, RevenueSource,
    SocialSource, load_source,
};
use crate::utils::logging::{log_operation_complete, log_operation_start, stage_progress_bar};

/// Names of the derived tables, also the output file stems.
pub const DERIVED_TABLES: &[&str] = &[
    "mandates",
    "fiscal_summaries",
    "dependency",
    "efficiency",
    "cluster_assignments",
    "annual_panel",
    "mandate_panel",
];

/// Row counts of the derived tables of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub mandates: usize,
    pub fiscal_summaries: usize,
    pub dependency: usize,
    pub efficiency: usize,
    pub cluster_assignments: usize,
    pub annual_panel: usize,
    pub mandate_panel: usize,
}

/// Everything a run counted but did not fail on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityCounters {
    /// Source rows dropped at extraction (null keys, unparseable stages)
    pub dropped_source_rows: usize,
    /// Normalizer exclusions per source
    pub normalize: NormalizeReport,
    /// Election years of an entity where nobody was elected
    pub coverage_gaps: usize,
    /// Exclusions while deriving dependency records
    pub dependency: DependencyCounters,
    /// Exclusions while deriving efficiency records
    pub efficiency: EfficiencyCounters,
    /// Exclusions while segmenting development tiers
    pub clusters: ClusterCounters,
}

/// Summary of one completed run, serialized to `run_summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_seconds: f64,
    pub panel_start_year: i32,
    pub panel_end_year: i32,
    pub tables: TableCounts,
    pub quality: QualityCounters,
}

/// Run the whole derivation pipeline.
///
/// Fatal errors (missing snapshot, schema violation, I/O) abort before
/// anything is written; data-quality issues are counted in the returned
/// [`RunSummary`] instead.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;
    info!("{config}");
    if let Some(threads) = config.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Rayon pool already initialized, keeping it: {err}");
        }
    }
    info!(
        "Using {} worker threads",
        config.threads.unwrap_or_else(num_cpus::get)
    );
    let started_at = chrono::Utc::now();
    let run_start = Instant::now();
    let mut quality = QualityCounters::default();

    // Load every snapshot up front; the derivation never touches the
    // input directory again.
    log_operation_start("load", &config.input_dir);
    let load_start = Instant::now();
    let directory = load_source::<DirectorySource>(&config.input_dir)?;
    let population = load_source::<PopulationSource>(&config.input_dir)?;
    let social = load_source::<SocialSource>(&config.input_dir)?;
    let elections = load_source::<ElectionsSource>(&config.input_dir)?;
    let revenue = load_source::<RevenueSource>(&config.input_dir)?;
    let expense = load_source::<ExpenseSource>(&config.input_dir)?;
    quality.dropped_source_rows = directory.dropped
        + population.dropped
        + social.dropped
        + elections.dropped
        + revenue.dropped
        + expense.dropped;
    let mut fiscal_rows = revenue.rows;
    fiscal_rows.extend(expense.rows);
    log_operation_complete("load", fiscal_rows.len() + elections.rows.len(), load_start.elapsed());

    let normalize_start = Instant::now();
    let (data, normalize_report) = normalize::normalize(
        directory.rows,
        population.rows,
        social.rows,
        elections.rows,
        fiscal_rows,
    );
    quality.normalize = normalize_report;
    log_operation_complete("normalize", data.municipalities.len(), normalize_start.elapsed());

    let resolve_start = Instant::now();
    let resolved = mandates::resolve_mandates(&data.elections);
    quality.coverage_gaps = resolved.coverage_gaps;
    let mut mandate_rows = resolved.mandates;
    continuity::annotate(&mut mandate_rows);
    log_operation_complete("mandates", mandate_rows.len(), resolve_start.elapsed());

    let fiscal_start = Instant::now();
    let summaries = fiscal::aggregate_summaries(&data.fiscal);
    let population_index: FxHashMap<(String, i32), u64> = data
        .population
        .iter()
        .map(|count| ((count.entity_id.clone(), count.year), count.population))
        .collect();
    let (dependency_rows, dependency_counters) =
        fiscal::derive_dependency(&summaries, &population_index);
    quality.dependency = dependency_counters;
    log_operation_complete("fiscal", summaries.len(), fiscal_start.elapsed());

    let efficiency_start = Instant::now();
    let (efficiency_rows, efficiency_counters) = efficiency::derive_efficiency(
        &data.municipalities,
        &data.social,
        &summaries,
        &population_index,
    );
    quality.efficiency = efficiency_counters;
    log_operation_complete("efficiency", efficiency_rows.len(), efficiency_start.elapsed());

    let cluster_start = Instant::now();
    let (cluster_rows, cluster_counters) =
        cluster::derive_clusters(&data.municipalities, &data.social, config.panel_end_year);
    quality.clusters = cluster_counters;
    log_operation_complete("clusters", cluster_rows.len(), cluster_start.elapsed());

    let panel_start = Instant::now();
    let facts = panel::PanelFacts::new(
        &summaries,
        &dependency_rows,
        &efficiency_rows,
        &data.social,
        &population_index,
    );
    let annual_rows = panel::annual_panel(
        &data.municipalities,
        &mandate_rows,
        &facts,
        config.panel_start_year,
        config.panel_end_year,
    );
    let mandate_panel_rows = panel::mandate_panel(&mandate_rows, &facts);
    log_operation_complete("panels", annual_rows.len(), panel_start.elapsed());

    // All derivation is done; only now touch the output directory.
    let write_start = Instant::now();
    let progress = stage_progress_bar(DERIVED_TABLES.len() as u64, "write");
    writer::write_table(&config.output_dir, "mandates", &mandate_rows)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "fiscal_summaries", &summaries)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "dependency", &dependency_rows)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "efficiency", &efficiency_rows)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "cluster_assignments", &cluster_rows)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "annual_panel", &annual_rows)?;
    progress.inc(1);
    writer::write_table(&config.output_dir, "mandate_panel", &mandate_panel_rows)?;
    progress.finish_and_clear();
    log_operation_complete("write", DERIVED_TABLES.len(), write_start.elapsed());

    let finished_at = chrono::Utc::now();
    let summary = RunSummary {
        started_at: started_at.to_rfc3339(),
        finished_at: finished_at.to_rfc3339(),
        elapsed_seconds: run_start.elapsed().as_secs_f64(),
        panel_start_year: config.panel_start_year,
        panel_end_year: config.panel_end_year,
        tables: TableCounts {
            mandates: mandate_rows.len(),
            fiscal_summaries: summaries.len(),
            dependency: dependency_rows.len(),
            efficiency: efficiency_rows.len(),
            cluster_assignments: cluster_rows.len(),
            annual_panel: annual_rows.len(),
            mandate_panel: mandate_panel_rows.len(),
        },
        quality,
    };
    if config.write_run_summary {
        let path = config.output_dir.join("run_summary.json");
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)?;
        info!("Wrote run summary to {}", path.display());
    }
    info!(
        "Run complete in {:.1}s: {} mandates, {} annual panel rows",
        summary.elapsed_seconds, summary.tables.mandates, summary.tables.annual_panel
    );
    Ok(summary)
}
