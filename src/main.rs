use std::env;
use std::path::Path;

use anyhow::{Context, bail};
use log::info;
use muni_panels::{PipelineConfig, pipeline};

fn usage() -> ! {
    eprintln!("Usage: muni-panels <input-dir> <output-dir> [start-year end-year]");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut config = match args.as_slice() {
        [_, input, output] => PipelineConfig::new(input, output),
        [_, input, output, start, end] => {
            let (Ok(start), Ok(end)) = (start.parse(), end.parse()) else {
                usage();
            };
            PipelineConfig::new(input, output).with_panel_years(start, end)
        }
        _ => usage(),
    };
    config.threads = env::var("MUNI_PANELS_THREADS")
        .ok()
        .and_then(|v| v.parse().ok());

    if !Path::new(&config.input_dir).exists() {
        bail!("input directory not found: {}", config.input_dir.display());
    }

    info!(
        "Deriving panels {}..={} from {}",
        config.panel_start_year,
        config.panel_end_year,
        config.input_dir.display()
    );
    let summary = pipeline::run(&config).context("pipeline run failed")?;
    info!(
        "Derived {} tables into {}",
        pipeline::DERIVED_TABLES.len(),
        config.output_dir.display()
    );
    info!(
        "Quality: {} source rows dropped, {} coverage gaps, {} range violations",
        summary.quality.dropped_source_rows,
        summary.quality.coverage_gaps,
        summary.quality.dependency.range_violations
    );
    Ok(())
}
