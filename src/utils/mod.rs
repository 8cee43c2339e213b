//! Shared utilities: Arrow extraction, Parquet I/O, statistics, logging.

pub mod arrow;
pub mod ids;
pub mod io;
pub mod logging;
pub mod stats;

pub use ids::surrogate_id;
pub use io::parquet::{DEFAULT_BATCH_SIZE, read_parquet_file, write_record_batch};
pub use stats::{guarded_div, guarded_ratio, median, percentile_ranks};
