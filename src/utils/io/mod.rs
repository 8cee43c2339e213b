//! File system and Parquet I/O.

pub mod parquet;
