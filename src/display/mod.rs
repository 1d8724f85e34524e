//! Terminal output for the CLI: result tables and indexing progress.
//!
//! Library code never prints; the binary renders everything through here.

pub mod progress;
pub mod tables;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{TableBuilder, create_results_table, create_stats_table, create_summary_table};
