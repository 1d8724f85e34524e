pub mod manager;
pub mod progress;
pub mod walker;

pub use manager::{IndexManager, LoadStatus};
pub use progress::{FileIndexOutcome, IndexStats, ProjectIndexSummary};
pub use walker::FileWalker;
