//! On-disk persistence for the chunk index.

pub mod error;
pub mod format;
pub mod persistence;

pub use error::{PersistenceError, PersistenceResult};
pub use format::{ByteReader, ByteWriter};
pub use persistence::{FORMAT_VERSION, IndexPersistence, IndexSnapshot, LoadOutcome};
