//! Binary index file: chunks, the opaque engine state blob and a checksum.
//!
//! # File Format
//!
//! All integers are little-endian:
//! - Header: magic `RAGX`, format version `u32`
//! - Chunks: `u64` count, then per chunk the file name, symbol name,
//!   start/end line (`i32`), code and embedding (`u64` length + `f32`s)
//! - Engine state: `u64` length + bytes, produced by the embedding engine
//! - Trailer: SHA-256 over every preceding byte
//!
//! Saves go to a sibling temporary file which is then renamed over the target,
//! so a crash mid-write never leaves a half-written index behind.

use super::error::{PersistenceError, PersistenceResult};
use super::format::{ByteReader, ByteWriter};
use crate::types::Chunk;
use memmap2::MmapOptions;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes identifying index files
const MAGIC_BYTES: &[u8; 4] = b"RAGX";

/// Current index format version
pub const FORMAT_VERSION: u32 = 1;

/// Length of the trailing SHA-256 digest
const CHECKSUM_SIZE: usize = 32;

/// Smallest possible encoded chunk: four length prefixes and two line numbers
const MIN_CHUNK_BYTES: usize = 4 * 8 + 2 * 4;

/// Decoded contents of an index file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    pub chunks: Vec<Chunk>,
    /// Opaque embedding engine state
    pub engine_state: Vec<u8>,
}

/// Result of attempting to load an index file
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(IndexSnapshot),
    /// No file at the path; callers start with an empty index
    Missing,
}

/// Reads and writes one index file
#[derive(Debug, Clone)]
pub struct IndexPersistence {
    path: PathBuf,
}

impl IndexPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if an index file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `chunks` and `engine_state` atomically.
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(&self, chunks: &[Chunk], engine_state: &[u8]) -> PersistenceResult<()> {
        let bytes = encode(chunks, engine_state);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(
            path = %self.path.display(),
            chunks = chunks.len(),
            bytes = bytes.len(),
            "wrote index file"
        );
        Ok(())
    }

    /// Read the index file, memory-mapping it for decoding.
    pub fn load(&self) -> PersistenceResult<LoadOutcome> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len == 0 {
            return Err(PersistenceError::Truncated {
                needed: MAGIC_BYTES.len(),
                remaining: 0,
            });
        }

        // SAFETY: the map is read-only and dropped before this function returns;
        // index files are only replaced by rename, never modified in place.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let snapshot = decode(&mmap)?;

        debug!(
            path = %self.path.display(),
            chunks = snapshot.chunks.len(),
            "read index file"
        );
        Ok(LoadOutcome::Loaded(snapshot))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "index".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Serialize an index into its on-disk representation.
pub fn encode(chunks: &[Chunk], engine_state: &[u8]) -> Vec<u8> {
    let estimate: usize = chunks.iter().map(Chunk::estimated_bytes).sum::<usize>()
        + chunks.len() * MIN_CHUNK_BYTES
        + engine_state.len()
        + 64;
    let mut writer = ByteWriter::with_capacity(estimate);

    writer.put_raw(MAGIC_BYTES);
    writer.put_u32(FORMAT_VERSION);

    writer.put_len(chunks.len());
    for chunk in chunks {
        writer.put_str(&chunk.file_name.to_string_lossy());
        writer.put_str(&chunk.symbol_name);
        writer.put_i32(chunk.start_line);
        writer.put_i32(chunk.end_line);
        writer.put_str(&chunk.code);
        writer.put_f32_slice(&chunk.embedding);
    }

    writer.put_bytes(engine_state);

    let checksum = Sha256::digest(writer.as_slice());
    writer.put_raw(&checksum);
    writer.into_inner()
}

/// Parse and verify an index file image.
pub fn decode(bytes: &[u8]) -> PersistenceResult<IndexSnapshot> {
    let mut header = ByteReader::new(bytes);
    header.expect_magic(MAGIC_BYTES)?;
    header.expect_version(FORMAT_VERSION)?;

    if header.remaining() < CHECKSUM_SIZE {
        return Err(PersistenceError::Truncated {
            needed: CHECKSUM_SIZE,
            remaining: header.remaining(),
        });
    }
    let (body, stored) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
    if Sha256::digest(body).as_slice() != stored {
        return Err(PersistenceError::ChecksumMismatch);
    }

    let mut reader = ByteReader::new(body);
    reader.expect_magic(MAGIC_BYTES)?;
    reader.expect_version(FORMAT_VERSION)?;

    let count = reader.count("chunk count", MIN_CHUNK_BYTES)?;
    let mut chunks = Vec::with_capacity(count);
    for _ in 0..count {
        let file_name = PathBuf::from(reader.string("file name")?);
        let symbol_name = reader.string("symbol name")?;
        let start_line = reader.i32()?;
        let end_line = reader.i32()?;
        let code = reader.string("code")?;
        let embedding = reader.f32_vec("embedding")?;

        chunks.push(Chunk {
            file_name,
            symbol_name,
            start_line,
            end_line,
            code,
            embedding,
        });
    }

    let engine_state = reader.bytes("engine state")?.to_vec();

    if !reader.is_empty() {
        return Err(PersistenceError::TrailingData(reader.remaining()));
    }

    Ok(IndexSnapshot {
        chunks,
        engine_state,
    })
}
