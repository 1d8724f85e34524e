//! Saving, loading and recovering the binary index file.

use crate::common::{TestProject, sample_content};
use ragindex::storage::FORMAT_VERSION;
use ragindex::{EmbeddingMethod, IndexError, LoadStatus, PersistenceError};
use std::fs;

fn indexed_project(method: EmbeddingMethod) -> TestProject {
    let project = TestProject::new();
    project.add_file("docs/guide.md", sample_content::MARKDOWN);
    project.add_file("src/math.cpp", sample_content::CPP);

    let manager = project.manager(method);
    manager.init(None);
    manager.index_project(&project.content_root()).unwrap();
    manager.save_index().unwrap();
    project
}

#[test]
fn test_round_trip_preserves_chunks_and_ranking() {
    let project = TestProject::new();
    project.add_file("docs/guide.md", sample_content::MARKDOWN);
    project.add_file("src/math.cpp", sample_content::CPP);

    let original = project.manager(EmbeddingMethod::TfIdf);
    original.init(None);
    original.index_project(&project.content_root()).unwrap();
    original.save_index().unwrap();
    let expected_chunks = original.get_chunks();
    let expected_results = original.retrieve("vector of numbers", 3);

    let restored = project.manager(EmbeddingMethod::TfIdf);
    let ready = restored.init(None);

    assert_eq!(ready, expected_chunks.len());
    assert_eq!(restored.get_chunks(), expected_chunks);
    assert_eq!(restored.retrieve("vector of numbers", 3), expected_results);
}

#[test]
fn test_file_header_layout() {
    let project = indexed_project(EmbeddingMethod::WordHash);
    let bytes = fs::read(project.index_file()).unwrap();

    assert_eq!(&bytes[..4], b"RAGX");
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    assert_eq!(version, FORMAT_VERSION);
    let count = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert!(count > 0);
    assert!(!project.path().join("index.bin.tmp").exists());
}

#[test]
fn test_corrupted_file_starts_fresh() {
    let project = indexed_project(EmbeddingMethod::WordHash);
    let path = project.index_file();
    let mut bytes = fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let manager = project.manager(EmbeddingMethod::WordHash);
    assert!(matches!(
        manager.load_index(),
        Err(IndexError::Persistence {
            source: PersistenceError::ChecksumMismatch,
            ..
        })
    ));
    assert_eq!(manager.init(None), 0);
    assert!(manager.is_empty());
}

#[test]
fn test_truncated_file_is_rejected() {
    let project = indexed_project(EmbeddingMethod::WordHash);
    let path = project.index_file();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 3]).unwrap();

    let manager = project.manager(EmbeddingMethod::WordHash);
    assert!(matches!(
        manager.load_index(),
        Err(IndexError::Persistence { .. })
    ));
    assert_eq!(manager.init(None), 0);
}

#[test]
fn test_missing_file_is_not_an_error() {
    let project = TestProject::new();
    let manager = project.manager(EmbeddingMethod::WordHash);

    assert_eq!(manager.load_index().unwrap(), LoadStatus::Missing);
    assert_eq!(manager.init(None), 0);
}

#[test]
fn test_vocabulary_mismatch_keeps_current_index() {
    let project = indexed_project(EmbeddingMethod::WordHash);

    let mut settings = project.settings(EmbeddingMethod::WordHash);
    settings.embedding.vocab_size = 512;
    let manager = project.manager_with(&settings);
    let file = project.add_file("extra.md", "A document indexed before the failed load.\n");
    manager.index_file(&file).unwrap();

    let err = manager.load_index().unwrap_err();
    assert!(matches!(
        err,
        IndexError::Persistence {
            source: PersistenceError::VocabularyMismatch {
                expected: 512,
                actual: 10_000
            },
            ..
        }
    ));
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_explicit_paths() {
    let project = indexed_project(EmbeddingMethod::WordHash);
    let source = project.manager(EmbeddingMethod::WordHash);
    source.init(None);
    let elsewhere = project.path().join("backup/copy.bin");
    source.save_index_to(&elsewhere).unwrap();

    let target = project.manager(EmbeddingMethod::WordHash);
    assert_eq!(
        target.load_index_from(&elsewhere).unwrap(),
        LoadStatus::Loaded(source.len())
    );
    assert_eq!(target.init(Some(&elsewhere)), source.len());
    assert_eq!(target.index_path(), elsewhere);
}

#[test]
fn test_clear_then_save_empties_file() {
    let project = indexed_project(EmbeddingMethod::TfIdf);
    let manager = project.manager(EmbeddingMethod::TfIdf);
    assert!(manager.init(None) > 0);

    manager.clear();
    manager.save_index().unwrap();

    let reloaded = project.manager(EmbeddingMethod::TfIdf);
    assert_eq!(reloaded.init(None), 0);
    assert_eq!(reloaded.stats().corpus_documents, 0);
}
