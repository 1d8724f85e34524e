//! Readers running while writers commit and evict.

use crate::common::TestProject;
use ragindex::{EmbeddingMethod, IndexManager};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

fn topic_file(project: &TestProject, name: &str, seed: usize) -> PathBuf {
    let text: String = (0..4)
        .map(|p| format!("Topic paragraph {seed} part {p} about shared retrieval state.\n\n"))
        .collect();
    project.add_file(name, &text)
}

fn assert_hits_consistent(manager: &IndexManager) {
    let hits = manager.retrieve_relevant("topic paragraph retrieval", 5);
    assert!(hits.len() <= 5);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    for hit in &hits {
        assert!(hit.score >= 0.01);
        assert!(hit.chunk.is_searchable());
        assert!(!hit.chunk.code.is_empty());
        assert!(!hit.chunk.code.contains('\0'));
        assert!(hit.chunk.code.starts_with("Topic paragraph "));
    }

    let raw = manager.retrieve("topic paragraph retrieval", 5);
    assert!(raw.len() <= 5);
    assert!(
        raw.iter()
            .all(|(text, _)| text.starts_with("Topic paragraph "))
    );
}

#[test]
fn test_concurrent_retrieve_during_index_and_evict() {
    let project = TestProject::new();
    let mut settings = project.settings(EmbeddingMethod::WordHash);
    settings.indexing.max_chunks = 40;
    let manager = project.manager_with(&settings);

    for seed in 0..5 {
        let file = topic_file(&project, &format!("seed/{seed}.md"), seed);
        manager.index_file(&file).unwrap();
    }
    let incoming: Vec<_> = (5..25)
        .map(|seed| topic_file(&project, &format!("incoming/{seed}.md"), seed))
        .collect();

    let writing = AtomicBool::new(true);
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while writing.load(Ordering::Acquire) {
                    assert_hits_consistent(&manager);
                    manager.with_chunks(|chunks| {
                        assert!(chunks.iter().all(|c| c.is_searchable()));
                    });
                }
            });
        }

        scope.spawn(|| {
            for file in &incoming {
                manager.index_file(file).unwrap();
                manager.enforce_memory_limits();
            }
            manager.remove_chunks_from_path(&project.content_root().join("seed"));
            writing.store(false, Ordering::Release);
        });
    });

    let stats = manager.stats();
    assert!(stats.chunk_count <= 40 + 4);
    assert_eq!(stats.searchable_count, stats.chunk_count);
    assert_eq!(stats.reverse_map_len, stats.chunk_count);
    assert!(
        manager
            .get_chunks()
            .iter()
            .all(|c| !c.file_name.starts_with(project.content_root().join("seed")))
    );
    assert_hits_consistent(&manager);
}

#[test]
fn test_init_never_exposes_out_of_root_chunks() {
    let project = TestProject::new();

    // Write an index holding one chunk inside content/ and one beside it
    let mut wide = project.settings(EmbeddingMethod::WordHash);
    wide.content_root = project.path().to_path_buf();
    let writer = project.manager_with(&wide);
    let outside = project.path().join("outside.md");
    std::fs::write(&outside, "Stray paragraph kept outside the content tree.\n").unwrap();
    writer.index_file(&outside).unwrap();
    let inside = topic_file(&project, "inside.md", 1);
    writer.index_file(&inside).unwrap();
    writer.save_index().unwrap();
    assert!(writer.get_chunks().iter().any(|c| c.file_name == outside));

    let manager = project.manager(EmbeddingMethod::WordHash);
    let root = project.content_root();
    let reloading = AtomicBool::new(true);
    let seen = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                while reloading.load(Ordering::Acquire) {
                    let stray = manager
                        .get_chunks()
                        .iter()
                        .filter(|c| !c.file_name.starts_with(&root))
                        .count();
                    seen.fetch_add(stray, Ordering::Relaxed);
                    assert_hits_consistent(&manager);
                }
            });
        }

        scope.spawn(|| {
            for _ in 0..300 {
                assert!(manager.init(None) > 0);
            }
            reloading.store(false, Ordering::Release);
        });
    });

    assert_eq!(seen.load(Ordering::Relaxed), 0);
    let chunks = manager.get_chunks();
    assert!(chunks.iter().all(|c| c.file_name.starts_with(&root)));
}

#[test]
fn test_parallel_indexing_keeps_structures_aligned() {
    let project = TestProject::new();
    let manager = project.manager(EmbeddingMethod::TfIdf);

    let files: Vec<_> = (0..8)
        .map(|seed| topic_file(&project, &format!("parallel/{seed}.md"), seed))
        .collect();

    thread::scope(|scope| {
        for chunk in files.chunks(2) {
            let manager = &manager;
            scope.spawn(move || {
                for file in chunk {
                    manager.index_file(file).unwrap();
                }
            });
        }
    });

    let stats = manager.stats();
    assert!(stats.chunk_count > 0);
    assert_eq!(stats.searchable_count, stats.chunk_count);
    assert_eq!(stats.reverse_map_len, stats.chunk_count);
    assert!(stats.corpus_documents >= stats.chunk_count);
}
