//! Memory-limit eviction keeps the chunk list, reverse map and store in step.

use crate::common::TestProject;
use ragindex::EmbeddingMethod;

fn numbered_paragraphs(count: usize) -> String {
    (0..count)
        .map(|i| format!("Paragraph {i} mentions keyword{i} here.\n\n"))
        .collect()
}

#[test]
fn test_count_limit_evicts_oldest_fifth_repeatedly() {
    let project = TestProject::new();
    let mut settings = project.settings(EmbeddingMethod::WordHash);
    settings.indexing.max_chunks = 10;
    let manager = project.manager_with(&settings);

    let file = project.add_file("numbers.md", &numbered_paragraphs(25));
    manager.index_file(&file).unwrap();
    assert_eq!(manager.len(), 25);

    assert_eq!(manager.enforce_memory_limits(), 5);
    assert_eq!(manager.len(), 20);
    assert!(manager.get_chunks()[0].code.starts_with("Paragraph 5 "));

    assert_eq!(manager.enforce_memory_limits(), 4);
    assert_eq!(manager.len(), 16);

    let stats = manager.stats();
    assert_eq!(stats.searchable_count, 16);
    assert_eq!(stats.reverse_map_len, 16);

    let hits = manager.retrieve_relevant("keyword2", 5);
    assert!(!hits.iter().any(|h| h.chunk.code.contains("keyword2 here")));
    let hits = manager.retrieve_relevant("keyword20", 5);
    assert!(hits[0].chunk.code.contains("keyword20 here"));
}

#[test]
fn test_byte_limit_triggers_eviction() {
    let project = TestProject::new();
    let mut settings = project.settings(EmbeddingMethod::WordHash);
    settings.indexing.max_total_bytes = 1;
    let manager = project.manager_with(&settings);

    let file = project.add_file("numbers.md", &numbered_paragraphs(10));
    manager.index_file(&file).unwrap();
    assert!(manager.stats().estimated_bytes > 1);

    assert_eq!(manager.enforce_memory_limits(), 2);
    assert_eq!(manager.len(), 8);
}

#[test]
fn test_eviction_survives_save_and_reload() {
    let project = TestProject::new();
    let mut settings = project.settings(EmbeddingMethod::WordHash);
    settings.indexing.max_chunks = 10;

    let manager = project.manager_with(&settings);
    let file = project.add_file("numbers.md", &numbered_paragraphs(15));
    manager.index_file(&file).unwrap();
    manager.enforce_memory_limits();
    manager.save_index().unwrap();

    let reloaded = project.manager_with(&settings);
    assert_eq!(reloaded.init(None), 12);
    assert_eq!(reloaded.get_chunks(), manager.get_chunks());
}
