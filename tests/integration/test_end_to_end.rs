//! Indexing a mixed project and querying it.

use crate::common::{TestProject, sample_content};
use ragindex::{ContextFormatter, EmbeddingMethod, IndexError, SimilarityKind};

#[test]
fn test_index_project_with_mixed_files() {
    let project = TestProject::new();
    project.add_file(
        "docs/guide.md",
        "Paragraph one explains chunking strategies.\n\nParagraph two explains similarity scoring.\n",
    );
    project.add_file("docs/book.txt", &sample_content::prose(10_000));
    project.add_file("src/math.cpp", sample_content::CPP);
    project.add_file(
        "src/ignored.py",
        "def ignored():\n    return 'python is not indexed'\n",
    );

    let manager = project.manager(EmbeddingMethod::WordHash);
    let summary = manager.index_project(&project.content_root()).unwrap();

    assert_eq!(summary.files_indexed, 3);
    assert_eq!(summary.files_failed, 0);
    assert!(!summary.walk_aborted);
    assert_eq!(summary.chunks_added, manager.len());

    let chunks = manager.get_chunks();

    let markdown: Vec<_> = chunks
        .iter()
        .filter(|c| c.file_name.ends_with("guide.md"))
        .collect();
    assert_eq!(markdown.len(), 2);
    assert_eq!((markdown[0].start_line, markdown[0].end_line), (1, 1));
    assert_eq!((markdown[1].start_line, markdown[1].end_line), (3, 3));

    let text: Vec<_> = chunks
        .iter()
        .filter(|c| c.file_name.ends_with("book.txt"))
        .collect();
    assert!(text.len() >= 2, "10k chars should span several windows");
    assert!(text.iter().all(|c| !c.is_line_addressable()));

    let symbols: Vec<_> = chunks
        .iter()
        .filter(|c| c.file_name.ends_with("math.cpp"))
        .map(|c| c.symbol_name.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(symbols, vec!["add", "average", "print_report"]);

    assert!(chunks.iter().all(|c| c.file_name.is_absolute()));
    assert!(
        chunks
            .iter()
            .all(|c| !c.code.is_empty() && !c.code.contains('\0'))
    );

    let results = manager.retrieve("similarity scoring", 3);
    assert!(!results.is_empty());
    assert!(results.len() <= 3);
    assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    assert!(results.iter().all(|(_, score)| *score >= 0.01));
    assert!(results[0].0.contains("similarity scoring"));
}

#[test]
fn test_tfidf_retrieval_is_bounded_and_ordered() {
    let project = TestProject::new();
    project.add_file("notes/a.md", sample_content::MARKDOWN);
    project.add_file("notes/b.cpp", sample_content::CPP);

    let manager = project.manager(EmbeddingMethod::TfIdf);
    manager.index_project(&project.content_root()).unwrap();
    assert!(!manager.is_empty());

    for kind in SimilarityKind::ALL {
        manager.set_similarity(kind);
        let results = manager.retrieve("checksum binary file", 3);
        assert!(results.len() <= 3, "{kind} returned too many results");
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

#[test]
fn test_retrieve_relevant_renders_context() {
    let project = TestProject::new();
    let file = project.add_file("math.cpp", sample_content::CPP);

    let manager = project.manager(EmbeddingMethod::WordHash);
    manager.index_file(&file).unwrap();

    let hits = manager.retrieve_relevant("average of values total", 2);
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.symbol_name, "average");

    let context = ContextFormatter::default().format(&hits);
    assert!(context.starts_with("=== Chunk 1 (score: "));
    assert!(context.contains("File: math.cpp"));
    assert!(context.contains("Symbol: average"));
    assert!(context.contains(&format!(
        "Lines: {}-{}",
        hits[0].chunk.start_line, hits[0].chunk.end_line
    )));

    let nothing = manager.retrieve_relevant("zebra xylophone", 2);
    assert_eq!(
        ContextFormatter::default().format(&nothing),
        "[No relevant context found]"
    );
}

#[test]
fn test_reindexing_replaces_subtree() {
    let project = TestProject::new();
    project.add_file("a/one.md", "First version of the first document.\n");
    project.add_file("b/two.md", "Untouched document in another folder.\n");

    let manager = project.manager(EmbeddingMethod::WordHash);
    manager.index_project(&project.content_root()).unwrap();
    assert_eq!(manager.len(), 2);

    project.add_file(
        "a/one.md",
        "Second version of the first document.\n\nWith a new paragraph.\n",
    );
    let folder = project.content_root().join("a");
    let summary = manager.index_project(&folder).unwrap();
    assert_eq!(summary.chunks_removed, 1);

    let chunks = manager.get_chunks();
    assert_eq!(chunks.len(), 3);
    assert!(!chunks.iter().any(|c| c.code.contains("First version")));
    assert!(chunks.iter().any(|c| c.file_name.ends_with("b/two.md")));
    assert_eq!(manager.stats().reverse_map_len, 3);
}

#[test]
fn test_non_ascii_is_sanitized() {
    let project = TestProject::new();
    let file = project.add_file("intl.md", "Café résumé naïve entries for sanitizing.\n");

    let manager = project.manager(EmbeddingMethod::WordHash);
    manager.index_file(&file).unwrap();

    let chunk = &manager.get_chunks()[0];
    assert!(chunk.code.is_ascii());
    assert!(chunk.code.starts_with("Caf   r"));
}

#[test]
fn test_missing_root_is_rejected() {
    let project = TestProject::new();
    let manager = project.manager(EmbeddingMethod::WordHash);

    let err = manager
        .index_project(&project.path().join("does-not-exist"))
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidRoot { .. }));
    assert_eq!(err.status_code(), "INVALID_ROOT");
}
