use super::*;
use crate::test_support::{FailingEmbedder, KeywordEmbedder, sample_store};
use tempfile::TempDir;

#[test]
fn build_follows_store_order() {
    let store = sample_store();
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::new()));

    let output = builder.build(&store).expect("build should succeed");

    assert_eq!(output.document_ids, store.ids());
    assert_eq!(output.index.len(), 3);
    assert_eq!(output.index.dimension(), Some(KeywordEmbedder::dimension()));
}

#[test]
fn rebuilding_gives_same_mapping() {
    let store = sample_store();
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::new())).with_batch_size(2);

    let first = builder.build(&store).expect("first build should succeed");
    let second = builder.build(&store).expect("second build should succeed");

    assert_eq!(first, second);
}

#[test]
fn batches_cover_every_document() {
    let store = sample_store();
    let embedder = Arc::new(KeywordEmbedder::new());
    let builder = IndexBuilder::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>)
        .with_batch_size(1);

    let output = builder.build(&store).expect("build should succeed");
    assert_eq!(output.index.len(), 3);
    assert_eq!(embedder.calls(), 3);
}

#[test]
fn empty_store_builds_empty_index() {
    let store = DocumentStore::default();
    let output = IndexBuilder::new(Arc::new(KeywordEmbedder::new()))
        .build(&store)
        .expect("build should succeed");
    assert!(output.index.is_empty());
    assert!(output.document_ids.is_empty());
}

#[test]
fn provider_failure_fails_the_build() {
    let store = sample_store();
    let builder = IndexBuilder::new(Arc::new(FailingEmbedder::after(2))).with_batch_size(1);

    assert!(matches!(
        builder.build(&store),
        Err(RagError::Embedding(_))
    ));
}

#[test]
fn persist_writes_loadable_artifact() {
    let dir = TempDir::new().expect("should create TempDir");
    let store = sample_store();
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::new()));

    let output = builder
        .build_and_persist(&store, dir.path())
        .expect("build should succeed");

    let artifact = IndexArtifact::load(dir.path()).expect("artifact should load");
    assert_eq!(artifact.index, output.index);
    assert_eq!(artifact.manifest.embedding_model, "keyword-test");
    assert!(artifact.verify_against(&store).is_ok());
}

#[test]
fn failed_build_leaves_previous_artifact_untouched() {
    let dir = TempDir::new().expect("should create TempDir");
    let store = sample_store();

    IndexBuilder::new(Arc::new(KeywordEmbedder::new()))
        .build_and_persist(&store, dir.path())
        .expect("first build should succeed");
    let before = IndexArtifact::load(dir.path()).expect("artifact should load");

    let result = IndexBuilder::new(Arc::new(FailingEmbedder::after(1)))
        .with_batch_size(1)
        .build_and_persist(&store, dir.path());
    assert!(result.is_err());

    let after = IndexArtifact::load(dir.path()).expect("artifact should still load");
    assert_eq!(before, after);
}

#[test]
fn failed_first_build_writes_nothing() {
    let dir = TempDir::new().expect("should create TempDir");
    let index_dir = dir.path().join("index");

    let result = IndexBuilder::new(Arc::new(FailingEmbedder::after(0)))
        .build_and_persist(&sample_store(), &index_dir);

    assert!(result.is_err());
    assert!(!IndexArtifact::exists(&index_dir));
}
