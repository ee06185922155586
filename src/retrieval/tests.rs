use super::*;
use crate::index::IndexBuilder;
use crate::test_support::{FixedDimensionEmbedder, KALE, KeywordEmbedder, STEAK, sample_store};

fn retriever_with(provider: Arc<dyn EmbeddingProvider>) -> Retriever {
    let store = sample_store();
    let output = IndexBuilder::new(Arc::new(KeywordEmbedder::new()))
        .build(&store)
        .expect("build should succeed");
    Retriever::new(Arc::new(store), Arc::new(output.index), provider)
}

fn retriever() -> Retriever {
    retriever_with(Arc::new(KeywordEmbedder::new()))
}

#[test]
fn exact_description_is_the_closest_match() {
    let results = retriever()
        .retrieve_scored(STEAK, 1)
        .expect("retrieve should succeed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, 1002);
    assert!(results[0].distance.abs() < 1e-5);
}

#[test]
fn kale_question_ranks_kale_first() {
    let results = retriever()
        .retrieve_scored("Is kale healthy?", 3)
        .expect("retrieve should succeed");

    let ids: Vec<_> = results.iter().map(|r| r.document.id).collect();
    assert_eq!(ids[0], 1003);
    assert_eq!(results[0].document.description, KALE);
    assert!(results[0].distance < results[1].distance);
    assert!(results[1].distance <= results[2].distance);
}

#[test]
fn k_larger_than_dataset_returns_everything() {
    let docs = retriever()
        .retrieve("protein", 10)
        .expect("retrieve should succeed");
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].id, 1002);
}

#[test]
fn default_k_is_capped_by_dataset_size() {
    let docs = retriever()
        .retrieve_default("fruit")
        .expect("retrieve should succeed");
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].id, 1001);
}

#[test]
fn retrieved_documents_keep_their_attributes() {
    let docs = retriever().retrieve("kale", 1).expect("retrieve should succeed");
    assert_eq!(
        docs[0].attributes.get("vitamin_k_ug").map(String::as_str),
        Some("389.6")
    );
}

#[test]
fn wrong_query_dimension_is_an_embedding_error() {
    let retriever = retriever_with(Arc::new(FixedDimensionEmbedder(4)));
    assert!(matches!(
        retriever.retrieve("kale", 1),
        Err(RagError::Embedding(_))
    ));
}

#[test]
fn empty_index_is_reported() {
    let retriever = Retriever::new(
        Arc::new(sample_store()),
        Arc::new(VectorIndex::new()),
        Arc::new(KeywordEmbedder::new()),
    );
    assert!(matches!(
        retriever.retrieve("kale", 1),
        Err(RagError::EmptyIndex)
    ));
}

#[test]
fn index_id_missing_from_store_is_unknown_document() {
    let embedder = KeywordEmbedder::new();
    let mut index = VectorIndex::new();
    index
        .add(&[(4242, embedder.encode(KALE).expect("encode should succeed"))])
        .expect("add should succeed");

    let retriever = Retriever::new(
        Arc::new(sample_store()),
        Arc::new(index),
        Arc::new(KeywordEmbedder::new()),
    );
    assert!(matches!(
        retriever.retrieve("kale", 1),
        Err(RagError::UnknownDocument(4242))
    ));
}

#[test]
fn clones_can_be_used_from_several_threads() {
    let retriever = retriever();
    let handles: Vec<_> = ["kale", "steak", "apple"]
        .into_iter()
        .map(|query| {
            let retriever = retriever.clone();
            std::thread::spawn(move || retriever.retrieve(query, 1))
        })
        .collect();

    let ids: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread should not panic").expect("retrieve should succeed")[0].id)
        .collect();
    assert_eq!(ids, vec![1003, 1002, 1001]);
}
