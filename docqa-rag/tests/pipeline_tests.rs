//! End-to-end tests for ingestion, answering, and sessions.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{FailingEmbedder, FailingGenerator, HashEmbedder, RecordingGenerator, TableEmbedder};
use docqa_rag::{
    Document, FixedSizeChunker, GenerationClient, RagConfig, RagError, RagPipeline, Retriever,
    Session, SimilarityMetric, answer, ingest,
};

const TEXT: &str = "The cat sat. The dog ran. The bird flew.";

fn pipeline_with(
    embedder: Arc<HashEmbedder>,
    generator: Arc<dyn GenerationClient>,
    config: RagConfig,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .generation_client(generator)
        .build()
        .unwrap()
}

fn small_config() -> RagConfig {
    RagConfig::builder().chunk_size(20).chunk_overlap(5).top_k(2).max_context_length(100).build().unwrap()
}

#[tokio::test]
async fn empty_document_answers_with_empty_index() {
    let embedder = HashEmbedder::new(16);
    let index = ingest("", 100, 10, &embedder).await.unwrap();
    assert_eq!(index.len(), 0);

    let generator = RecordingGenerator::new("unused");
    let err = answer(&index, "anything?", 5, 1000, &embedder, &generator).await.unwrap_err();
    assert!(matches!(err, RagError::EmptyIndex));
    assert_eq!(embedder.calls(), 0);
    assert!(generator.last_prompt().is_none());
}

#[tokio::test]
async fn invalid_chunking_is_rejected_before_embedding() {
    let embedder = HashEmbedder::new(16);
    let err = ingest(TEXT, 10, 10, &embedder).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn failing_generation_surfaces_and_leaves_index_untouched() {
    let embedder = HashEmbedder::new(16);
    let index = ingest(TEXT, 20, 5, &embedder).await.unwrap();
    let before = index.clone();

    let err = answer(&index, "Where did the bird go?", 2, 100, &embedder, &FailingGenerator)
        .await
        .unwrap_err();

    match err {
        RagError::GenerationFailure { provider, message } => {
            assert_eq!(provider, "failing");
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("expected generation failure, got {other:?}"),
    }
    assert_eq!(index, before);
    assert_eq!(index.search(index.vector(0).unwrap(), 1).unwrap()[0].chunk.id, 0);
}

#[tokio::test]
async fn failing_embedding_surfaces_during_ingest() {
    let err = ingest(TEXT, 20, 5, &FailingEmbedder).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingFailure { .. }));
}

#[tokio::test]
async fn answer_prompt_carries_best_chunk_first() {
    let chunk_dog = "sat. The dog ran. ";
    let mut table = HashMap::new();
    table.insert("Where is the dog?".to_string(), vec![0.0, 1.0, 0.0]);
    table.insert("The cat sat. ".to_string(), vec![1.0, 0.0, 0.0]);
    table.insert(chunk_dog.to_string(), vec![0.1, 1.0, 0.0]);
    table.insert("ran. The bird flew.".to_string(), vec![0.0, 0.2, 1.0]);
    let embedder = TableEmbedder { table, dimensions: 3 };

    let index = ingest(TEXT, 20, 5, &embedder).await.unwrap();
    assert_eq!(index.len(), 3);

    let results = Retriever::new(&embedder, &index).retrieve("Where is the dog?", 2).await.unwrap();
    assert_eq!(results.iter().map(|r| r.chunk.id).collect::<Vec<_>>(), vec![1, 2]);

    let generator = RecordingGenerator::new("It ran.");
    let text = answer(&index, "Where is the dog?", 2, 100, &embedder, &generator).await.unwrap();
    assert_eq!(text, "It ran.");

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains(&format!("Context:\n{chunk_dog}\n\nran. The bird flew.\n\n")));
    assert!(prompt.ends_with("Question: Where is the dog?\n"));
}

#[tokio::test]
async fn query_embedding_failure_is_propagated() {
    let embedder = HashEmbedder::new(16);
    let index = ingest(TEXT, 20, 5, &embedder).await.unwrap();

    let err = Retriever::new(&FailingEmbedder, &index).retrieve("q", 1).await.unwrap_err();
    match err {
        RagError::EmbeddingFailure { provider, .. } => assert_eq!(provider, "failing"),
        other => panic!("expected embedding failure, got {other:?}"),
    }

    // The index holds 16 dimensions.
    let err = Retriever::new(&HashEmbedder::new(8), &index).retrieve("q", 1).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingFailure { .. }));
}

#[tokio::test]
async fn pipeline_answers_with_sources() {
    let embedder = Arc::new(HashEmbedder::new(32));
    let generator = Arc::new(RecordingGenerator::new("The cat sat."));
    let pipeline = pipeline_with(embedder.clone(), generator.clone(), small_config());

    let index = pipeline.ingest(&Document::new("pets", TEXT)).await.unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.metric(), SimilarityMetric::Cosine);

    let answer = pipeline.answer_with_sources(&index, "What did the cat do?").await.unwrap();
    assert_eq!(answer.text, "The cat sat.");
    assert_eq!(answer.sources.len(), 2);
    assert!(answer.sources[0].score >= answer.sources[1].score);

    let prompt = generator.last_prompt().unwrap();
    let first = prompt.find(&answer.sources[0].chunk.text).unwrap();
    let second = prompt.find(&answer.sources[1].chunk.text).unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn pipeline_uses_configured_chunker_and_metric() {
    let config =
        RagConfig::builder().similarity_metric(SimilarityMetric::Euclidean).build().unwrap();
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(HashEmbedder::new(8)))
        .generation_client(Arc::new(RecordingGenerator::new("ok")))
        .chunker(Arc::new(FixedSizeChunker::new(10, 0).unwrap()))
        .build()
        .unwrap();

    let index = pipeline.ingest(&Document::new("d", TEXT)).await.unwrap();
    assert_eq!(index.len(), 4);
    assert_eq!(index.metric(), SimilarityMetric::Euclidean);
    assert!(index.chunks().all(|c| c.char_len() <= 10));
}

#[tokio::test]
async fn builder_requires_providers_and_valid_config() {
    let missing_generator =
        RagPipeline::builder().embedding_provider(Arc::new(HashEmbedder::new(4))).build();
    assert!(matches!(missing_generator, Err(RagError::InvalidConfiguration(_))));

    let missing_embedder =
        RagPipeline::builder().generation_client(Arc::new(RecordingGenerator::new("x"))).build();
    assert!(matches!(missing_embedder, Err(RagError::InvalidConfiguration(_))));

    let bad_config = RagConfig { chunk_overlap: 2000, ..RagConfig::default() };
    let result = RagPipeline::builder()
        .config(bad_config)
        .embedding_provider(Arc::new(HashEmbedder::new(4)))
        .generation_client(Arc::new(RecordingGenerator::new("x")))
        .build();
    assert!(matches!(result, Err(RagError::InvalidConfiguration(_))));
}

#[tokio::test]
async fn session_serves_repeated_questions_from_one_index() {
    let embedder = Arc::new(HashEmbedder::new(16));
    let generator = Arc::new(RecordingGenerator::new("answer"));
    let pipeline = Arc::new(pipeline_with(embedder.clone(), generator.clone(), small_config()));

    let session = Session::open(pipeline, &Document::new("pets", TEXT)).await.unwrap();
    assert_eq!(session.document_id(), "pets");
    let ingest_calls = embedder.calls();
    assert_eq!(ingest_calls, 3);

    let first = session.ask_with_sources("Which animal flew?").await.unwrap();
    let second = session.ask_with_sources("Which animal flew?").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(session.ask("Who ran?").await.unwrap(), "answer");

    // One embedding per question, no re-ingestion.
    assert_eq!(embedder.calls(), ingest_calls + 3);
    assert_eq!(generator.prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn session_over_empty_document_reports_empty_index() {
    let pipeline = Arc::new(pipeline_with(
        Arc::new(HashEmbedder::new(16)),
        Arc::new(RecordingGenerator::new("unused")),
        small_config(),
    ));
    let session = Session::open(pipeline, &Document::new("blank", "")).await.unwrap();
    assert!(session.index().is_empty());
    assert!(matches!(session.ask("hello?").await, Err(RagError::EmptyIndex)));
}

#[tokio::test]
async fn session_generation_failure_is_not_replaced_by_a_fallback() {
    let pipeline = Arc::new(pipeline_with(
        Arc::new(HashEmbedder::new(16)),
        Arc::new(FailingGenerator),
        small_config(),
    ));
    let session = Session::open(pipeline, &Document::new("pets", TEXT)).await.unwrap();
    let before = session.index().clone();

    assert!(matches!(session.ask("Who sat?").await, Err(RagError::GenerationFailure { .. })));
    assert_eq!(session.index(), &before);
}
