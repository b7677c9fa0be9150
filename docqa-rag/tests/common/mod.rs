//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, GenerationClient, RagError, Result};

/// Deterministic hash-based embeddings: the direction depends on the text.
pub struct HashEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let hash = text.bytes().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    });
    let mut emb: Vec<f32> = (0..dimensions as u64)
        .map(|i| {
            // splitmix64 finaliser, seeded per component
            let mut z = hash ^ i.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            // top 24 bits into [-1, 1)
            (z >> 40) as f32 / (1u64 << 23) as f32 - 1.0
        })
        .collect();
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(hash_embedding(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Returns fixed vectors for known texts and the hash embedding otherwise.
pub struct TableEmbedder {
    pub table: HashMap<String, Vec<f32>>,
    pub dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.table.get(text).cloned().unwrap_or_else(|| hash_embedding(text, self.dimensions)))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Always fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::embedding("failing", "model not loaded"))
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Reports one dimensionality and produces another.
pub struct WrongDimensionEmbedder;

#[async_trait]
impl EmbeddingProvider for WrongDimensionEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, 4))
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Fails on the n-th text it is asked to embed (0-based) and succeeds otherwise.
pub struct FailOnNth {
    pub n: usize,
    pub seen: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FailOnNth {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.seen.fetch_add(1, Ordering::SeqCst) == self.n {
            return Err(RagError::embedding("flaky", "connection reset"));
        }
        Ok(hash_embedding(text, 8))
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Batches finish in reverse order of submission: later batches sleep less.
pub struct ReverseLatencyEmbedder {
    pub dimensions: usize,
    pub started: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for ReverseLatencyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, self.dimensions))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let order = self.started.fetch_add(1, Ordering::SeqCst) as u64;
        tokio::time::sleep(Duration::from_millis(100u64.saturating_sub(order * 10))).await;
        Ok(texts.iter().map(|t| hash_embedding(t, self.dimensions)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Records every prompt and answers with a fixed string.
pub struct RecordingGenerator {
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationClient for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Always fails.
pub struct FailingGenerator;

#[async_trait]
impl GenerationClient for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::generation("failing", "quota exceeded"))
    }
}
