//! In-memory embedding index, rebuilt wholesale on every repository load.

use quarry_llm::EmbedBatchFuture;

use crate::error::IndexError;
use crate::splitter::{Chunk, TextSplitter};

/// Batch-embedding hook injected by the caller.
pub type EmbedFn = Box<dyn Fn(Vec<String>) -> EmbedBatchFuture + Send + Sync>;

/// Splits prepared blocks into chunks and embeds them through one batched
/// call per build.
pub struct IndexBuilder {
    splitter: TextSplitter,
    embed: EmbedFn,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(splitter: TextSplitter, embed: EmbedFn) -> Self {
        Self { splitter, embed }
    }

    /// Build a fresh index from the prepared blocks.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NoContent`] when the blocks hold no text,
    /// [`IndexError::Embedding`] when the embedding call fails, and
    /// [`IndexError::CountMismatch`] when the provider returns a different
    /// number of vectors than texts sent. No partial index survives any of
    /// these.
    pub async fn build(&self, blocks: &[String]) -> Result<EmbeddingIndex, IndexError> {
        let corpus = blocks.join("\n\n");
        let chunks = self.splitter.split(&corpus);
        if chunks.is_empty() {
            return Err(IndexError::NoContent);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = (self.embed)(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(IndexError::CountMismatch {
                sent: chunks.len(),
                got: vectors.len(),
            });
        }

        tracing::debug!(chunks = chunks.len(), "embedding index built");
        Ok(EmbeddingIndex {
            entries: chunks.into_iter().zip(vectors).collect(),
        })
    }
}

/// Embedded chunks with exact cosine-similarity search.
#[derive(Debug)]
pub struct EmbeddingIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
}

/// A search hit: the matching chunk and its similarity score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

impl EmbeddingIndex {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank every chunk against `query` by cosine similarity, best first,
    /// returning at most `k` hits. Ties keep corpus order.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut hits: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|(chunk, vector)| ScoredChunk {
                chunk,
                score: cosine_similarity(query, vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::SplitterConfig;
    use quarry_llm::LlmError;

    fn builder_with(embed: EmbedFn) -> IndexBuilder {
        IndexBuilder::new(TextSplitter::new(SplitterConfig::default()), embed)
    }

    fn unit_embedder() -> EmbedFn {
        Box::new(|texts| -> EmbedBatchFuture {
            Box::pin(async move { Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()) })
        })
    }

    fn index_of(entries: Vec<(&str, Vec<f32>)>) -> EmbeddingIndex {
        EmbeddingIndex {
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(index, (content, vector))| {
                    (
                        Chunk {
                            content: content.to_owned(),
                            index,
                        },
                        vector,
                    )
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn build_embeds_every_chunk() {
        let builder = builder_with(unit_embedder());
        let blocks = vec!["README.md:\nHello".to_owned(), "File: a.py".to_owned()];
        let index = builder.build(&blocks).await.unwrap();
        // Both blocks fit one chunk after joining.
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[tokio::test]
    async fn build_empty_blocks_is_no_content() {
        let builder = builder_with(unit_embedder());
        let err = builder.build(&[]).await.unwrap_err();
        assert!(matches!(err, IndexError::NoContent));
    }

    #[tokio::test]
    async fn build_count_mismatch_fails() {
        let builder = builder_with(Box::new(|_| -> EmbedBatchFuture {
            Box::pin(async { Ok(Vec::new()) })
        }));
        let err = builder
            .build(&["some content".to_owned()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::CountMismatch { sent: 1, got: 0 }
        ));
    }

    #[tokio::test]
    async fn build_propagates_embedding_failure() {
        let builder = builder_with(Box::new(|_| -> EmbedBatchFuture {
            Box::pin(async { Err(LlmError::RateLimited) })
        }));
        let err = builder
            .build(&["some content".to_owned()])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(LlmError::RateLimited)));
    }

    #[tokio::test]
    async fn build_chunks_long_corpus() {
        let builder = builder_with(unit_embedder());
        let blocks = vec!["word ".repeat(600)];
        let index = builder.build(&blocks).await.unwrap();
        assert!(index.len() > 1);
    }

    #[test]
    fn search_ranks_by_similarity() {
        let index = index_of(vec![
            ("x axis", vec![1.0, 0.0]),
            ("y axis", vec![0.0, 1.0]),
            ("diagonal", vec![0.7, 0.7]),
        ]);

        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.content, "x axis");
        assert_eq!(hits[1].chunk.content, "diagonal");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn search_returns_at_most_k() {
        let index = index_of(vec![
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.9, 0.1]),
            ("c", vec![0.8, 0.2]),
        ]);
        assert_eq!(index.search(&[1.0, 0.0], 2).len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn search_ties_keep_corpus_order() {
        let index = index_of(vec![("first", vec![1.0, 0.0]), ("second", vec![1.0, 0.0])]);
        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits[0].chunk.index, 0);
        assert_eq!(hits[1].chunk.index, 1);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_identical_is_one() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
    }
}
