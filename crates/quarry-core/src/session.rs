//! Repository question-answering session: load once, ask repeatedly.

use quarry_github::GithubClient;
use quarry_index::{EmbeddingIndex, IndexBuilder, SplitterConfig, TextSplitter, prepare_blocks};
use quarry_llm::{EmbedBatchFuture, OpenAiProvider};

use crate::config::Config;
use crate::error::SessionError;
use crate::prompt::build_prompt;

/// Counts reported after a successful load.
#[derive(Debug, Clone, Copy)]
pub struct LoadSummary {
    pub files: usize,
    pub commits: usize,
    pub chunks: usize,
}

/// Synthesized answer plus the chunk texts it was grounded on.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<String>,
}

/// One loaded repository and the machinery to answer questions about it.
pub struct RepoSession {
    github: GithubClient,
    llm: OpenAiProvider,
    splitter_config: SplitterConfig,
    top_k: usize,
    index: Option<EmbeddingIndex>,
}

impl RepoSession {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let github = GithubClient::new(config.github.api_url.clone(), config.github.token.clone());
        let llm = OpenAiProvider::new(
            config.openai.api_key.clone().unwrap_or_default(),
            config.openai.base_url.clone(),
            config.openai.model.clone(),
            config.openai.embedding_model.clone(),
        );
        Self {
            github,
            llm,
            splitter_config: SplitterConfig {
                chunk_size: config.retrieval.chunk_size,
                chunk_overlap: config.retrieval.chunk_overlap,
            },
            top_k: config.retrieval.top_k,
            index: None,
        }
    }

    /// Fetch, prepare, chunk, and embed a repository, replacing any
    /// previously loaded index. A failed load leaves the previous index in
    /// place.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures as [`SessionError::Github`] and index
    /// construction failures as [`SessionError::Index`].
    pub async fn load_repository(&mut self, url: &str) -> Result<LoadSummary, SessionError> {
        let content = self.github.fetch(url).await?;
        let blocks = prepare_blocks(&content);

        let splitter = TextSplitter::new(self.splitter_config.clone());
        let llm = self.llm.clone();
        let builder = IndexBuilder::new(
            splitter,
            Box::new(move |texts| -> EmbedBatchFuture {
                let llm = llm.clone();
                Box::pin(async move { llm.embed_batch(&texts).await })
            }),
        );
        let index = builder.build(&blocks).await?;

        let summary = LoadSummary {
            files: content.files.len(),
            commits: content.commits.len(),
            chunks: index.len(),
        };
        self.index = Some(index);
        tracing::info!(
            files = summary.files,
            commits = summary.commits,
            chunks = summary.chunks,
            "repository indexed"
        );
        Ok(summary)
    }

    /// Answer a question from the loaded repository: embed the query, take
    /// the top-k chunks by cosine similarity, and run one chat completion.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotInitialized`] when no repository has been
    /// loaded, and [`SessionError::Llm`] when embedding or completion fails.
    pub async fn ask_question(&self, question: &str) -> Result<AnswerResult, SessionError> {
        let Some(ref index) = self.index else {
            return Err(SessionError::NotInitialized);
        };

        let query = self.llm.embed(question).await?;
        let hits = index.search(&query, self.top_k);
        let prompt = build_prompt(&hits, question);
        let answer = self.llm.complete(&prompt).await?;

        Ok(AnswerResult {
            answer,
            sources: hits.iter().map(|hit| hit.chunk.content.clone()).collect(),
        })
    }
}
