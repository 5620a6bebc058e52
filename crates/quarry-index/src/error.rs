#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] quarry_llm::LlmError),

    #[error("embedding count mismatch: sent {sent} texts, got {got} vectors")]
    CountMismatch { sent: usize, got: usize },

    #[error("repository produced no indexable text")]
    NoContent,
}

pub type Result<T> = std::result::Result<T, IndexError>;
