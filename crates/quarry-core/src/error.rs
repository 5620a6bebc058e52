#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no repository loaded; call load_repository first")]
    NotInitialized,

    #[error(transparent)]
    Github(#[from] quarry_github::GithubError),

    #[error(transparent)]
    Index(#[from] quarry_index::IndexError),

    #[error(transparent)]
    Llm(#[from] quarry_llm::LlmError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
