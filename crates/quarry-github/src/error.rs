#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("repository URL needs at least two path segments: {input}")]
    InvalidUrl { input: String },

    #[error("repository not found or not accessible: {owner}/{name}")]
    NotFound { owner: String, name: String },

    #[error("GitHub API rate limit exhausted")]
    RateLimited,

    #[error("GitHub API request failed (status {status})")]
    Status { status: reqwest::StatusCode },

    #[error("content decode failed: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, GithubError>;
