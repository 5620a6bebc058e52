//! Session orchestration for repository question answering: configuration,
//! the load/ask entry points, and the error taxonomy they surface.

pub mod config;
pub mod error;
pub mod prompt;
pub mod session;

pub use config::{Config, GithubConfig, OpenAiConfig, RetrievalConfig};
pub use error::SessionError;
pub use session::{AnswerResult, LoadSummary, RepoSession};
