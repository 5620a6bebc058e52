//! GitHub REST client: repository files, README, and commit history.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GithubClient, MAX_COMMITS, MAX_FILE_SIZE};
pub use error::GithubError;
pub use types::{CommitRecord, FileRecord, RepoLocator, RepositoryContent};
