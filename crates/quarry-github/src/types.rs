use chrono::{DateTime, Utc};

use crate::error::GithubError;

/// Everything fetched for one repository load. Built once per load and
/// consumed by the indexing pipeline; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RepositoryContent {
    pub readme: String,
    pub files: Vec<FileRecord>,
    pub commits: Vec<CommitRecord>,
}

/// One text file that passed the size and suffix filters.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    /// Extension after the last `.` in the file name, or `"unknown"`.
    pub file_type: String,
}

/// One commit from the recent-history window.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub author: String,
}

/// Repository coordinates parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub name: String,
}

impl RepoLocator {
    /// Take owner and name from the trailing two path segments. Scheme and
    /// host prefixes are ignored, so both `https://github.com/rust-lang/rust`
    /// and `rust-lang/rust` parse.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidUrl`] when fewer than two non-empty
    /// segments are present.
    pub fn parse(input: &str) -> Result<Self, GithubError> {
        let mut segments = input
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(name), Some(owner)) => Ok(Self {
                owner: owner.to_owned(),
                name: name.to_owned(),
            }),
            _ => Err(GithubError::InvalidUrl {
                input: input.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
