//! REST client for the GitHub v3 API and repository content assembly.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GithubError;
use crate::types::{CommitRecord, FileRecord, RepoLocator, RepositoryContent};

/// Hard ceiling on fetched file size.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Most recent commits kept per load.
pub const MAX_COMMITS: usize = 50;

/// Suffixes treated as text, matched case-insensitively against the end of
/// the file name (so `.gitignore` matches the bare dotfile too).
const TEXT_SUFFIXES: &[&str] = &[
    // Source code
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".cpp", ".c", ".h", ".hpp", ".cs", ".go",
    ".rb", ".php", ".swift", ".kt", ".scala", ".rs", ".dart",
    // Web
    ".html", ".css", ".scss", ".sass", ".less", ".xml", ".json", ".yaml", ".yml",
    // Configuration
    ".env", ".config", ".ini", ".toml", ".properties",
    // Documentation
    ".md", ".txt", ".rst", ".adoc",
    // Scripts
    ".sh", ".bash", ".zsh", ".ps1", ".bat",
    // Build files
    ".gradle", ".pom", ".build", ".cmake", ".makefile",
    // Other text files
    ".gitignore", ".dockerignore", ".editorconfig", ".eslintrc", ".prettierrc",
];

pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Build a client for the given API base URL. A `None` token means
    /// unauthenticated access (public repositories, lower rate limits).
    #[must_use]
    pub fn new(mut base_url: String, token: Option<String>) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        // GitHub rejects requests without a user agent.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("default HTTP client construction must not fail");
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Fetch everything needed to index a repository: README, the filtered
    /// file tree, and recent commit history.
    ///
    /// README and commit history degrade to empty values when their fetch
    /// fails; individual unreadable files are skipped with a notice. Rate
    /// limiting aborts the whole fetch wherever it strikes.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidUrl`] for inputs with fewer than two
    /// path segments, [`GithubError::NotFound`] when the repository does not
    /// resolve, [`GithubError::RateLimited`] on throttling, and the
    /// underlying HTTP or status error when the tree walk itself fails.
    pub async fn fetch(&self, url: &str) -> Result<RepositoryContent, GithubError> {
        let repo = RepoLocator::parse(url)?;
        self.probe(&repo).await?;

        let readme = match self.readme(&repo).await {
            Ok(text) => text,
            Err(GithubError::RateLimited) => return Err(GithubError::RateLimited),
            Err(e) => {
                tracing::debug!(repo = %repo, error = %e, "no readable README");
                String::new()
            }
        };

        let files = self.walk_dir(&repo, String::new()).await?;

        let commits = match self.recent_commits(&repo).await {
            Ok(commits) => commits,
            Err(GithubError::RateLimited) => return Err(GithubError::RateLimited),
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "commit history unavailable");
                Vec::new()
            }
        };

        tracing::info!(
            repo = %repo,
            files = files.len(),
            commits = commits.len(),
            has_readme = !readme.is_empty(),
            "repository fetched"
        );

        Ok(RepositoryContent {
            readme,
            files,
            commits,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, path: &str) -> Result<reqwest::Response, GithubError> {
        let response = self.get(path).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || (status == reqwest::StatusCode::FORBIDDEN && rate_limit_exhausted(&response))
        {
            tracing::warn!(%path, "GitHub rate limit exhausted");
            return Err(GithubError::RateLimited);
        }

        Err(GithubError::Status { status })
    }

    /// Confirm the repository exists and is accessible.
    async fn probe(&self, repo: &RepoLocator) -> Result<(), GithubError> {
        match self.send(&format!("/repos/{repo}")).await {
            Ok(_) => Ok(()),
            Err(GithubError::Status { status }) if status == reqwest::StatusCode::NOT_FOUND => {
                Err(GithubError::NotFound {
                    owner: repo.owner.clone(),
                    name: repo.name.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn readme(&self, repo: &RepoLocator) -> Result<String, GithubError> {
        let payload: ContentPayload = self
            .send(&format!("/repos/{repo}/readme"))
            .await?
            .json()
            .await?;
        if payload.encoding.as_deref() == Some("base64") {
            decode_base64_text(payload.content.as_deref().unwrap_or_default())
        } else {
            Err(GithubError::Decode(
                "README served without inline content".into(),
            ))
        }
    }

    /// Depth-first walk in listing order. Unreadable or filtered files are
    /// skipped; a failed directory listing fails the walk.
    fn walk_dir<'a>(
        &'a self,
        repo: &'a RepoLocator,
        path: String,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FileRecord>, GithubError>> + Send + 'a>> {
        Box::pin(async move {
            let mut files = Vec::new();

            for entry in self.list_dir(repo, &path).await? {
                match entry.kind.as_str() {
                    "dir" => {
                        files.extend(self.walk_dir(repo, entry.path).await?);
                    }
                    "file" => {
                        if entry.size > MAX_FILE_SIZE {
                            tracing::debug!(
                                path = %entry.path,
                                size = entry.size,
                                "skipping oversized file"
                            );
                            continue;
                        }
                        if !is_text_name(&entry.name) {
                            tracing::debug!(path = %entry.path, "skipping non-text file");
                            continue;
                        }
                        match self.file_content(repo, &entry).await {
                            Ok(content) => {
                                if content.is_empty() {
                                    continue;
                                }
                                let file_type = file_type_of(&entry.name);
                                files.push(FileRecord {
                                    path: entry.path,
                                    content,
                                    file_type,
                                });
                            }
                            Err(GithubError::RateLimited) => {
                                return Err(GithubError::RateLimited);
                            }
                            Err(e) => {
                                tracing::warn!(
                                    path = %entry.path,
                                    error = %e,
                                    "skipping unreadable file"
                                );
                            }
                        }
                    }
                    // Symlinks and submodules carry no indexable content.
                    _ => {}
                }
            }

            Ok(files)
        })
    }

    async fn list_dir(
        &self,
        repo: &RepoLocator,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GithubError> {
        let url_path = if path.is_empty() {
            format!("/repos/{repo}/contents")
        } else {
            format!("/repos/{repo}/contents/{path}")
        };
        Ok(self.send(&url_path).await?.json().await?)
    }

    async fn file_content(
        &self,
        repo: &RepoLocator,
        entry: &ContentEntry,
    ) -> Result<String, GithubError> {
        let payload: ContentPayload = self
            .send(&format!("/repos/{repo}/contents/{}", entry.path))
            .await?
            .json()
            .await?;

        if payload.encoding.as_deref() == Some("base64") {
            decode_base64_text(payload.content.as_deref().unwrap_or_default())
        } else {
            // The contents API stops inlining payloads at 1 MiB; the blob
            // endpoint serves the remainder up to the size ceiling.
            self.blob_text(repo, &entry.sha).await
        }
    }

    async fn blob_text(&self, repo: &RepoLocator, sha: &str) -> Result<String, GithubError> {
        let payload: ContentPayload = self
            .send(&format!("/repos/{repo}/git/blobs/{sha}"))
            .await?
            .json()
            .await?;
        decode_base64_text(payload.content.as_deref().unwrap_or_default())
    }

    async fn recent_commits(&self, repo: &RepoLocator) -> Result<Vec<CommitRecord>, GithubError> {
        let envelopes: Vec<CommitEnvelope> = self
            .send(&format!("/repos/{repo}/commits?per_page={MAX_COMMITS}"))
            .await?
            .json()
            .await?;

        Ok(envelopes
            .into_iter()
            .take(MAX_COMMITS)
            .filter_map(|envelope| match envelope.commit.author {
                Some(GitActor {
                    name: Some(name),
                    date: Some(date),
                }) => Some(CommitRecord {
                    sha: envelope.sha,
                    message: envelope.commit.message,
                    date,
                    author: name,
                }),
                _ => {
                    tracing::debug!(sha = %envelope.sha, "skipping commit without author metadata");
                    None
                }
            })
            .collect())
    }
}

fn rate_limit_exhausted(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0")
}

fn is_text_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    TEXT_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

fn file_type_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_owned(),
        _ => "unknown".to_owned(),
    }
}

/// GitHub wraps base64 payloads at 60 columns; strip the line breaks first.
fn decode_base64_text(raw: &str) -> Result<String, GithubError> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GithubError::Decode(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|_| GithubError::Decode("content is not valid UTF-8".into()))
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentPayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct CommitEnvelope {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    #[serde(default)]
    author: Option<GitActor>,
}

#[derive(Deserialize)]
struct GitActor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}
