//! OpenAI-compatible chat completion and embedding client.

pub mod error;
pub mod http;
pub mod openai;

pub use error::LlmError;
pub use openai::OpenAiProvider;

/// Boxed future returned by a batched embedding call.
///
/// Index construction takes the embedding backend as a closure returning this
/// future, so tests can inject stub embeddings without a live client.
pub type EmbedBatchFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send>,
>;
