//! Document preparation, chunking, and in-memory embedding search.

pub mod error;
pub mod index;
pub mod prepare;
pub mod splitter;

pub use error::IndexError;
pub use index::{EmbedFn, EmbeddingIndex, IndexBuilder, ScoredChunk};
pub use prepare::prepare_blocks;
pub use splitter::{Chunk, SplitterConfig, TextSplitter};
