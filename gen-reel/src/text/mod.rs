//! Text processing: cleaning, sentence splitting, and chunking.

pub mod chunker;
mod cleaner;
mod sentences;

pub use chunker::{chunk, ChunkConstraints};
pub use cleaner::clean_text;
