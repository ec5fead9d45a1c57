//! Vector index persistence and similarity search

pub mod index;
pub mod search;

pub use index::{IndexEntry, IndexManifest, ModelFingerprint, VectorIndex, INDEX_FORMAT_VERSION};
pub use search::Retriever;
