//! Document ingestion: parsing and chunking

pub mod chunker;
pub mod parser;

pub use chunker::{reconstruct, SplitKind, TextChunker, TextSpan};
pub use parser::{FileParser, ParsedDocument};
