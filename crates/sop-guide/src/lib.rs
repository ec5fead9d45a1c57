//! sop-guide: retrieval-augmented patient education about polycystic ovary syndrome
//!
//! An offline indexer turns the reference guideline into a persisted vector
//! index. The online pipeline answers questions grounded on that index and
//! gives educational readings of lab results, cycle charts and ultrasound
//! images through a hosted generative model. Both are exposed over HTTP and a
//! terminal chat.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::QueryPipeline;
pub use types::{
    conversation::{Conversation, Role, Turn},
    document::{Chunk, ChunkSource, Document, FileType},
    image::ImageKind,
    response::{AnalysisReport, ChatAnswer, ChatOutcome},
};
