//! Prompt assembly, failure classification and answer post-processing

pub mod failure;
pub mod postprocess;
pub mod prompt;
pub mod templates;

pub use failure::FailureKind;
pub use postprocess::add_guideline_footer;
pub use prompt::PromptBuilder;
pub use templates::TEMPLATE_VERSION;
