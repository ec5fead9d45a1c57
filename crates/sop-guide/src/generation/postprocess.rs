//! Answer post-processing

use once_cell::sync::Lazy;
use regex::Regex;

use super::templates::GUIDELINE_FOOTER;

/// Mentions of the guideline that earn the attribution footer
static GUIDELINE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)guía|eshre").expect("Invalid regex"));

/// Append the guideline footer when the answer mentions the guideline
pub fn add_guideline_footer(answer: String) -> String {
    if GUIDELINE_MENTION.is_match(&answer) {
        answer + GUIDELINE_FOOTER
    } else {
        answer
    }
}
