//! Classification of generation failures into user-facing messages

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{ChatOutcome, ImageKind};

use super::templates::{GENERIC_ERROR_MESSAGE, QUOTA_EXCEEDED_MESSAGE, SAFETY_BLOCK_MESSAGE};

/// What went wrong, as far as the user is concerned
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SafetyBlock,
    QuotaExceeded,
    Generic,
}

impl FailureKind {
    /// Classify an error. Typed variants win; otherwise the error text is
    /// searched, safety keywords first.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::SafetyBlocked(_) => Self::SafetyBlock,
            Error::QuotaExceeded(_) => Self::QuotaExceeded,
            other => Self::classify_message(&other.to_string()),
        }
    }

    /// Keyword classification of a raw error message
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("safety") || lower.contains("block") {
            Self::SafetyBlock
        } else if lower.contains("quota") || lower.contains("429") {
            Self::QuotaExceeded
        } else {
            Self::Generic
        }
    }

    /// Fixed message for a failed answer
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::SafetyBlock => SAFETY_BLOCK_MESSAGE,
            Self::QuotaExceeded => QUOTA_EXCEEDED_MESSAGE,
            Self::Generic => GENERIC_ERROR_MESSAGE,
        }
    }

    /// Fixed message for a failed image analysis; safety wording depends on the kind
    pub fn image_message(&self, kind: ImageKind) -> &'static str {
        match self {
            Self::SafetyBlock => kind.safety_message(),
            other => other.user_message(),
        }
    }

    pub fn outcome(&self) -> ChatOutcome {
        match self {
            Self::SafetyBlock => ChatOutcome::SafetyBlocked,
            Self::QuotaExceeded => ChatOutcome::QuotaExceeded,
            Self::Generic => ChatOutcome::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_variants() {
        assert_eq!(
            FailureKind::classify(&Error::SafetyBlocked("prompt blocked: OTHER".into())),
            FailureKind::SafetyBlock
        );
        assert_eq!(
            FailureKind::classify(&Error::QuotaExceeded("429".into())),
            FailureKind::QuotaExceeded
        );
    }

    #[test]
    fn test_message_keywords() {
        assert_eq!(FailureKind::classify_message("Safety filter"), FailureKind::SafetyBlock);
        assert_eq!(FailureKind::classify_message("quota exceeded"), FailureKind::QuotaExceeded);
        assert_eq!(FailureKind::classify_message("HTTP 429"), FailureKind::QuotaExceeded);
        assert_eq!(FailureKind::classify_message("connection reset"), FailureKind::Generic);
        // Safety keywords take precedence
        assert_eq!(FailureKind::classify_message("quota block"), FailureKind::SafetyBlock);
    }

    #[test]
    fn test_untyped_errors_use_text() {
        assert_eq!(
            FailureKind::classify(&Error::llm("Response blocked upstream")),
            FailureKind::SafetyBlock
        );
        assert_eq!(FailureKind::classify(&Error::llm("timeout")), FailureKind::Generic);
    }

    #[test]
    fn test_messages() {
        assert!(FailureKind::SafetyBlock.user_message().starts_with("⚠️ Mi sistema de seguridad"));
        assert!(FailureKind::QuotaExceeded.user_message().starts_with("⏱️"));
        assert_eq!(FailureKind::Generic.user_message(), "❌ Error técnico. Intenta de nuevo. 💜");
        assert_eq!(
            FailureKind::SafetyBlock.image_message(ImageKind::Cycle),
            "⚠️ No pude analizar por seguridad. Intenta con otra imagen. 💜"
        );
        assert_eq!(
            FailureKind::Generic.image_message(ImageKind::Lab),
            FailureKind::Generic.user_message()
        );
    }
}
