//! Prompt assembly for grounded answers and image analysis

use chrono::NaiveDate;
use std::fmt::Write;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::types::{recent_turns, ImageKind, RetrievedContext, Turn};

use super::templates::{
    ANSWER_MARKER, CONTEXT_PLACEHOLDER, CONTEXT_SEPARATOR, DATE_PLACEHOLDER, HISTORY_HEADER,
    PERSONA_TEMPLATE, QUERY_HEADER,
};

/// Default number of previous turns rendered into the prompt
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// Prompt builder for grounded answers
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
    history_window: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            persona: PERSONA_TEMPLATE.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl PromptBuilder {
    /// Builder with a custom persona template
    pub fn with_persona(persona: impl Into<String>, history_window: usize) -> Result<Self> {
        let persona = persona.into();
        for placeholder in [CONTEXT_PLACEHOLDER, DATE_PLACEHOLDER] {
            if !persona.contains(placeholder) {
                return Err(Error::Config(format!(
                    "Persona template must contain the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self {
            persona,
            history_window,
        })
    }

    /// Built-in persona, or the file named in `generation.persona_path`
    pub fn from_config(config: &GenerationConfig, history_window: usize) -> Result<Self> {
        match &config.persona_path {
            Some(path) => {
                let persona = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Cannot read persona template {}: {}", path.display(), e))
                })?;
                tracing::info!("Using persona template from {}", path.display());
                Self::with_persona(persona, history_window)
            }
            None => Ok(Self {
                history_window,
                ..Self::default()
            }),
        }
    }

    /// Render retrieved chunks as `[label]\ntext` items, best first
    pub fn build_context(context: &RetrievedContext) -> String {
        context
            .items
            .iter()
            .map(|item| format!("[{}]\n{}", item.label(), item.text()))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Full answer prompt: persona with context and date, recent history, query, answer marker
    pub fn build_answer_prompt(
        &self,
        context: &RetrievedContext,
        history: &[Turn],
        query: &str,
        today: NaiveDate,
    ) -> String {
        // Date first so chunk text is never scanned for placeholders
        let mut prompt = self
            .persona
            .replace(DATE_PLACEHOLDER, &today.format("%Y-%m-%d").to_string())
            .replace(CONTEXT_PLACEHOLDER, &Self::build_context(context));

        let recent = recent_turns(history, self.history_window);
        if !recent.is_empty() {
            prompt.push_str(HISTORY_HEADER);
            for turn in recent {
                let _ = write!(prompt, "\n{}: {}\n", turn.role.prompt_name(), turn.content);
            }
        }

        prompt.push_str(QUERY_HEADER);
        prompt.push_str(query);
        prompt.push_str(ANSWER_MARKER);
        prompt
    }

    /// Analysis instructions for an image kind
    pub fn build_image_prompt(kind: ImageKind) -> &'static str {
        kind.template()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource, RetrievedChunk};
    use uuid::Uuid;

    fn context(texts: &[(&str, &str)]) -> RetrievedContext {
        RetrievedContext::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, (label, text))| RetrievedChunk {
                    chunk: Chunk::new(
                        Uuid::nil(),
                        text.to_string(),
                        ChunkSource {
                            label: label.to_string(),
                            filename: "guia_sop.pdf".into(),
                            page_number: Some(1),
                        },
                        0,
                        text.chars().count(),
                        i as u32,
                    ),
                    score: 1.0 - i as f32 * 0.1,
                })
                .collect(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    #[test]
    fn test_context_format() {
        let ctx = context(&[("Guía ESHRE 2023", "Criterios de Rotterdam"), ("", "Metformina")]);
        assert_eq!(
            PromptBuilder::build_context(&ctx),
            "[Guía ESHRE 2023]\nCriterios de Rotterdam\n\n---\n\n[Guía médica]\nMetformina"
        );
    }

    #[test]
    fn test_prompt_section_order() {
        let ctx = context(&[("Guía ESHRE 2023", "El SOP se diagnostica con 2 de 3 criterios.")]);
        let history = vec![Turn::user("Hola"), Turn::assistant("¡Hola! 💜")];
        let prompt = PromptBuilder::default().build_answer_prompt(&ctx, &history, "¿Qué es el SOP?", today());

        let persona = prompt.find("Eres Sofía").unwrap();
        let rules = prompt.find("LO QUE NUNCA HACES").unwrap();
        let chunk = prompt.find("El SOP se diagnostica con 2 de 3 criterios.").unwrap();
        let date = prompt.find("Fecha actual: 2024-03-08").unwrap();
        let history_at = prompt.find("**CONVERSACIÓN PREVIA:**").unwrap();
        let query = prompt.find("**PREGUNTA ACTUAL:**\n¿Qué es el SOP?").unwrap();
        let marker = prompt.find("**TU RESPUESTA:**").unwrap();

        assert!(persona < rules && rules < chunk && chunk < date);
        assert!(date < history_at && history_at < query && query < marker);
        assert!(prompt.ends_with("**TU RESPUESTA:**"));
        assert!(prompt.contains("\nUsuario: Hola\n"));
        assert!(prompt.contains("\nAsistente: ¡Hola! 💜\n"));
    }

    #[test]
    fn test_history_window_and_omission() {
        let ctx = context(&[("", "texto")]);
        let history: Vec<Turn> = (0..8).map(|i| Turn::user(format!("mensaje {}", i))).collect();
        let prompt = PromptBuilder::default().build_answer_prompt(&ctx, &history, "q", today());
        assert!(!prompt.contains("mensaje 1\n"));
        assert!(prompt.contains("mensaje 2\n"));
        assert!(prompt.contains("mensaje 7\n"));

        let without = PromptBuilder::default().build_answer_prompt(&ctx, &[], "q", today());
        assert!(!without.contains("CONVERSACIÓN PREVIA"));
    }

    #[test]
    fn test_chunk_text_is_not_altered() {
        let raw = "Texto con {date} y {context} literales";
        let ctx = context(&[("", raw)]);
        let prompt = PromptBuilder::default().build_answer_prompt(&ctx, &[], "q", today());
        assert!(prompt.contains(raw));
    }

    #[test]
    fn test_custom_persona_requires_placeholders() {
        assert!(PromptBuilder::with_persona("Sin marcadores", 6).is_err());
        let builder = PromptBuilder::with_persona("P {context} / {date}", 6).unwrap();
        let prompt = builder.build_answer_prompt(&context(&[("L", "T")]), &[], "q", today());
        assert!(prompt.starts_with("P [L]\nT / 2024-03-08"));
    }
}
