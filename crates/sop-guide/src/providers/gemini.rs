//! Gemini clients for generation and embeddings via the Generative Language API
//!
//! Both clients authenticate with an API key sent in the `x-goog-api-key` header.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, GenerationConfig, LlmConfig, SafetySetting};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationRequest, GenerativeModel};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons that mean the answer was withheld on policy grounds
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Shared HTTP plumbing for the Generative Language API
#[derive(Clone)]
struct GeminiApi {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiApi {
    fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, url: &str, body: &B) -> Result<R> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_api_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse Gemini response: {}", e)))
    }

    async fn model_exists(&self, model: &str) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/models/{}", self.api_base, model))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(response.status().is_success())
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a non-success HTTP response to a typed error
fn map_api_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
    let api_status = detail.as_ref().map(|d| d.status.as_str()).unwrap_or("");
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| body.chars().take(500).collect());

    if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
        Error::QuotaExceeded(format!("{} {}", status, message))
    } else {
        Error::Llm(format!("Gemini call failed ({}): {}", status, message))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequestBody<'a> {
    contents: Vec<Content>,
    generation_config: GenerationParams,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Extract the answer text, turning refusals into `Error::SafetyBlocked`
fn parse_generate_response(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::SafetyBlocked(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Llm("No candidates in Gemini response".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(Error::SafetyBlocked(format!("answer blocked: {}", reason)));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Llm(format!(
            "No text in Gemini response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

/// Gemini generation client
pub struct GeminiClient {
    api: GeminiApi,
    model: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(llm: &LlmConfig, generation: &GenerationConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            api: GeminiApi::new(llm, api_key)?,
            model: llm.generate_model.clone(),
            generation: generation.clone(),
        })
    }

    fn request_body<'a>(&'a self, request: &GenerationRequest) -> GenerateRequestBody<'a> {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                },
            });
        }

        GenerateRequestBody {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationParams {
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                top_k: self.generation.top_k,
                max_output_tokens: self.generation.max_output_tokens,
            },
            safety_settings: &self.generation.safety,
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.api.url(&self.model, "generateContent");
        let body = self.request_body(request);

        tracing::debug!(
            "Calling {} (prompt {} chars, image: {})",
            self.model,
            request.prompt.chars().count(),
            request.image.is_some()
        );

        let response: GenerateResponse = self.api.post(&url, &body).await?;
        parse_generate_response(response)
    }

    async fn health_check(&self) -> Result<bool> {
        self.api.model_exists(&self.model).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbedContentRequest {
    model: String,
    content: EmbedContent,
}

#[derive(Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding provider
pub struct GeminiEmbedder {
    api: GeminiApi,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            api: GeminiApi::new(llm, api_key)?,
            model: embeddings.model.clone(),
            dimensions: embeddings.dimensions,
            batch_size: embeddings.batch_size.clamp(1, 100),
        })
    }

    fn embed_request(&self, text: &str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.api.url(&self.model, "embedContent");
        let response: EmbedContentResponse = self
            .api
            .post(&url, &self.embed_request(text))
            .await
            .map_err(into_embedding_error)?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.api.url(&self.model, "batchEmbedContents");
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = BatchEmbedRequest {
                requests: batch.iter().map(|t| self.embed_request(t)).collect(),
            };
            let response: BatchEmbedResponse = self
                .api
                .post(&url, &request)
                .await
                .map_err(into_embedding_error)?;

            if response.embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Batch returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    batch.len()
                )));
            }
            embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.api.model_exists(&self.model).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Quota errors keep their type, everything else is reported as an embedding failure
fn into_embedding_error(err: Error) -> Error {
    match err {
        Error::QuotaExceeded(_) => err,
        other => Error::Embedding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::InlineImage;
    use bytes::Bytes;

    fn parse(json: &str) -> Result<String> {
        parse_generate_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_text_response() {
        let text = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hola "},{"text":"💜"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(text, "Hola 💜");
    }

    #[test]
    fn test_prompt_block_is_safety() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, Error::SafetyBlocked(_)));
    }

    #[test]
    fn test_finish_reason_safety() {
        let err = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap_err();
        assert!(matches!(err, Error::SafetyBlocked(_)));

        let err = parse(r#"{"candidates":[{"finishReason":"PROHIBITED_CONTENT","content":{"parts":[]}}]}"#)
            .unwrap_err();
        assert!(matches!(err, Error::SafetyBlocked(_)));
    }

    #[test]
    fn test_empty_candidates_is_llm_error() {
        assert!(matches!(parse(r#"{"candidates":[]}"#), Err(Error::Llm(_))));
        assert!(matches!(
            parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS","content":{"parts":[]}}]}"#),
            Err(Error::Llm(_))
        ));
    }

    #[test]
    fn test_map_api_error() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            map_api_error(StatusCode::TOO_MANY_REQUESTS, body),
            Error::QuotaExceeded(_)
        ));
        assert!(matches!(
            map_api_error(StatusCode::FORBIDDEN, r#"{"error":{"code":403,"message":"quota project","status":"RESOURCE_EXHAUSTED"}}"#),
            Error::QuotaExceeded(_)
        ));
        assert!(matches!(
            map_api_error(StatusCode::BAD_REQUEST, "not json"),
            Error::Llm(_)
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(&LlmConfig::default(), &GenerationConfig::default(), "k".into()).unwrap();
        let request = GenerationRequest::with_image(
            "Analiza",
            InlineImage {
                mime_type: "image/png".into(),
                data: Bytes::from_static(b"\x89PNG"),
            },
        );
        let json = serde_json::to_value(client.request_body(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Analiza");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(json["safetySettings"][0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(json["safetySettings"][3]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_endpoint_urls() {
        let api = GeminiApi::new(&LlmConfig::default(), "k".into()).unwrap();
        assert_eq!(
            api.url("gemini-2.0-flash-exp", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }
}
