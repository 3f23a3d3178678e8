use super::{build_prompt, number_sections, parse_section_drafts, CommentaryGenerator, CommentaryInput};
use crate::error::{ReportError, Result};
use crate::schema::CommentSection;
use futures::future::BoxFuture;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3.1-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Commentary generator backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiCommentary {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    next_id: Arc<AtomicUsize>,
}

impl GeminiCommentary {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            next_id: Arc::new(AtomicUsize::new(100)),
        }
    }

    /// Reads the key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            ReportError::CommentaryError("GEMINI_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_text(&self, prompt: String) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: 2048,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ReportError::CommentaryError(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        Ok(body
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }

    async fn comment(&self, input: &CommentaryInput) -> Result<Vec<CommentSection>> {
        info!(
            "Requesting commentary for {} {} from {}",
            input.store_name, input.report_month, self.model
        );
        let text = self.generate_text(build_prompt(input)).await?;
        let drafts = parse_section_drafts(&text)?;
        debug!("Model returned {} sections", drafts.len());

        let first_id = self.next_id.fetch_add(drafts.len(), Ordering::Relaxed);
        Ok(number_sections(drafts, first_id))
    }
}

impl CommentaryGenerator for GeminiCommentary {
    fn generate<'a>(
        &'a self,
        input: &'a CommentaryInput,
    ) -> BoxFuture<'a, Result<Vec<CommentSection>>> {
        Box::pin(self.comment(input))
    }
}
