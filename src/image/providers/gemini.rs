//! Gemini (Google) image editing provider.
//!
//! One edit is one `generateContent` call: the base image, the optional
//! style reference, and the instruction go out as ordered parts, and the
//! response is classified into exactly one [`GenerationResult`] or one
//! [`GenerationFailure`].

use crate::config::EditorConfig;
use crate::error::{
    sanitize_error_message, GenEditError, GenerationFailure, RejectionKind, Result,
};
use crate::image::editor::ImageEditor;
use crate::image::types::{
    EditRequest, GenerationMetadata, GenerationResult, ImageFormat, ImageInput, InlineImage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

const RECITATION_FINISH_REASONS: &[&str] = &["RECITATION", "IMAGE_RECITATION"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image preview.
    #[default]
    FlashImagePreview,
    /// Gemini 2.5 Flash Image (GA).
    FlashImage,
    /// Gemini 3 Pro Image preview (highest quality).
    ProImagePreview,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImagePreview => "gemini-2.5-flash-image-preview",
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImagePreview => "gemini-3-pro-image-preview",
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flash-image-preview" | "gemini-2.5-flash-image-preview" => {
                Ok(Self::FlashImagePreview)
            }
            "flash-image" | "gemini-2.5-flash-image" => Ok(Self::FlashImage),
            "pro-image-preview" | "gemini-3-pro-image-preview" => Ok(Self::ProImagePreview),
            other => Err(format!("unknown Gemini image model: {other}")),
        }
    }
}

/// Builder for GeminiEditor.
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    ///
    /// The key is never read from the environment here; see
    /// [`EditorConfig::from_env`] for that. Without a key the editor still
    /// builds, and every edit fails with a configuration error.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the editor.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self.api_key.filter(|k| !k.trim().is_empty());
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiEditor {
            client: reqwest::Client::builder().build()?,
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gemini image editor.
///
/// Holds no per-request state; concurrent edits are independent.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Builds an editor from resolved configuration.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .model(config.model)
            .base_url(config.base_url.clone());
        if let Some(ref key) = config.api_key {
            builder = builder.api_key(key.clone());
        }
        builder.build()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    /// Edits `base`, optionally guided by `reference`, following `prompt`.
    ///
    /// An empty prompt is replaced by a fixed instruction.
    pub async fn generate(
        &self,
        base: ImageInput,
        reference: Option<ImageInput>,
        prompt: &str,
    ) -> std::result::Result<GenerationResult, GenerationFailure> {
        let request = EditRequest::new(base, reference, prompt);
        self.edit(&request).await
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model.as_str())
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<GenerationResult> {
        let api_key = self.api_key.as_deref().ok_or(GenEditError::MissingApiKey)?;
        let start = Instant::now();

        let body = GeminiRequest::from_edit_request(request).await?;
        let url = format!("{}:generateContent", self.model_url());

        tracing::debug!(
            model = self.model.as_str(),
            has_reference = request.has_reference(),
            "submitting Gemini edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenEditError::Api {
                status: status.as_u16(),
                message: sanitize_error_message(&text),
            });
        }

        let bytes = response.bytes().await?;
        let gemini_response: GeminiResponse = serde_json::from_slice(&bytes)?;
        let classified = classify_response(gemini_response)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            duration_ms,
            mime_type = %classified.image.mime_type,
            has_text = classified.text.is_some(),
            "Gemini edit complete"
        );

        Ok(GenerationResult {
            image: classified.image,
            text: classified.text,
            metadata: GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
                finish_reason: classified.finish_reason,
            },
        })
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(
        &self,
        request: &EditRequest,
    ) -> std::result::Result<GenerationResult, GenerationFailure> {
        self.edit_impl(request).await.map_err(GenerationFailure::from)
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self.api_key.as_deref().ok_or(GenEditError::MissingApiKey)?;

        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            s @ (401 | 403) => Err(GenEditError::Api {
                status: s,
                message: "Invalid API key".into(),
            }),
            404 => Err(GenEditError::Api {
                status: 404,
                message: "Model not found. Verify the model name is correct.".into(),
            }),
            s if !(200..300).contains(&s) => Err(GenEditError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Outcome of a successful classification.
#[derive(Debug)]
struct ClassifiedResponse {
    image: InlineImage,
    text: Option<String>,
    finish_reason: Option<String>,
}

/// Classifies a `generateContent` response.
///
/// Checks run in a fixed order, each a terminal branch: no candidate (block
/// reason or empty), safety/recitation finish reason, then image extraction.
/// All text parts are space-joined into one commentary string. When several
/// image parts are present the last one wins.
fn classify_response(response: GeminiResponse) -> Result<ClassifiedResponse> {
    let Some(candidate) = response.candidates.unwrap_or_default().into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .filter(|reason| !reason.is_empty());
        return Err(GenEditError::PromptBlocked { reason });
    };

    let parts = candidate
        .content
        .and_then(|c| c.parts)
        .unwrap_or_default();
    let commentary = combine_text(&parts);

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if let Some(kind) = rejection_kind(reason) {
            let explanation = commentary.or_else(|| {
                candidate
                    .finish_message
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
            });
            return Err(GenEditError::ContentRejected {
                kind,
                reason: reason.to_string(),
                explanation,
            });
        }
    }

    let image = parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .filter_map(InlineData::into_inline_image)
        .last();

    let Some(image) = image else {
        return Err(GenEditError::NoImage { commentary });
    };

    Ok(ClassifiedResponse {
        image,
        text: commentary,
        finish_reason: candidate.finish_reason,
    })
}

fn rejection_kind(finish_reason: &str) -> Option<RejectionKind> {
    if RECITATION_FINISH_REASONS.contains(&finish_reason) {
        Some(RejectionKind::Recitation)
    } else if SAFETY_FINISH_REASONS.contains(&finish_reason) {
        Some(RejectionKind::Safety)
    } else {
        None
    }
}

/// Space-joins every non-empty text part, skipping model thoughts.
fn combine_text(parts: &[GeminiPartResponse]) -> Option<String> {
    let joined = parts
        .iter()
        .filter(|part| !part.thought.unwrap_or_default())
        .filter_map(|part| part.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Request/Response types. Response fields are all optional: the API may send
// explicit nulls, which `#[serde(default)]` alone does not accept.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    /// Assembles `[base, reference?, instruction]`. The model reads the first
    /// image as the one to edit and the second as the style reference.
    ///
    /// Both images are encoded concurrently; order is fixed here, not by
    /// which encoding finishes first.
    async fn from_edit_request(req: &EditRequest) -> Result<Self> {
        let reference = req.reference.clone();
        let (base, reference) = tokio::try_join!(req.base.clone().encode_blocking(), async {
            match reference {
                Some(image) => image.encode_blocking().await.map(Some),
                None => Ok(None),
            }
        })?;

        let mut parts = vec![GeminiRequestPart::InlineData { inline_data: base }];
        if let Some(reference) = reference {
            parts.push(GeminiRequestPart::InlineData {
                inline_data: reference,
            });
        }

        parts.push(GeminiRequestPart::Text {
            text: req.instruction.clone(),
        });

        Ok(Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    finish_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

impl InlineData {
    /// Returns `None` when there is no payload; a missing MIME type means PNG.
    fn into_inline_image(self) -> Option<InlineImage> {
        let data = self.data.filter(|d| !d.is_empty())?;
        let mime_type = self
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| ImageFormat::Png.mime_type().to_string());
        Some(InlineImage { mime_type, data })
    }
}
