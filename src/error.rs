//! Error types for image editing.
//!
//! [`GenEditError`] is the internal, diagnostic error. Everything a caller sees
//! is a [`GenerationFailure`]: one stable message plus a [`FailureKind`] tag.

use std::fmt;
use std::time::Duration;

/// Maximum length of a provider error body kept for diagnostics.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

pub(crate) const MISSING_API_KEY_MESSAGE: &str =
    "API key is not configured. Set GEMINI_API_KEY or pass a key explicitly.";
pub(crate) const INVALID_IMAGE_MESSAGE: &str =
    "Could not read the selected image. Please choose a valid PNG, JPEG, or WEBP file and try again.";
pub(crate) const EMPTY_RESPONSE_MESSAGE: &str =
    "The request was blocked or returned an empty response. Try a different prompt or image.";
pub(crate) const SAFETY_REJECTION_MESSAGE: &str =
    "Generation was stopped by the safety filter. Try a different prompt or image.";
pub(crate) const RECITATION_REJECTION_MESSAGE: &str =
    "Generation was stopped because the result closely resembled existing content. Try a more original prompt.";
pub(crate) const NO_IMAGE_MESSAGE: &str =
    "The model did not return an image. Try a different prompt.";
pub(crate) const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred while generating the image. Check your connection and try again.";

/// Why a produced candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Safety filters (harm categories, prohibited content, blocklists).
    Safety,
    /// Output too close to existing content.
    Recitation,
}

/// Errors that can occur while running an edit request.
#[derive(Debug, thiserror::Error)]
pub enum GenEditError {
    /// No API key was supplied.
    #[error("API key not configured")]
    MissingApiKey,

    /// Input image bytes are empty or unreadable.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Input image MIME type outside the PNG/JPEG/WEBP allow-list.
    #[error("unsupported image type: {0}")]
    UnsupportedMimeType(String),

    /// I/O error while reading an input image.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was rejected before any candidate was produced.
    #[error("prompt blocked: {}", .reason.as_deref().unwrap_or("unknown reason"))]
    PromptBlocked {
        /// Upstream block reason, when reported.
        reason: Option<String>,
    },

    /// A candidate was produced but stopped by a safety or recitation filter.
    #[error("content rejected ({reason})")]
    ContentRejected {
        /// Which filter family stopped generation.
        kind: RejectionKind,
        /// Raw finish reason reported by the provider.
        reason: String,
        /// Explanation supplied alongside the candidate, if any.
        explanation: Option<String>,
    },

    /// A normal candidate came back without image data.
    #[error("no image in response")]
    NoImage {
        /// Combined text the model returned instead.
        commentary: Option<String>,
    },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Caller-imposed deadline elapsed.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl GenEditError {
    /// Maps this error onto the user-facing failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingApiKey => FailureKind::Configuration,
            Self::InvalidImage(_) | Self::UnsupportedMimeType(_) | Self::Io(_) => {
                FailureKind::Input
            }
            Self::PromptBlocked { .. } => FailureKind::Blocked,
            Self::ContentRejected { .. } => FailureKind::Rejected,
            Self::NoImage { .. } => FailureKind::EmptyResult,
            Self::Api { .. }
            | Self::Network(_)
            | Self::Json(_)
            | Self::Decode(_) => FailureKind::Transport,
            Self::Timeout(_) => FailureKind::Timeout,
        }
    }

    /// Returns the message shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => MISSING_API_KEY_MESSAGE.to_string(),
            Self::InvalidImage(_) | Self::UnsupportedMimeType(_) | Self::Io(_) => {
                INVALID_IMAGE_MESSAGE.to_string()
            }
            Self::PromptBlocked {
                reason: Some(reason),
            } => format!(
                "The request was blocked ({reason}). Please adjust your prompt or images."
            ),
            Self::PromptBlocked { reason: None } => EMPTY_RESPONSE_MESSAGE.to_string(),
            Self::ContentRejected {
                explanation: Some(text),
                ..
            } => text.clone(),
            Self::ContentRejected {
                kind: RejectionKind::Recitation,
                ..
            } => RECITATION_REJECTION_MESSAGE.to_string(),
            Self::ContentRejected {
                kind: RejectionKind::Safety,
                ..
            } => SAFETY_REJECTION_MESSAGE.to_string(),
            Self::NoImage {
                commentary: Some(text),
            } => text.clone(),
            Self::NoImage { commentary: None } => NO_IMAGE_MESSAGE.to_string(),
            Self::Timeout(after) => {
                format!("The request timed out after {after:?}. Please try again.")
            }
            Self::Api { .. }
            | Self::Network(_)
            | Self::Json(_)
            | Self::Decode(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Failure category presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credential missing; no network call was attempted.
    Configuration,
    /// An input image could not be read.
    Input,
    /// Request rejected before generation.
    Blocked,
    /// Candidate rejected by a safety or recitation filter.
    Rejected,
    /// Normal completion without an image.
    EmptyResult,
    /// Network, HTTP, or malformed-response failure.
    Transport,
    /// A caller-imposed deadline elapsed.
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Input => "input",
            Self::Blocked => "blocked",
            Self::Rejected => "rejected",
            Self::EmptyResult => "empty_result",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// The single failure value an edit request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// User-presentable message.
    pub message: String,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GenerationFailure {}

impl From<GenEditError> for GenerationFailure {
    fn from(err: GenEditError) -> Self {
        let kind = err.kind();
        match kind {
            FailureKind::Transport | FailureKind::Input => {
                tracing::warn!(%kind, error = %err, "image edit failed");
            }
            _ => tracing::debug!(%kind, error = %err, "image edit failed"),
        }
        Self {
            kind,
            message: err.user_message(),
        }
    }
}

/// Collapses whitespace and caps the length of a provider error body.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, GenEditError>;
