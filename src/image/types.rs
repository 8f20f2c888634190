//! Core types for image editing.

use crate::error::{GenEditError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Instruction sent when the prompt is empty and a reference image is present.
pub const STYLE_TRANSFER_INSTRUCTION: &str =
    "Use the style of the second image to modify the first.";

/// Instruction sent when the prompt is empty and there is no reference image.
pub const ENHANCE_INSTRUCTION: &str = "Slightly enhance this image, improve lighting and colors.";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses one of the allowed MIME types.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Checks if the given data matches this format's magic bytes.
    pub fn matches_bytes(&self, data: &[u8]) -> bool {
        Self::from_magic_bytes(data) == Some(*self)
    }
}

/// An uploaded image: raw bytes, an allowed format, and the name it came from.
///
/// Immutable once constructed. The file name is informational only and is
/// never validated or sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    data: Vec<u8>,
    format: ImageFormat,
    file_name: Option<String>,
}

impl ImageInput {
    /// Creates an input from bytes and a declared MIME type.
    ///
    /// Fails with [`GenEditError::UnsupportedMimeType`] for anything other
    /// than PNG, JPEG, or WEBP.
    pub fn new(
        data: impl Into<Vec<u8>>,
        mime_type: &str,
        file_name: Option<String>,
    ) -> Result<Self> {
        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| GenEditError::UnsupportedMimeType(mime_type.to_string()))?;
        Ok(Self {
            data: data.into(),
            format,
            file_name,
        })
    }

    /// Creates an input from a known format.
    pub fn with_format(data: impl Into<Vec<u8>>, format: ImageFormat) -> Self {
        Self {
            data: data.into(),
            format,
            file_name: None,
        }
    }

    /// Reads an image file, taking the format from its magic bytes and falling
    /// back to the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;

        let format = ImageFormat::from_magic_bytes(&data)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                GenEditError::UnsupportedMimeType(format!(
                    "cannot determine image type of {}",
                    path.display()
                ))
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self {
            data,
            format,
            file_name,
        })
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Origin file name, if known.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Encodes the image into its transport form: base64 text tagged with its
    /// MIME type. Encoding the same bytes always yields the same payload.
    ///
    /// Fails with [`GenEditError::InvalidImage`] when the bytes are empty or
    /// do not match the declared format.
    pub fn encode(&self) -> Result<InlineImage> {
        let name = self.file_name.as_deref().unwrap_or("image");
        if self.data.is_empty() {
            return Err(GenEditError::InvalidImage(format!("{name} is empty")));
        }
        if !self.format.matches_bytes(&self.data) {
            return Err(GenEditError::InvalidImage(format!(
                "{name} is not a valid {} image",
                self.format.mime_type()
            )));
        }
        Ok(InlineImage {
            mime_type: self.format.mime_type().to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&self.data),
        })
    }

    /// Runs [`ImageInput::encode`] on the blocking pool.
    pub(crate) async fn encode_blocking(self) -> Result<InlineImage> {
        tokio::task::spawn_blocking(move || self.encode())
            .await
            .map_err(|e| GenEditError::InvalidImage(format!("encoding task failed: {e}")))?
    }
}

/// A request to edit an image.
///
/// `instruction` is always non-empty: [`EditRequest::new`] substitutes a
/// fixed default when the prompt is blank.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Image to edit.
    pub base: ImageInput,
    /// Optional style reference.
    pub reference: Option<ImageInput>,
    /// Instruction sent to the model.
    pub instruction: String,
}

impl EditRequest {
    /// Builds a request, defaulting an empty prompt.
    pub fn new(base: ImageInput, reference: Option<ImageInput>, prompt: &str) -> Self {
        let instruction = default_instruction(prompt, reference.is_some());
        Self {
            base,
            reference,
            instruction,
        }
    }

    /// Returns true when a style reference image is attached.
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Trims `prompt`, substituting a fixed instruction when nothing remains.
pub fn default_instruction(prompt: &str, has_reference: bool) -> String {
    let trimmed = prompt.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    if has_reference {
        STYLE_TRANSFER_INSTRUCTION.to_string()
    } else {
        ENHANCE_INSTRUCTION.to_string()
    }
}

/// Base64 image data tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

impl InlineImage {
    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| GenEditError::Decode(e.to_string()))
    }

}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Finish reason reported for the candidate.
    pub finish_reason: Option<String>,
}

/// A successful edit: the image plus optional model commentary.
#[derive(Debug, Clone)]
#[must_use = "generated image should be displayed or saved"]
pub struct GenerationResult {
    /// The returned image.
    pub image: InlineImage,
    /// Space-joined commentary from text parts, absent when there was none.
    pub text: Option<String>,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GenerationResult {
    /// Returns the image as a data URI, ready for use as an image source.
    pub fn image_url(&self) -> String {
        self.image.to_data_url()
    }

    /// Decodes the image and writes it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.image.decode()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
