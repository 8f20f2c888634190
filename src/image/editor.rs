//! Image editor trait and utilities.

use crate::error::{GenEditError, GenerationFailure, Result};
use crate::image::types::{EditRequest, GenerationResult};
use async_trait::async_trait;
use std::time::Duration;

/// Trait for image editing backends.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Runs one edit request. Resolves to exactly one result or one failure.
    async fn edit(
        &self,
        request: &EditRequest,
    ) -> std::result::Result<GenerationResult, GenerationFailure>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;

    /// Checks if the backend is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

/// Extension trait for caller-imposed deadlines.
///
/// Editors never time out on their own and never retry.
#[async_trait]
pub trait ImageEditorExt: ImageEditor {
    /// Runs [`ImageEditor::edit`], failing with a timeout if it takes longer
    /// than `timeout`.
    async fn edit_with_timeout(
        &self,
        request: &EditRequest,
        timeout: Duration,
    ) -> std::result::Result<GenerationResult, GenerationFailure> {
        match tokio::time::timeout(timeout, self.edit(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    editor = self.name(),
                    "edit request timed out"
                );
                Err(GenEditError::Timeout(timeout).into())
            }
        }
    }
}

impl<T: ImageEditor + ?Sized> ImageEditorExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::image::types::{ImageFormat, ImageInput, InlineImage};

    struct SlowEditor {
        delay: Duration,
    }

    #[async_trait]
    impl ImageEditor for SlowEditor {
        async fn edit(
            &self,
            _request: &EditRequest,
        ) -> std::result::Result<GenerationResult, GenerationFailure> {
            tokio::time::sleep(self.delay).await;
            Ok(GenerationResult {
                image: InlineImage {
                    mime_type: "image/png".into(),
                    data: "AAAA".into(),
                },
                text: None,
                metadata: Default::default(),
            })
        }

        fn name(&self) -> &str {
            "slow"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn request() -> EditRequest {
        let base = ImageInput::with_format(vec![1, 2, 3], ImageFormat::Png);
        EditRequest::new(base, None, "")
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_with_timeout_expires() {
        let editor = SlowEditor {
            delay: Duration::from_secs(120),
        };
        let failure = editor
            .edit_with_timeout(&request(), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.message.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_with_timeout_passes_through() {
        let editor = SlowEditor {
            delay: Duration::from_millis(10),
        };
        let result = editor
            .edit_with_timeout(&request(), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(result.image_url(), "data:image/png;base64,AAAA");
    }
}
