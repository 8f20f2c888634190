#![warn(missing_docs)]
//! GenEdit - edit images with Gemini.
//!
//! Send a base image, an optional style reference, and a text instruction;
//! get back the edited image as a data URI plus any commentary the model
//! wrote. Every request resolves to exactly one [`GenerationResult`] or one
//! [`GenerationFailure`].
//!
//! # Quick Start
//!
//! ```no_run
//! use genedit::{GeminiEditor, ImageInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let editor = GeminiEditor::builder().api_key("my-key").build()?;
//!     let base = ImageInput::from_path("photo.png").await?;
//!     let result = editor.generate(base, None, "make the sky a vibrant sunset").await?;
//!     println!("{}", result.text.as_deref().unwrap_or(""));
//!     result.save("edited.png")?;
//!     Ok(())
//! }
//! ```
//!
//! An empty prompt is allowed: the editor substitutes an "enhance" instruction,
//! or a "style transfer" instruction when a reference image is attached.
//!
//! # Features
//!
//! - `cli`: the `genedit` command-line tool

pub mod config;
mod error;
pub mod image;

pub use config::EditorConfig;
pub use error::{FailureKind, GenEditError, GenerationFailure, RejectionKind, Result};
pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use image::{
    EditRequest, GenerationMetadata, GenerationResult, ImageEditor, ImageEditorExt, ImageFormat,
    ImageInput, InlineImage,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::error::{FailureKind, GenEditError, GenerationFailure, Result};
    pub use crate::image::providers::GeminiEditor;
    pub use crate::image::{
        EditRequest, GenerationResult, ImageEditor, ImageEditorExt, ImageInput,
    };
}
