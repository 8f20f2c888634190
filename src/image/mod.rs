//! Image editing module.

mod editor;
pub mod providers;
mod types;

pub use editor::{ImageEditor, ImageEditorExt};
pub use types::{
    default_instruction, EditRequest, GenerationMetadata, GenerationResult, ImageFormat,
    ImageInput, InlineImage, ENHANCE_INSTRUCTION, STYLE_TRANSFER_INSTRUCTION,
};
