//! Image editing example - restyles an image with an optional reference.
//!
//! Run with: `cargo run --example edit_image -- <base.png> [reference.png]`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use genedit::{EditorConfig, GeminiEditor, ImageInput};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let base_path = args
        .next()
        .expect("Usage: edit_image <base.png> [reference.png]");

    let base = ImageInput::from_path(&base_path).await?;
    let reference = match args.next() {
        Some(path) => Some(ImageInput::from_path(path).await?),
        None => None,
    };

    let editor = GeminiEditor::from_config(&EditorConfig::from_env())?;

    // Empty prompt: the editor picks the enhance or style-transfer default.
    let result = editor.generate(base, reference, "").await?;
    result.save("edited.png")?;

    println!("Edited image saved to edited.png");
    if let Some(text) = result.text {
        println!("{text}");
    }

    Ok(())
}
