//! CLI for GenEdit - image editing with Gemini.

use clap::{Args, Parser, Subcommand, ValueEnum};
use genedit::{
    EditRequest, EditorConfig, GeminiEditor, GeminiModel, GenerationFailure, ImageEditor,
    ImageEditorExt, ImageInput,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genedit")]
#[command(about = "Edit an image with Gemini, optionally guided by a style reference")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image
    Edit(EditArgs),

    /// Check that the API key and model are usable
    Check(CheckArgs),
}

#[derive(Args)]
struct EditArgs {
    /// The image to edit
    base: PathBuf,

    /// Style reference image
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Edit instruction (defaults to a generic enhance/style-transfer instruction)
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Model to use
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct CheckArgs {
    /// Model to check
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    #[value(name = "flash-image-preview")]
    FlashImagePreview,
    #[value(name = "flash-image")]
    FlashImage,
    #[value(name = "pro-image-preview")]
    ProImagePreview,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::FlashImagePreview => GeminiModel::FlashImagePreview,
            ModelArg::FlashImage => GeminiModel::FlashImage,
            ModelArg::ProImagePreview => GeminiModel::ProImagePreview,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EditorConfig::from_env();

    match cli.command {
        Commands::Edit(args) => edit_image(args, config, cli.json).await,
        Commands::Check(args) => check(args, config, cli.json).await,
    }
}

async fn edit_image(
    args: EditArgs,
    mut config: EditorConfig,
    json_output: bool,
) -> anyhow::Result<ExitCode> {
    if let Some(model) = args.model {
        config = config.with_model(model.into());
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let editor = GeminiEditor::from_config(&config)?;

    let base = match ImageInput::from_path(&args.base).await {
        Ok(image) => image,
        Err(e) => return Ok(report_failure(e.into(), json_output)),
    };
    let reference = match args.reference {
        Some(ref path) => match ImageInput::from_path(path).await {
            Ok(image) => Some(image),
            Err(e) => return Ok(report_failure(e.into(), json_output)),
        },
        None => None,
    };

    let request = EditRequest::new(base, reference, &args.prompt);
    let outcome = match config.timeout {
        Some(timeout) => editor.edit_with_timeout(&request, timeout).await,
        None => editor.edit(&request).await,
    };

    let result = match outcome {
        Ok(result) => result,
        Err(failure) => return Ok(report_failure(failure, json_output)),
    };

    result.save(&args.output)?;

    if json_output {
        let output = serde_json::json!({
            "success": true,
            "output": args.output.display().to_string(),
            "mime_type": result.image.mime_type,
            "text": result.text,
            "model": result.metadata.model,
            "duration_ms": result.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Edited image: {}", args.output.display());
        if let Some(ref text) = result.text {
            println!("{text}");
        }
        if let Some(duration) = result.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn check(
    args: CheckArgs,
    mut config: EditorConfig,
    json_output: bool,
) -> anyhow::Result<ExitCode> {
    if let Some(model) = args.model {
        config = config.with_model(model.into());
    }
    let editor = GeminiEditor::from_config(&config)?;

    match editor.health_check().await {
        Ok(()) => {
            if json_output {
                let output = serde_json::json!({
                    "success": true,
                    "editor": editor.name(),
                    "model": editor.model().as_str(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} OK ({})", editor.name(), editor.model());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ genedit::GenEditError::MissingApiKey) => Ok(report_failure(e.into(), json_output)),
        Err(e) => {
            // Health checks are diagnostic, so show the underlying error.
            if json_output {
                let output = serde_json::json!({
                    "success": false,
                    "kind": e.kind().to_string(),
                    "error": e.to_string(),
                });
                println!("{output}");
            } else {
                eprintln!("{} check failed: {e}", editor.name());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure(failure: GenerationFailure, json_output: bool) -> ExitCode {
    if json_output {
        let output = serde_json::json!({
            "success": false,
            "kind": failure.kind.to_string(),
            "error": failure.message,
        });
        println!("{output}");
    } else {
        eprintln!("{}", failure.message);
    }
    ExitCode::FAILURE
}
