mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use docparse_core::config::{
    ExtractorConfig, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_MODEL, DEFAULT_VISION_MODEL,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "docparse=info,tower_http=info";

#[derive(Parser)]
#[command(
    name = "docparse",
    version,
    about = "Extract structured fields from PDF documents with a language model"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a PDF (or plain .txt) document
    Parse(commands::parse::ParseArgs),
    /// Run the HTTP API
    Serve {
        /// Interface to bind
        #[arg(long, env = "DOCPARSE_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "DOCPARSE_PORT", default_value_t = 8000)]
        port: u16,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Inspect and check field lists
    Fields {
        #[command(subcommand)]
        action: FieldsAction,
    },
}

#[derive(Subcommand)]
enum FieldsAction {
    /// List predefined field lists
    List,
    /// Show the fields of a preset
    Show {
        /// Preset name (e.g., "invoice")
        preset: String,
    },
    /// Validate a custom field file
    Validate {
        /// Path to JSON field file
        file: PathBuf,
    },
}

/// Model and limit settings shared by `parse` and `serve`.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Model used for text documents
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Vision model used for scanned documents
    #[arg(long, env = "OPENAI_VISION_MODEL", default_value = DEFAULT_VISION_MODEL)]
    vision_model: String,

    /// Maximum document size in megabytes
    #[arg(long, env = "DOCPARSE_MAX_FILE_SIZE_MB", default_value_t = DEFAULT_MAX_FILE_SIZE_MB)]
    max_file_size_mb: usize,

    /// Do not fall back to page images when a PDF has no text layer
    #[arg(long)]
    no_vision: bool,
}

impl ModelArgs {
    pub fn to_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            model: self.model.clone(),
            vision_model: self.vision_model.clone(),
            vision_fallback: !self.no_vision,
            ..ExtractorConfig::default()
        }
        .with_max_file_size_mb(self.max_file_size_mb)
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Parse(args) => commands::parse::run(args).await,
        Commands::Serve { host, port, model } => {
            commands::serve::run(&host, port, model.to_config()).await
        }
        Commands::Fields { action } => match action {
            FieldsAction::List => commands::fields::list(),
            FieldsAction::Show { preset } => commands::fields::show(&preset),
            FieldsAction::Validate { file } => commands::fields::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
