use clap::Args;
use docparse_core::error::DocParseError;
use docparse_core::fields::{self, builtin};
use docparse_core::model::{ConfigurableField, ExtractionRequest, ExtractionResult};
use docparse_core::{DocumentParser, ParseOptions};
use std::path::{Path, PathBuf};

use crate::output::{self, OutputFormat};
use crate::ModelArgs;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Path to a PDF or plain-text file
    input_file: PathBuf,

    /// Custom JSON field file
    #[arg(short, long = "fields", value_name = "FILE", conflicts_with = "preset")]
    fields: Option<PathBuf>,

    /// Predefined field list: default, invoice (default: default)
    #[arg(short, long = "preset", value_name = "NAME")]
    preset: Option<String>,

    /// Additional instructions for the model
    #[arg(short, long)]
    instructions: Option<String>,

    /// Only extract the requested fields
    #[arg(long)]
    no_discovery: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Write the result to a JSON file
    #[arg(short = 'O', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,
}

pub async fn run(args: ParseArgs) -> Result<(), DocParseError> {
    let fields = resolve_fields(args.fields.as_deref(), args.preset.as_deref())?;
    let parser = DocumentParser::from_env(args.model.to_config())?;

    let result = if is_text_file(&args.input_file) {
        let text = std::fs::read_to_string(&args.input_file)?;
        let request = ExtractionRequest::new(text, fields)
            .with_discovery(!args.no_discovery)
            .with_instructions(args.instructions);
        parser.extract(&request).await?
    } else {
        let pdf_bytes = std::fs::read(&args.input_file)?;
        let options = ParseOptions {
            fields,
            discovery_mode: !args.no_discovery,
            extraction_instructions: args.instructions,
        };
        parser.parse_pdf(&pdf_bytes, options).await?
    };

    emit(&result, args.output, args.out.as_deref())
}

fn emit(
    result: &ExtractionResult,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<(), DocParseError> {
    match out {
        Some(path) => {
            // Always write JSON when saving to file
            output::json::write(result, path)?;
            eprintln!(
                "Extracted {}/{} field(s) (confidence {:.2}), written to {}",
                result.populated_count(),
                result.values.len(),
                result.confidence_score,
                path.display()
            );
            for issue in &result.issues {
                eprintln!("  warning: {}: {}", issue.field, issue.detail);
            }
            Ok(())
        }
        None => match format {
            OutputFormat::Table => {
                print!("{}", output::table::format_result(result));
                Ok(())
            }
            OutputFormat::Json => output::json::print(result),
        },
    }
}

/// Fields from `--fields`, else `--preset`, else the default list.
fn resolve_fields(
    file: Option<&Path>,
    preset: Option<&str>,
) -> Result<Vec<ConfigurableField>, DocParseError> {
    match (file, preset) {
        (Some(path), _) => fields::load_fields(path),
        (None, Some(name)) => builtin::load_preset(name),
        (None, None) => builtin::default_fields(),
    }
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}
