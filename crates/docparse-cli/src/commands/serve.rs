use docparse_core::config::ExtractorConfig;
use docparse_core::error::DocParseError;
use docparse_core::DocumentParser;
use docparse_server::{start_server, AppState};

pub async fn run(host: &str, port: u16, config: ExtractorConfig) -> Result<(), DocParseError> {
    let parser = DocumentParser::from_env(config)?;
    tracing::info!(
        model = %parser.config().model,
        extractor = parser.extractor_name(),
        vision = parser.vision_available(),
        "starting API server"
    );

    let addr = format!("{}:{}", host, port);
    start_server(&addr, AppState::new(parser)).await?;
    Ok(())
}
