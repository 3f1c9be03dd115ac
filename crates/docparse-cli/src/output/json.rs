use docparse_core::error::DocParseError;
use docparse_core::model::ExtractionResult;
use std::path::Path;

pub fn print(result: &ExtractionResult) -> Result<(), DocParseError> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

pub fn write(result: &ExtractionResult, path: &Path) -> Result<(), DocParseError> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    Ok(())
}
