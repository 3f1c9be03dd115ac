use crate::client::retry::RetryPolicy;
use crate::error::DocParseError;
use crate::scoring::ScoringPolicy;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
/// Upper bound accepted for the document size limit.
pub const MAX_FILE_SIZE_MB: usize = 1024;

/// Settings consumed by the extraction pipeline.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Model used for text prompts.
    pub model: String,
    /// Vision-capable model used when a PDF has no text layer.
    pub vision_model: String,
    /// Documents larger than this fail before any network call.
    pub max_document_bytes: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Render pages and retry with the vision model when no text is found.
    pub vision_fallback: bool,
    pub retry: RetryPolicy,
    pub scoring: ScoringPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            max_document_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            max_tokens: 2000,
            temperature: 0.1,
            vision_fallback: true,
            retry: RetryPolicy::default(),
            scoring: ScoringPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn with_max_file_size_mb(mut self, mb: usize) -> Self {
        // Overflow saturates and is then rejected by `validate`.
        self.max_document_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    /// Maximum document size in whole megabytes, for display.
    pub fn max_file_size_mb(&self) -> usize {
        self.max_document_bytes / (1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), DocParseError> {
        if self.model.trim().is_empty() {
            return Err(DocParseError::Config("model must not be empty".into()));
        }
        if self.vision_model.trim().is_empty() {
            return Err(DocParseError::Config(
                "vision model must not be empty".into(),
            ));
        }
        if self.max_document_bytes == 0 {
            return Err(DocParseError::Config(
                "maximum document size must be positive".into(),
            ));
        }
        if self.max_document_bytes > MAX_FILE_SIZE_MB * 1024 * 1024 {
            return Err(DocParseError::Config(format!(
                "maximum document size exceeds {} MB",
                MAX_FILE_SIZE_MB
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DocParseError::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.retry.attempt_timeout.is_zero() {
            return Err(DocParseError::Config(
                "attempt timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        OpenAiSettings {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Read `OPENAI_API_KEY` (required) and `OPENAI_API_BASE` (optional).
    pub fn from_env() -> Result<Self, DocParseError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DocParseError::Config("OPENAI_API_KEY environment variable not set".into())
        })?;
        let mut settings = OpenAiSettings::new(api_key);
        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            settings.base_url = base;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), DocParseError> {
        if self.api_key.trim().is_empty() {
            return Err(DocParseError::Config("API key must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(DocParseError::Config(format!(
                "API base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExtractorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_file_size_mb(), 10);
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = ExtractorConfig::default().with_max_file_size_mb(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_limit_rejected() {
        let config = ExtractorConfig::default().with_max_file_size_mb(usize::MAX / 1000);
        assert_eq!(config.max_document_bytes, usize::MAX);
        assert!(matches!(config.validate(), Err(DocParseError::Config(_))));

        let config = ExtractorConfig::default().with_max_file_size_mb(MAX_FILE_SIZE_MB + 1);
        assert!(config.validate().is_err());

        let config = ExtractorConfig::default().with_max_file_size_mb(MAX_FILE_SIZE_MB);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let config = ExtractorConfig {
            temperature: 3.0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_validation() {
        assert!(OpenAiSettings::new("sk-test").validate().is_ok());
        assert!(OpenAiSettings::new(" ").validate().is_err());
        let mut s = OpenAiSettings::new("sk-test");
        s.base_url = "api.openai.com".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let s = OpenAiSettings::new("sk-secret");
        assert!(!format!("{:?}", s).contains("sk-secret"));
    }
}
