//! Hosted document service implementations for docpair.
//!
//! All services implement the `docpair_core::DocumentService` trait.
//! [`build_from_config`] constructs the configured one.

pub mod gemini;

pub use gemini::GeminiProvider;

use docpair_config::{AppConfig, ConfigError};
use docpair_core::DocumentService;
use std::sync::Arc;
use std::time::Duration;

/// Build the document service from configuration.
///
/// Fails with [`ConfigError::MissingCredentials`] when no API key is set.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn DocumentService>, ConfigError> {
    let api_key = config.require_api_key()?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let mut provider = GeminiProvider::new(api_key, &config.model, timeout)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if let Some(url) = &config.api_url {
        provider = provider.with_base_url(url);
    }

    tracing::debug!(
        service = provider.name(),
        model = provider.model(),
        timeout_secs = config.request_timeout_secs,
        "Document service configured"
    );

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ConfigError::MissingCredentials(_))
        ));
    }

    #[test]
    fn build_with_api_key() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        let service = build_from_config(&config).unwrap();
        assert_eq!(service.name(), "gemini");
    }

    #[test]
    fn build_uses_configured_model() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            model: "gemini-1.5-pro".into(),
            ..AppConfig::default()
        };
        let provider = GeminiProvider::new(
            config.require_api_key().unwrap(),
            &config.model,
            Duration::from_secs(config.request_timeout_secs),
        )
        .unwrap();
        assert_eq!(provider.model(), "gemini-1.5-pro");
        assert!(build_from_config(&config).is_ok());
    }
}
