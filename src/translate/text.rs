use std::sync::Arc;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, TermsyncError};
use super::service::{TranslateTextRequest, TranslationService};
use super::SOURCE_LANGUAGE;

/// Single-string translation from English, applying the custom terminology
/// when one is configured
#[derive(Clone)]
pub struct TextTranslator {
    service: Arc<dyn TranslationService>,
    default_target_language: String,
    terminology_name: Option<String>,
}

impl TextTranslator {
    pub fn new(service: Arc<dyn TranslationService>, config: &TranslateConfig) -> Self {
        Self {
            service,
            default_target_language: config.default_target_language.clone(),
            terminology_name: config.custom_terminology_name.clone(),
        }
    }

    pub fn default_target_language(&self) -> &str {
        &self.default_target_language
    }

    pub fn terminology_name(&self) -> Option<&str> {
        self.terminology_name.as_deref()
    }

    pub fn service(&self) -> &Arc<dyn TranslationService> {
        &self.service
    }

    /// Translate `text` into `target_language`, or the default target when `None`.
    /// Makes exactly one service call.
    pub async fn translate(&self, text: &str, target_language: Option<&str>) -> Result<String> {
        if text.is_empty() {
            return Err(TermsyncError::Validation("text must not be empty".to_string()));
        }
        let target_language = match target_language.map(str::trim) {
            Some(lang) if !lang.is_empty() => lang,
            _ => self.default_target_language.as_str(),
        };

        let request = TranslateTextRequest {
            text: text.to_string(),
            source_language: SOURCE_LANGUAGE.to_string(),
            target_language: target_language.to_string(),
            terminology_names: self.terminology_name.iter().cloned().collect(),
        };

        debug!("Translating {} chars to {}", text.len(), target_language);
        self.service
            .translate_text(&request)
            .await
            .map_err(|e| TermsyncError::operation("translate text", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::service::MockTranslationService;

    fn config(terminology: Option<&str>) -> TranslateConfig {
        TranslateConfig {
            custom_terminology_name: terminology.map(String::from),
            default_target_language: "es".to_string(),
            ..TranslateConfig::default()
        }
    }

    #[tokio::test]
    async fn test_translate_applies_terminology_and_source_language() {
        let mut service = MockTranslationService::new();
        service
            .expect_translate_text()
            .withf(|req: &TranslateTextRequest| {
                req.source_language == "en"
                    && req.target_language == "fr"
                    && req.terminology_names == vec!["product-terms".to_string()]
            })
            .times(1)
            .returning(|_| Ok("bonjour".to_string()));

        let translator = TextTranslator::new(Arc::new(service), &config(Some("product-terms")));
        let result = translator.translate("hello", Some("fr")).await.unwrap();

        assert_eq!(result, "bonjour");
    }

    #[tokio::test]
    async fn test_translate_uses_default_target() {
        let mut service = MockTranslationService::new();
        service
            .expect_translate_text()
            .withf(|req: &TranslateTextRequest| req.target_language == "es" && req.terminology_names.is_empty())
            .times(1)
            .returning(|_| Ok("hola".to_string()));

        let translator = TextTranslator::new(Arc::new(service), &config(None));
        assert_eq!(translator.translate("hello", None).await.unwrap(), "hola");
    }

    #[tokio::test]
    async fn test_empty_text_fails_without_calling_service() {
        let mut service = MockTranslationService::new();
        service.expect_translate_text().times(0);

        let translator = TextTranslator::new(Arc::new(service), &config(None));
        let err = translator.translate("", Some("fr")).await.unwrap_err();

        assert!(matches!(err, TermsyncError::Validation(_)));
    }

    #[tokio::test]
    async fn test_service_failure_is_wrapped() {
        let mut service = MockTranslationService::new();
        service
            .expect_translate_text()
            .times(1)
            .returning(|_| Err(TermsyncError::Service("throttled".to_string())));

        let translator = TextTranslator::new(Arc::new(service), &config(None));
        let err = translator.translate("hello", Some("de")).await.unwrap_err();

        assert_eq!(err.to_string(), "translate text failed");
        assert!(matches!(err.root_cause(), TermsyncError::Service(_)));
    }
}
