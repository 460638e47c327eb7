//! Transcript translation with tagged degradation
//!
//! Translation is best-effort and must never block record persistence, so
//! this service has a never-fail contract: any problem degrades to the
//! original text behind a fixed tag prefix that downstream consumers can
//! recognize.

use std::sync::Arc;

use crate::backend::{ChatBackend, ChatRequest};

/// Display name for a source language code. Unknown codes fall back to the
/// code itself.
pub fn language_name(code: &str) -> &str {
    match code {
        "pt" => "Portuguese",
        "af" => "Afrikaans",
        "sw" => "Swahili",
        "en" => "English",
        other => other,
    }
}

/// Transcript translation service
pub struct Translator {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl Translator {
    /// Create a translator. `None` means no credentials are configured and
    /// every call degrades to the unavailable tag.
    pub fn new(backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self { backend }
    }

    /// Translate `text` from `source_language` into English.
    ///
    /// Returns one of:
    /// - the translated text,
    /// - `"[Translation unavailable - Original <lang> text]\n\n<text>"` when
    ///   no backend is configured,
    /// - `"[Translation failed - Original <lang> text]\n\n<text>"` when the
    ///   call fails or comes back empty.
    pub async fn translate(&self, text: &str, source_language: &str) -> String {
        let Some(backend) = &self.backend else {
            tracing::warn!(language = source_language, "no translation backend configured");
            return format!(
                "[Translation unavailable - Original {} text]\n\n{}",
                source_language, text
            );
        };

        let request = ChatRequest::user(text).with_system(format!(
            "You are a professional translator. Translate the following text from {} to English. \
             Maintain the conversational format with \"User:\" and \"Agent:\" labels. \
             Keep the meaning accurate and natural.",
            language_name(source_language)
        ));

        match backend.complete(&request).await {
            Ok(translated) if !translated.is_empty() => {
                tracing::info!(
                    language = source_language,
                    chars = translated.len(),
                    "transcript translated"
                );
                translated
            }
            Ok(_) => {
                tracing::warn!(language = source_language, "translation came back empty");
                format!(
                    "[Translation failed - Original {} text]\n\n{}",
                    source_language, text
                )
            }
            Err(err) => {
                tracing::warn!(language = source_language, error = %err, "translation failed");
                format!(
                    "[Translation failed - Original {} text]\n\n{}",
                    source_language, text
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedBackend {
        reply: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl FixedBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            Err(LlmError::Api("HTTP 500: upstream".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("pt"), "Portuguese");
        assert_eq!(language_name("af"), "Afrikaans");
        assert_eq!(language_name("sw"), "Swahili");
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("xx"), "xx");
    }

    #[tokio::test]
    async fn test_successful_translation() {
        let backend = Arc::new(FixedBackend::new("User: I was not paid\n\nAgent: I see"));
        let translator = Translator::new(Some(backend.clone()));

        let out = translator
            .translate("User: Nao fui pago\n\nAgent: Entendo", "pt")
            .await;
        assert_eq!(out, "User: I was not paid\n\nAgent: I see");

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        let system = request.system.unwrap();
        assert!(system.contains("from Portuguese to English"));
        assert!(system.contains("\"User:\" and \"Agent:\" labels"));
        assert_eq!(request.user, "User: Nao fui pago\n\nAgent: Entendo");
    }

    #[tokio::test]
    async fn test_no_backend_degrades_to_unavailable_tag() {
        let translator = Translator::new(None);
        let out = translator.translate("User: Ola", "pt").await;
        assert!(out.starts_with("[Translation unavailable - Original pt text]"));
        assert!(out.ends_with("User: Ola"));
    }

    #[tokio::test]
    async fn test_backend_error_degrades_to_failed_tag() {
        let translator = Translator::new(Some(Arc::new(FailingBackend)));
        let out = translator.translate("User: Habari", "sw").await;
        assert_eq!(
            out,
            "[Translation failed - Original sw text]\n\nUser: Habari"
        );
    }

    #[tokio::test]
    async fn test_empty_response_degrades_to_failed_tag() {
        let translator = Translator::new(Some(Arc::new(FixedBackend::new(""))));
        let out = translator.translate("User: Goeie dag", "af").await;
        assert!(out.starts_with("[Translation failed - Original af text]"));
    }
}
