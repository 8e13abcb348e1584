//! Prompt-to-app generation
//!
//! Wraps the client with the app-building system prompt, a hard deadline,
//! and supersede semantics: each call takes a sequence ticket, and a
//! result whose ticket is no longer current is discarded instead of
//! overwriting a newer generation's output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::client::GenClient;
use super::error::ProviderError;
use super::templates::demo_template;
use crate::constants;

/// System prompt for single-file app generation
const APP_SYSTEM_PROMPT: &str = r#"You are an expert web developer. Build the app the user describes as ONE complete, self-contained HTML document.

Rules:
- Reply with the HTML document only. No markdown fences, no commentary before or after.
- Start at <!DOCTYPE html> and end at </html>.
- Inline all CSS in a <style> tag and all JavaScript in a <script> tag.
- No external resources: no CDNs, no fonts, no images, no network calls.
- The app must work offline when saved as a single .html file.
- Use semantic HTML and make it look polished on both desktop and mobile."#;

/// Where a generated document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    /// The configured provider produced it
    Provider,
    /// The bundled demo template stood in after a provider failure
    DemoTemplate,
}

/// A generated single-file app
#[derive(Debug, Clone)]
pub struct GeneratedApp {
    pub html: String,
    pub source: GenerationSource,
}

/// Turns prompts into single-file HTML apps
pub struct AppGenerator {
    client: Option<GenClient>,
    /// Latest generation ticket; stale results are discarded
    seq: Arc<AtomicU64>,
}

impl AppGenerator {
    /// Generator backed by a provider client
    pub fn new(client: GenClient) -> Self {
        Self {
            client: Some(client),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Generator with no provider; every call serves the demo template
    pub fn offline() -> Self {
        Self {
            client: None,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether a provider client is configured
    pub fn has_provider(&self) -> bool {
        self.client.is_some()
    }

    /// Generate an app from a prompt, or fail with a provider error
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedApp, ProviderError> {
        let client = self.client.as_ref().ok_or(ProviderError::MissingApiKey {
            provider: "none".to_string(),
        })?;

        // Take a ticket; any later call invalidates this one
        let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let response = tokio::time::timeout(
            constants::http::REQUEST_TIMEOUT,
            client.call_simple(APP_SYSTEM_PROMPT, prompt),
        )
        .await
        .map_err(|_| ProviderError::Timeout)??;

        if self.seq.load(Ordering::SeqCst) != ticket {
            return Err(ProviderError::Superseded);
        }

        let html = extract_html_document(&response).ok_or(ProviderError::EmptyResponse)?;
        info!(bytes = html.len(), "Generated app from provider");

        Ok(GeneratedApp {
            html,
            source: GenerationSource::Provider,
        })
    }

    /// Generate an app, degrading to the demo template on any failure
    ///
    /// One immediate fallback, no retry. A superseded result is the one
    /// failure that does NOT fall back: the newer request owns the output.
    pub async fn generate_or_fallback(&self, prompt: &str) -> Result<GeneratedApp, ProviderError> {
        match self.generate(prompt).await {
            Ok(app) => Ok(app),
            Err(ProviderError::Superseded) => Err(ProviderError::Superseded),
            Err(e) => {
                warn!("Generation failed, serving demo template: {}", e);
                Ok(GeneratedApp {
                    html: demo_template().html.to_string(),
                    source: GenerationSource::DemoTemplate,
                })
            }
        }
    }
}

/// Pull the HTML document out of a model response
///
/// Tolerates markdown fences and prose around the document; returns
/// `None` when no document is present.
fn extract_html_document(response: &str) -> Option<String> {
    let mut text = response.trim();

    // Strip a surrounding ``` / ```html fence if present
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("html").unwrap_or(rest);
        let rest = rest.trim_start_matches(['\r', '\n']);
        text = rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest);
        text = text.trim();
    }

    let lower = text.to_ascii_lowercase();
    let start = lower.find("<!doctype html").or_else(|| lower.find("<html"))?;
    let end = lower.rfind("</html>").map(|i| i + "</html>".len())?;
    if end <= start {
        return None;
    }

    Some(text[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<!DOCTYPE html>\n<html><body>hi</body></html>";

    #[test]
    fn test_extract_plain_document() {
        assert_eq!(extract_html_document(DOC), Some(DOC.to_string()));
    }

    #[test]
    fn test_extract_fenced_document() {
        let fenced = format!("```html\n{DOC}\n```");
        assert_eq!(extract_html_document(&fenced), Some(DOC.to_string()));
    }

    #[test]
    fn test_extract_document_with_prose() {
        let chatty = format!("Here is your app:\n\n{DOC}\n\nEnjoy!");
        assert_eq!(extract_html_document(&chatty), Some(DOC.to_string()));
    }

    #[test]
    fn test_extract_rejects_no_document() {
        assert_eq!(extract_html_document("Sorry, I can't help with that."), None);
        assert_eq!(extract_html_document(""), None);
    }

    #[tokio::test]
    async fn test_offline_generator_falls_back_to_demo() {
        let generator = AppGenerator::offline();

        let app = generator
            .generate_or_fallback("a tip calculator")
            .await
            .expect("Fallback must not fail");

        assert_eq!(app.source, GenerationSource::DemoTemplate);
        assert!(app.html.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_offline_generator_strict_call_errors() {
        let generator = AppGenerator::offline();

        let result = generator.generate("anything").await;
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }
}
