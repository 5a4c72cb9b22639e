//! Text generation with template fallback

use std::sync::Arc;

use tracing::{debug, warn};

use crate::gateway::{GatewayError, TextGenerator};
use crate::templates::TemplateCatalog;

/// Character budget for a single description
pub const DEFAULT_MAX_TOKENS: usize = 300;

/// Wraps a [`TextGenerator`] so that callers always get text back
pub struct TextGeneration {
    provider: Arc<dyn TextGenerator>,
    templates: TemplateCatalog,
}

impl TextGeneration {
    pub fn new(provider: Arc<dyn TextGenerator>) -> Self {
        Self::with_templates(provider, TemplateCatalog::default())
    }

    pub fn with_templates(provider: Arc<dyn TextGenerator>, templates: TemplateCatalog) -> Self {
        Self {
            provider,
            templates,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Generated text for `prompt`, or the matching template on any failure
    pub async fn generate(&self, prompt: &str, max_tokens: usize) -> String {
        match self.provider.complete(prompt, max_tokens).await {
            Ok(text) => text,
            Err(GatewayError::NotConfigured { .. }) => {
                debug!("Text generation not configured, using template");
                self.fallback(prompt)
            }
            Err(e) => {
                warn!("Text generation failed, using template: {}", e);
                self.fallback(prompt)
            }
        }
    }

    pub fn fallback(&self, prompt: &str) -> String {
        self.templates.template_for(prompt).to_string()
    }
}
