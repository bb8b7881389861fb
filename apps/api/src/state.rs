use std::sync::{Arc, OnceLock};

use crate::config::Config;
use crate::docx::Template;
use crate::errors::AppError;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Set once the template archive has been read. Generation is refused until then.
    template: Arc<OnceLock<Arc<Template>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            template: Arc::new(OnceLock::new()),
        }
    }

    /// Installs the loaded template. Returns false if one was already installed.
    pub fn install_template(&self, template: Template) -> bool {
        self.template.set(Arc::new(template)).is_ok()
    }

    pub fn template(&self) -> Result<Arc<Template>, AppError> {
        self.template.get().cloned().ok_or_else(|| {
            AppError::TemplateUnavailable(
                "The template has not been loaded yet. Try again shortly.".to_string(),
            )
        })
    }
}
