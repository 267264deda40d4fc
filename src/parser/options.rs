//! Parsing options and configuration.

use crate::cancel::CancelToken;
use crate::layout::LayoutConfig;
use crate::render::PageSelection;

/// Options for parsing PDF documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Password for encrypted documents (empty tries the blank password)
    pub password: String,

    /// Whether to extract embedded images
    pub extract_images: bool,

    /// Page selection (which pages to parse)
    pub pages: PageSelection,

    /// Layout analysis thresholds
    pub layout: LayoutConfig,

    /// Cooperative cancellation for long conversions
    pub cancel: CancelToken,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Skip image extraction entirely.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Override layout analysis thresholds.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            extract_images: true,
            pages: PageSelection::All,
            layout: LayoutConfig::default(),
            cancel: CancelToken::new(),
        }
    }
}
