//! Rendering options and page selection.

use crate::error::{Error, Result};

/// Options for rendering a document to Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit bold and italic emphasis; when false, text renders plain
    pub preserve_formatting: bool,

    /// Include YAML frontmatter built from the document metadata
    pub include_frontmatter: bool,

    /// Prefix for image paths in output (e.g., "./images/")
    pub image_path_prefix: String,

    /// Character for unordered list markers
    pub list_marker: char,

    /// Maximum heading level (1-6); deeper headings are clamped
    pub max_heading_level: u8,

    /// Collect extraction statistics during rendering
    pub collect_stats: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable emphasis markers.
    pub fn with_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Enable statistics collection during rendering.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            include_frontmatter: false,
            image_path_prefix: String::new(),
            list_marker: '-',
            max_heading_level: 6,
            collect_stats: false,
        }
    }
}

/// Which pages of a document to process (1-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A single page
    Single(u32),
    /// An inclusive range
    Range(u32, u32),
    /// An explicit set of pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn contains(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Single(p) => *p == page,
            PageSelection::Range(start, end) => (*start..=*end).contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Check the selection against the document's page count.
    ///
    /// Asking for pages a document does not have is reported as an
    /// error rather than silently yielding empty output.
    pub fn validate(&self, total: u32) -> Result<()> {
        match self {
            PageSelection::All => Ok(()),
            PageSelection::Single(p) => check_page(*p, total),
            PageSelection::Range(start, end) => {
                if start > end || *start == 0 {
                    return Err(Error::InvalidPageRange(format!("{}-{}", start, end)));
                }
                check_page(*end, total)
            }
            PageSelection::Pages(pages) => {
                for &p in pages {
                    check_page(p, total)?;
                }
                Ok(())
            }
        }
    }

    /// Parse a selection string such as "all", "3", "1-10", "1,3,5-7".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let start = parse_page(start)?;
                let end = parse_page(end)?;
                return Ok(PageSelection::Range(start, end));
            }
            return Ok(PageSelection::Single(parse_page(s)?));
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            if let Some((start, end)) = part.split_once('-') {
                for p in parse_page(start)?..=parse_page(end)? {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p = parse_page(part)?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }
        pages.sort_unstable();
        Ok(PageSelection::Pages(pages))
    }
}

fn check_page(page: u32, total: u32) -> Result<()> {
    if page == 0 || page > total {
        Err(Error::PageOutOfRange(page, total))
    } else {
        Ok(())
    }
}

fn parse_page(s: &str) -> Result<u32> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidPageRange(s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_max_heading(3)
            .with_formatting(false);

        assert!(options.include_frontmatter);
        assert_eq!(options.max_heading_level, 3);
        assert!(!options.preserve_formatting);
    }

    #[test]
    fn test_page_selection_contains() {
        assert!(PageSelection::All.contains(100));
        assert!(PageSelection::Single(3).contains(3));
        assert!(!PageSelection::Single(3).contains(4));

        let range = PageSelection::Range(5, 10);
        assert!(!range.contains(4));
        assert!(range.contains(5));
        assert!(range.contains(10));
        assert!(!range.contains(11));

        let pages = PageSelection::Pages(vec![1, 3, 5]);
        assert!(pages.contains(3));
        assert!(!pages.contains(2));
    }

    #[test]
    fn test_page_selection_validate() {
        assert!(PageSelection::All.validate(0).is_ok());
        assert!(PageSelection::Single(5).validate(10).is_ok());

        let err = PageSelection::Single(11).validate(10).unwrap_err();
        assert_eq!(err.category(), "page-range");

        let err = PageSelection::Range(7, 3).validate(10).unwrap_err();
        assert!(matches!(err, Error::InvalidPageRange(_)));

        let err = PageSelection::Single(0).validate(10).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange(0, 10)));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("7").unwrap(), PageSelection::Single(7));
        assert_eq!(
            PageSelection::parse("1-10").unwrap(),
            PageSelection::Range(1, 10)
        );
        assert_eq!(
            PageSelection::parse("1,3,5-7").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7])
        );
        assert!(PageSelection::parse("x-3").is_err());
    }
}
