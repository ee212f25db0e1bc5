//! Link extraction: find remote image URLs in document text.
//!
//! Matching is purely lexical. A link is a run of URL characters that starts
//! with `http://` or `https://`, contains the host marker, reaches one of the
//! recognised image extensions and may carry a query string or fragment
//! after it. URL characters are anything but whitespace and the delimiters
//! Markdown and HTML wrap links in (`( ) [ ] < > " '`), so
//! `![alt](https://x.amazonaws.com/a.png)` yields the URL without the `)`.

use crate::config::DEFAULT_HOST_MARKER;
use crate::pipeline::name::ImageExtension;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Character class for the body of a link.
const URL_CHAR: &str = r#"[^\s()\[\]<>"']"#;

static DEFAULT_EXTRACTOR: Lazy<LinkExtractor> = Lazy::new(|| {
    LinkExtractor::new(DEFAULT_HOST_MARKER).expect("default link pattern compiles")
});

/// Compiled link pattern for one host marker.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    marker: String,
    pattern: Regex,
}

impl LinkExtractor {
    /// Compile a pattern for `marker`. The marker is matched literally and
    /// case-insensitively.
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let extensions = ImageExtension::ALL
            .iter()
            .map(|ext| regex::escape(&ext.as_str()[1..]))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!(
            r"(?i)https?://{c}+{marker}{c}+?\.(?:{extensions}){c}*",
            c = URL_CHAR,
            marker = regex::escape(marker),
        );
        Ok(Self {
            marker: marker.to_string(),
            pattern: Regex::new(&source)?,
        })
    }

    /// The shared extractor for the default `amazonaws` marker.
    pub fn default_marker() -> &'static LinkExtractor {
        &DEFAULT_EXTRACTOR
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// All links in `text`, in order of first character position.
    ///
    /// Repeated links are returned once per occurrence. No matches yields an
    /// empty vector.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Byte ranges of every link in `text`, ascending and non-overlapping.
    ///
    /// `&text[span]` for each span gives exactly what [`Self::extract`]
    /// returns, in the same order.
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.pattern.find_iter(text).map(|m| m.range()).collect()
    }
}

/// Extract links with the default `amazonaws` marker.
pub fn extract_links(text: &str) -> Vec<String> {
    DEFAULT_EXTRACTOR.extract(text)
}
