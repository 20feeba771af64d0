//! Image URL extraction from rendered product pages.
//!
//! The gallery is embedded in an inline `<script>` whose body mentions
//! `colorImages`. Only the first such script is considered. Each gallery
//! entry carries an optional `hiRes` URL and a `large` URL; the chosen URL
//! is `hiRes` when present, otherwise `large`.
//!
//! Finding nothing is a normal outcome and yields an empty list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Marker token identifying the gallery script.
pub const GALLERY_MARKER: &str = "colorImages";

/// Default image host prefix for gallery URLs.
pub const DEFAULT_IMAGE_PREFIX: &str = "https://m.media-amazon.com/images/I/";

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("valid script regex")
});

/// Turns a rendered HTML document into an ordered list of image URLs.
pub trait ImageUrlExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<String>;
}

/// One gallery entry as found in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub hi_res: Option<String>,
    pub large: String,
}

impl ImageCandidate {
    /// `hiRes` when present and non-empty, otherwise `large`; `None` when
    /// both are empty.
    #[must_use]
    pub fn chosen_url(&self) -> Option<&str> {
        match self.hi_res.as_deref() {
            Some(hi) if !hi.is_empty() => Some(hi),
            _ if !self.large.is_empty() => Some(&self.large),
            _ => None,
        }
    }
}

/// Returns the body of the first `<script>` mentioning [`GALLERY_MARKER`].
fn gallery_script(html: &str) -> Option<&str> {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|body| body.contains(GALLERY_MARKER))
}

fn chosen_urls(candidates: Vec<ImageCandidate>) -> Vec<String> {
    candidates
        .iter()
        .filter_map(ImageCandidate::chosen_url)
        .map(str::to_owned)
        .collect()
}

/// Pattern-matches `{"hiRes":…,"thumb":…,"large":…}` entries in the gallery
/// script, in document order.
#[derive(Debug, Clone)]
pub struct ColorImagesExtractor {
    entry_re: Regex,
}

impl ColorImagesExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_image_prefix(DEFAULT_IMAGE_PREFIX)
    }

    /// Builds an extractor that accepts gallery URLs starting with `prefix`.
    ///
    /// # Panics
    ///
    /// If the compiled pattern exceeds the `regex` size limit, which takes a
    /// `prefix` many kilobytes long. `prefix` is escaped, so its contents
    /// cannot make the pattern invalid.
    #[must_use]
    pub fn with_image_prefix(prefix: &str) -> Self {
        let p = regex::escape(prefix);
        let pattern = format!(
            r#"\{{"hiRes":(?:null|"({p}[^"]*)"),"thumb":"{p}[^"]*","large":"({p}[^"]*)""#
        );
        let entry_re = Regex::new(&pattern).expect("valid gallery entry regex");
        Self { entry_re }
    }

    /// All gallery entries in document order, before URL selection.
    #[must_use]
    pub fn candidates(&self, html: &str) -> Vec<ImageCandidate> {
        let Some(script) = gallery_script(html) else {
            return Vec::new();
        };
        self.entry_re
            .captures_iter(script)
            .map(|caps| ImageCandidate {
                hi_res: caps.get(1).map(|m| m.as_str().to_owned()),
                large: caps
                    .get(2)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

impl Default for ColorImagesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageUrlExtractor for ColorImagesExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        chosen_urls(self.candidates(html))
    }
}

#[derive(Debug, Deserialize)]
struct GalleryEntry {
    #[serde(rename = "hiRes")]
    hi_res: Option<String>,
    large: Option<String>,
}

/// Parses the `initial` gallery array of the `colorImages` payload as JSON
/// instead of pattern-matching individual entries.
///
/// Accepts any image host. Entries the JSON parser cannot read are not
/// recovered individually: a malformed array yields an empty result.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGalleryExtractor;

impl JsonGalleryExtractor {
    #[must_use]
    pub fn candidates(&self, html: &str) -> Vec<ImageCandidate> {
        let Some(script) = gallery_script(html) else {
            return Vec::new();
        };
        let Some(marker_at) = script.find(GALLERY_MARKER) else {
            return Vec::new();
        };
        let after_marker = &script[marker_at..];
        let Some(initial_at) = after_marker.find("initial") else {
            return Vec::new();
        };
        let after_initial = &after_marker[initial_at..];
        let Some(array_at) = after_initial.find('[') else {
            return Vec::new();
        };

        // The array is followed by the rest of the script; parse just the first value.
        let mut stream =
            serde_json::Deserializer::from_str(&after_initial[array_at..]).into_iter::<Vec<GalleryEntry>>();
        match stream.next() {
            Some(Ok(entries)) => entries
                .into_iter()
                .map(|e| ImageCandidate {
                    hi_res: e.hi_res,
                    large: e.large.unwrap_or_default(),
                })
                .collect(),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "gallery payload is not valid JSON");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

impl ImageUrlExtractor for JsonGalleryExtractor {
    fn extract(&self, html: &str) -> Vec<String> {
        chosen_urls(self.candidates(html))
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
