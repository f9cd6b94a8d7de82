//! The compiled stylesheet as served to browsers.

use core::fmt::Write as _;
use sha2::{Digest, Sha256};

/// `Cache-Control` for the standalone per-build stylesheet. The URL carries
/// the content hash, so the response never changes.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Length of the hash prefix used in file names.
const SHORT_HASH_LEN: usize = 16;

/// A stylesheet ready for the critical-CSS path or the `.css` endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssArtifact {
    css_text: String,
    hash: String,
}

impl CssArtifact {
    pub fn new(css_text: impl Into<String>) -> Self {
        let css_text = css_text.into();
        let digest = Sha256::digest(css_text.as_bytes());
        let mut hash = String::with_capacity(digest.len() * 2);
        for byte in digest {
            drop(write!(hash, "{byte:02x}"));
        }
        Self { css_text, hash }
    }

    #[inline]
    pub fn css_text(&self) -> &str {
        &self.css_text
    }

    /// Hex SHA-256 of the css text.
    #[inline]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// File name of the standalone resource, e.g. `styles.3f2a….css`.
    pub fn file_name(&self) -> String {
        let short = self.hash.get(..SHORT_HASH_LEN).unwrap_or(&self.hash);
        format!("styles.{short}.css")
    }

    /// Inline `<style>` element for server rendered pages. `</style` inside
    /// the text is escaped so it cannot close the element early.
    pub fn style_tag(&self) -> String {
        let escaped = self.css_text.replace("</style", "<\\/style");
        format!("<style data-ws-css=\"{}\">\n{escaped}</style>", self.file_name())
    }

    /// Headers for serving the standalone resource.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("Content-Type", "text/css; charset=utf-8".to_owned()),
            ("Cache-Control", IMMUTABLE_CACHE_CONTROL.to_owned()),
            ("ETag", format!("\"{}\"", self.hash)),
        ]
    }
}
