//! HTML stripping char filter.
//!
//! # Examples
//!
//! ```
//! use fathom::analysis::char_filter::CharFilter;
//! use fathom::analysis::char_filter::html_strip::HtmlStripCharFilter;
//!
//! let filter = HtmlStripCharFilter::new();
//! assert_eq!(filter.filter("<p>Fish &amp; chips</p>").trim(), "Fish & chips");
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::char_filter::CharFilter;

static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap()
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)</?[A-Za-z!][^>]*>").unwrap());
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").unwrap());

/// Removes tags, comments and script/style bodies, and decodes character
/// entities. Tags are replaced by a space so adjacent words stay apart.
#[derive(Clone, Debug, Default)]
pub struct HtmlStripCharFilter;

impl HtmlStripCharFilter {
    pub fn new() -> Self {
        HtmlStripCharFilter
    }

    fn decode_entity(entity: &str) -> Option<String> {
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => ' ',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()?
                } else {
                    entity.strip_prefix('#')?.parse().ok()?
                };
                char::from_u32(code)?
            }
        };
        Some(decoded.to_string())
    }
}

impl CharFilter for HtmlStripCharFilter {
    fn filter(&self, input: &str) -> String {
        if !input.contains(['<', '&']) {
            return input.to_string();
        }
        let text = SCRIPT.replace_all(input, " ");
        let text = COMMENT.replace_all(&text, " ");
        let text = TAG.replace_all(&text, " ");
        ENTITY
            .replace_all(&text, |caps: &regex::Captures| {
                Self::decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "html_strip"
    }
}
