//! Boilerplate classification and removal.
//!
//! The rules classify markup nodes as noise: script/style/noscript, structural
//! chrome tags, and elements whose class or id marks them as ads, navigation,
//! sidebars, cookie banners, popups, modals, or newsletters. Matching is
//! case-sensitive on the attribute value as authored.

use scraper::{ElementRef, Html, Selector};

/// Tags that never contain article content.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "aside", "iframe", "form",
];

/// Exact class tokens denoting boilerplate blocks.
const NOISE_CLASS_TOKENS: &[&str] = &[
    "ad",
    "ads",
    "advertisement",
    "sidebar",
    "cookie",
    "popup",
    "modal",
    "newsletter",
];

/// Substrings in the `class` attribute denoting navigation chrome.
const NOISE_CLASS_SUBSTRINGS: &[&str] = &["nav", "menu", "footer", "header"];

/// Substrings in the `id` attribute denoting navigation chrome.
const NOISE_ID_SUBSTRINGS: &[&str] = &["nav", "sidebar"];

/// Classify a single element as boilerplate.
pub fn is_noise_element(el: &ElementRef<'_>) -> bool {
    let tag = el.value().name();
    if NOISE_TAGS.contains(&tag) {
        return true;
    }

    if let Some(class) = el.value().attr("class") {
        if class
            .split_whitespace()
            .any(|token| NOISE_CLASS_TOKENS.contains(&token))
        {
            return true;
        }
        if NOISE_CLASS_SUBSTRINGS.iter().any(|s| class.contains(s)) {
            return true;
        }
    }

    if let Some(id) = el.value().attr("id") {
        if NOISE_ID_SUBSTRINGS.iter().any(|s| id.contains(s)) {
            return true;
        }
    }

    false
}

/// Remove every noise subtree from an HTML document.
///
/// The document is re-serialized first so each noise element's outer HTML
/// appears verbatim in the output being edited. Removing an outer subtree
/// also removes any noise nested inside it; the leftover inner replacements
/// are no-ops. Idempotent: filtering already-filtered output removes nothing.
pub fn strip_noise(html: &str) -> String {
    let doc = Html::parse_document(html);
    let all = Selector::parse("*").expect("static selector");

    let mut result = doc.html();
    for el in doc.select(&all) {
        if is_noise_element(&el) {
            let outer = el.html();
            result = result.replace(&outer, "");
        }
    }
    result
}
