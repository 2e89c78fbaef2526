//! Query-anchored excerpts.
//!
//! Anchor priority: a structural heading on component api/usage pages, then
//! the first keyword hit, then the head of the text. Keyword hits inside an
//! anchored window are wrapped in `**`. Nothing here fails: a bad URL or an
//! unusable keyword just falls through to the next strategy.

use std::sync::LazyLock;

use regex::{Captures, Regex, RegexBuilder};
use url::Url;

pub const BOLD: &str = "**";

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9\-_/]+").expect("static regex"));
static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(Properties|API|Usage|Development guidelines|Guidelines|Overview)[ \t]*\r?$").expect("static regex")
});

pub fn make_preview(text: &str, query: &str, size: usize, url: Option<&str>) -> String {
    if text.is_empty() {
        return String::new();
    }
    let keyword = keyword_pattern(query);
    let anchor = url
        .filter(|u| is_component_tab_page(u))
        .and_then(|_| heading_anchor(text))
        .or_else(|| keyword.as_ref().and_then(|re| re.find(text)).map(|m| m.start()));

    match (anchor, &keyword) {
        (Some(at), Some(re)) => embolden(re, window(text, at, size)),
        (Some(at), None) => window(text, at, size).to_string(),
        (None, _) => char_slice(text, 0, size).to_string(),
    }
}

/// Case-insensitive literal pattern for the first keyword-like token of `query`
/// (or the whole trimmed query when there is none).
pub fn keyword_pattern(query: &str) -> Option<Regex> {
    let q = query.trim();
    if q.is_empty() {
        return None;
    }
    let key = KEYWORD.find(q).map_or(q, |m| m.as_str());
    RegexBuilder::new(&regex::escape(key)).case_insensitive(true).build().ok()
}

/// Component documentation page on the `api` or `usage` tab.
pub fn is_component_tab_page(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else { return false };
    let tab = parsed
        .query_pairs()
        .find(|(k, _)| k == "tabId")
        .map(|(_, v)| v.to_lowercase())
        .unwrap_or_default();
    parsed.path().starts_with("/components/") && matches!(tab.as_str(), "api" | "usage")
}

/// Byte offset of the first structural heading sitting on its own line.
pub fn heading_anchor(text: &str) -> Option<usize> {
    SECTION_HEADING.captures(text).and_then(|c| c.get(1)).map(|m| m.start())
}

/// `size` characters centred on the byte offset `anchor`, clipped to the text.
fn window(text: &str, anchor: usize, size: usize) -> &str {
    let total = text.chars().count();
    let center = text[..anchor].chars().count();
    let start = center.saturating_sub(size / 2);
    let end = (start + size).min(total);
    char_slice(text, start, end)
}

fn embolden(re: &Regex, chunk: &str) -> String {
    re.replace_all(chunk, |c: &Captures| format!("{BOLD}{}{BOLD}", &c[0])).into_owned()
}

fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte = |n: usize| text.char_indices().nth(n).map_or(text.len(), |(i, _)| i);
    &text[byte(start)..byte(end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_URL: &str = "https://docs.example/components/table/?tabId=api";

    #[test]
    fn empty_text_gives_empty_preview() {
        assert_eq!(make_preview("", "anything", 800, None), "");
        assert_eq!(make_preview("", "", 800, Some("::bad::")), "");
    }

    #[test]
    fn keyword_is_first_token_like_substring() {
        let re = keyword_pattern("  how do I use app-layout/split_panel?").expect("pattern");
        assert_eq!(re.as_str(), r"how");
        let re = keyword_pattern("!! app-layout/split_panel").expect("pattern");
        assert_eq!(re.as_str(), r"app\-layout/split_panel");
        let re = keyword_pattern("?").expect("pattern");
        assert_eq!(re.as_str(), r"\?");
        assert!(keyword_pattern("   ").is_none());
    }

    #[test]
    fn falls_back_to_head_without_match() {
        let text = "abcdefghij";
        assert_eq!(make_preview(text, "zzz", 4, None), "abcd");
        assert_eq!(make_preview(text, "", 4, Some(API_URL)), "abcd");
        assert_eq!(make_preview(text, "zzz", 40, Some("not a url")), text);
    }

    #[test]
    fn centres_on_keyword_and_bolds_every_hit() {
        let text = format!("{}Table rows. A table.{}", "x".repeat(100), "y".repeat(100));
        let p = make_preview(&text, "table", 20, None);
        assert_eq!(p, "xxxxxxxxxx**Table** rows");
    }

    #[test]
    fn heading_wins_on_component_tab_pages() {
        let text = format!("button mention\n{}\nProperties\nvariant: string", "z".repeat(200));
        let anchored = make_preview(&text, "variant", 60, Some(API_URL));
        assert!(anchored.contains("Properties"), "{anchored}");
        assert!(anchored.contains("**variant**"), "{anchored}");

        // same text on a pattern page anchors on the keyword instead
        let kw = make_preview(&text, "button", 30, Some("https://docs.example/patterns/x/"));
        assert!(kw.starts_with("**button**"), "{kw}");
    }

    #[test]
    fn heading_must_be_on_its_own_line() {
        assert_eq!(heading_anchor("see Properties below"), None);
        assert_eq!(heading_anchor("Usage\nbody"), Some(0));
        assert_eq!(heading_anchor("intro\n  Development guidelines  \nbody"), Some(8));
        assert_eq!(heading_anchor("intro\r\nProperties\r\nbody"), Some(7));
        assert_eq!(heading_anchor("Usage\r"), Some(0));
    }

    #[test]
    fn length_never_exceeds_size_plus_markers() {
        let text = "alert ".repeat(500);
        for size in [0usize, 1, 7, 100, 1200] {
            let p = make_preview(&text, "alert", size, Some(API_URL));
            let markers = p.matches(BOLD).count() * BOLD.len();
            assert!(p.chars().count() <= size + markers, "size {size}");
        }
    }

    #[test]
    fn multibyte_windows_are_char_aligned() {
        let text = format!("{}needle{}", "ü".repeat(50), "ß".repeat(50));
        let p = make_preview(&text, "needle", 12, None);
        assert_eq!(p, "üüüüüü**needle**");
    }

    #[test]
    fn tab_detection() {
        assert!(is_component_tab_page(API_URL));
        assert!(is_component_tab_page("https://docs.example/components/table/?tabId=USAGE"));
        assert!(!is_component_tab_page("https://docs.example/components/table/"));
        assert!(!is_component_tab_page("typedoc://components/x.md"));
    }
}
