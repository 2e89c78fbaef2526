//! Noise removal for crawled page text.
//!
//! Steps run in a fixed order: cookie banner, footer lines, blank-line
//! collapse, navigation preamble. Each step is a plain `&str -> String`
//! function so the heuristics can be tested in isolation.

use std::sync::LazyLock;

use regex::Regex;

const COOKIE_SPAN_MAX_CHARS: usize = 2000;
const NAV_WINDOW_CHARS: usize = 800;

static COOKIE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)We use cookies|Select your cookie preferences|Customize cookie preferences|AWS Cookie Notice").expect("static regex")
});
static COOKIE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Accept all|Save preferences|Cookie preferences").expect("static regex"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));
static NAV_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^(?:get\s*started|foundation|components|patterns|demos|github)").expect("static regex"));
static NAV_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n\s*(?:on this section|development guidelines|general guidelines|properties|usage)\b").expect("static regex")
});

const FOOTER_LINES: &[&str] = &["privacy", "site terms", "cookie preferences"];

pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let text = strip_cookie_banner(raw);
    let text = strip_footer_lines(&text);
    let text = collapse_blank_lines(&text);
    skip_navigation(&text).to_string()
}

/// Removes the first cookie-consent span: an opening consent phrase followed
/// by an accept/preferences phrase starting within 2000 characters.
pub fn strip_cookie_banner(text: &str) -> String {
    for open in COOKIE_OPEN.find_iter(text) {
        let Some(close) = COOKIE_CLOSE.find_at(text, open.end()) else { break };
        if close.start() <= offset_after_chars(text, open.end(), COOKIE_SPAN_MAX_CHARS) {
            return format!("{} {}", &text[..open.start()], &text[close.end()..]);
        }
    }
    text.to_string()
}

pub fn strip_footer_lines(text: &str) -> String {
    text.lines().filter(|line| !is_footer_line(line)).collect::<Vec<_>>().join("\n")
}

fn is_footer_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('©') || FOOTER_LINES.iter().any(|f| line.eq_ignore_ascii_case(f))
}

pub fn collapse_blank_lines(text: &str) -> String { BLANK_RUN.replace_all(text, "\n\n").trim().to_string() }

/// Skips a top-of-page navigation block: a line starting with a top-level
/// navigation label, followed within 800 characters by a content heading.
/// Everything through the end of the heading's line is discarded.
pub fn skip_navigation(text: &str) -> &str {
    for label in NAV_LABEL.find_iter(text) {
        match NAV_HEADING.find_at(text, label.end()) {
            Some(heading) if heading.start() <= offset_after_chars(text, label.end(), NAV_WINDOW_CHARS) => {
                let line_end = text[heading.end()..].find('\n').map_or(text.len(), |i| heading.end() + i);
                return text[line_end..].trim_start();
            }
            Some(_) => continue,
            None => break,
        }
    }
    text
}

/// Byte offset `chars` characters past `from`, clamped to the end of `text`.
fn offset_after_chars(text: &str, from: usize, chars: usize) -> usize {
    text[from..].char_indices().nth(chars).map_or(text.len(), |(i, _)| from + i)
}
