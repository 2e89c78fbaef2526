//! URL canonicalization and section classification for crawled pages.
//!
//! Component pages are reduced to one URL per documentation tab, noisy
//! variants (live examples, playground, testing tabs) are dropped, pattern
//! pages lose only their fragment. URLs outside the documentation domain, and
//! anything that does not parse, pass through untouched.

use url::Url;

use crate::types::Section;

pub const DEFAULT_DOMAIN: &str = "cloudscape.design";

const DROPPED_TABS: &[&str] = &["playground", "testing"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalized {
    pub url: String,
    pub section: Section,
    /// `false` means the record is noise and must not be indexed.
    pub keep: bool,
}

impl Canonicalized {
    fn passthrough(raw: &str) -> Self { Self { url: raw.to_string(), section: Section::Other, keep: true } }
}

#[derive(Debug, Clone)]
pub struct Canonicalizer {
    domain: String,
}

impl Default for Canonicalizer {
    fn default() -> Self { Self::new(DEFAULT_DOMAIN) }
}

impl Canonicalizer {
    pub fn new(domain: impl Into<String>) -> Self { Self { domain: domain.into().to_ascii_lowercase() } }

    pub fn domain(&self) -> &str { &self.domain }

    /// True when `host` is the documentation domain or one of its subdomains.
    pub fn owns_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.domain || host.strip_suffix(&self.domain).is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Deterministic and idempotent; never fails.
    pub fn canonicalize(&self, raw: &str) -> Canonicalized {
        let Ok(mut parsed) = Url::parse(raw) else {
            return Canonicalized::passthrough(raw);
        };
        if !parsed.host_str().is_some_and(|h| self.owns_host(h)) {
            return Canonicalized::passthrough(raw);
        }

        if parsed.path().starts_with("/components/") {
            let mut has_example = false;
            let mut tab = String::new();
            for (key, value) in parsed.query_pairs() {
                match key.as_ref() {
                    "example" => has_example = true,
                    "tabId" => tab = value.to_lowercase(),
                    _ => {}
                }
            }
            if has_example || DROPPED_TABS.contains(&tab.as_str()) {
                return Canonicalized { url: raw.to_string(), section: Section::ComponentsOther, keep: false };
            }

            parsed.set_fragment(None);
            let section = match tab.as_str() {
                "api" => Section::ComponentsApi,
                "usage" => Section::ComponentsUsage,
                _ => Section::ComponentsOther,
            };
            if section == Section::ComponentsOther {
                parsed.set_query(None);
            } else {
                let query = format!("tabId={tab}");
                parsed.set_query(Some(&query));
            }
            return Canonicalized { url: parsed.into(), section, keep: true };
        }

        if parsed.path().starts_with("/patterns/") {
            parsed.set_fragment(None);
            if parsed.query() == Some("") { parsed.set_query(None); }
            return Canonicalized { url: parsed.into(), section: Section::Patterns, keep: true };
        }

        Canonicalized::passthrough(raw)
    }
}
