//! Bucketed retrieval: per-bucket ranked queries, per-bucket score
//! normalization and preview assembly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::Canonicalizer;
use crate::preview::make_preview;
use crate::score::normalize_ranks;
use crate::source::TYPEDOC_SCHEME;
use crate::traits::RankedIndex;
use crate::types::{Bucket, PageResult, RankedDoc, SearchHit, SearchRequest, SearchResponse};

pub const DEFAULT_PREVIEW_CHARS: usize = 1200;
pub const OVERSAMPLE_FLOOR: usize = 50;
pub const OVERSAMPLE_FACTOR: usize = 6;

/// How bucket membership is decided at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One section-filtered query per bucket; membership is the stored section.
    #[default]
    Exact,
    /// One oversampled unfiltered query; membership is guessed from each hit's
    /// URL and can disagree with the stored section.
    Approximate,
}

impl std::str::FromStr for Strategy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Strategy::Exact),
            "approximate" | "approx" => Ok(Strategy::Approximate),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown strategy '{other}'"))),
        }
    }
}

pub struct BucketedRetriever<I> {
    index: I,
    strategy: Strategy,
    preview_chars: usize,
    canonicalizer: Canonicalizer,
}

impl<I: RankedIndex> BucketedRetriever<I> {
    pub fn new(index: I) -> Self {
        Self { index, strategy: Strategy::default(), preview_chars: DEFAULT_PREVIEW_CHARS, canonicalizer: Canonicalizer::default() }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self { self.strategy = strategy; self }
    pub fn with_preview_chars(mut self, chars: usize) -> Self { self.preview_chars = chars; self }
    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self { self.canonicalizer = canonicalizer; self }

    pub fn index(&self) -> &I { &self.index }
    pub fn strategy(&self) -> Strategy { self.strategy }

    pub fn search(&self, req: &SearchRequest) -> anyhow::Result<SearchResponse> {
        let buckets = match self.strategy {
            Strategy::Exact => self.exact(req)?,
            Strategy::Approximate => self.approximate(req)?,
        };
        let mut response = SearchResponse::empty(req.q.clone());
        for (bucket, docs) in buckets {
            *response.bucket_mut(bucket) = self.assemble(docs, &req.q);
        }
        Ok(response)
    }

    /// Full document by URL; `typedoc://` URLs also try the scheme-less form.
    pub fn page(&self, url: &str) -> anyhow::Result<PageResult> {
        if let Some(page) = self.index.fetch(url)? {
            return Ok(PageResult::Found(page));
        }
        if let Some(stripped) = url.strip_prefix(TYPEDOC_SCHEME) {
            if let Some(page) = self.index.fetch(stripped)? {
                return Ok(PageResult::Found(page));
            }
        }
        Ok(PageResult::not_found(url))
    }

    fn exact(&self, req: &SearchRequest) -> anyhow::Result<Vec<(Bucket, Vec<RankedDoc>)>> {
        let mut out = Vec::with_capacity(Bucket::ALL.len());
        for bucket in Bucket::ALL {
            let cap = cap(req.cap(bucket));
            let docs = if cap == 0 { Vec::new() } else { self.index.ranked(&req.q, Some(bucket.section()), cap)? };
            out.push((bucket, docs));
        }
        Ok(out)
    }

    fn approximate(&self, req: &SearchRequest) -> anyhow::Result<Vec<(Bucket, Vec<RankedDoc>)>> {
        let caps: Vec<usize> = Bucket::ALL.iter().map(|b| cap(req.cap(*b))).collect();
        let mut out: Vec<(Bucket, Vec<RankedDoc>)> = Bucket::ALL.iter().map(|b| (*b, Vec::new())).collect();
        let requested = caps.iter().fold(0usize, |acc, c| acc.saturating_add(*c));
        if requested == 0 {
            return Ok(out);
        }
        let limit = OVERSAMPLE_FLOOR.max(requested.saturating_mul(OVERSAMPLE_FACTOR));
        let superset = self.index.ranked(&req.q, None, limit)?;
        debug!(limit, hits = superset.len(), "approximate superset");
        for mut doc in superset {
            let Some(bucket) = classify_url(&self.canonicalizer, &doc.url) else { continue };
            let slot = Bucket::ALL.iter().position(|b| *b == bucket).unwrap_or_default();
            if out[slot].1.len() < caps[slot] {
                doc.section = bucket.section();
                out[slot].1.push(doc);
            }
        }
        Ok(out)
    }

    fn assemble(&self, docs: Vec<RankedDoc>, query: &str) -> Vec<SearchHit> {
        let ranks: Vec<f64> = docs.iter().map(|d| d.raw_rank).collect();
        let mut hits: Vec<SearchHit> = docs
            .into_iter()
            .zip(normalize_ranks(&ranks))
            .map(|(doc, score)| SearchHit {
                text_preview: make_preview(&doc.text, query, self.preview_chars, Some(&doc.url)),
                text_len: doc.text.chars().count(),
                section: Some(doc.section),
                url: doc.url,
                title: doc.title,
                score,
                raw_rank: doc.raw_rank,
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits
    }
}

/// Bucket guessed from a URL alone, following the canonicalizer's section rules.
pub fn classify_url(canonicalizer: &Canonicalizer, url: &str) -> Option<Bucket> {
    if url.to_ascii_lowercase().starts_with(TYPEDOC_SCHEME) {
        return Some(Bucket::Typedoc);
    }
    let canon = canonicalizer.canonicalize(url);
    if !canon.keep {
        return None;
    }
    canon.section.bucket()
}

/// Non-positive caps mean "nothing from this bucket".
fn cap(k: i64) -> usize { usize::try_from(k).unwrap_or(0) }

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::{Page, Section};

    /// Ranks by occurrence count of the query in the text, negated so lower is better.
    #[derive(Default)]
    struct FakeIndex {
        docs: Vec<(u64, String, Section, String)>,
        calls: Mutex<Vec<(Option<Section>, usize)>>,
    }

    impl FakeIndex {
        fn add(mut self, url: &str, section: Section, text: &str) -> Self {
            let id = self.docs.len() as u64 + 1;
            self.docs.push((id, url.into(), section, text.into()));
            self
        }
    }

    impl RankedIndex for FakeIndex {
        fn ranked(&self, query: &str, section: Option<Section>, limit: usize) -> anyhow::Result<Vec<RankedDoc>> {
            self.calls.lock().expect("lock").push((section, limit));
            let q = query.to_lowercase();
            let mut out: Vec<RankedDoc> = self
                .docs
                .iter()
                .filter(|(_, _, s, _)| section.map_or(true, |want| *s == want))
                .filter_map(|(id, url, s, text)| {
                    let n = text.to_lowercase().matches(&q).count();
                    (n > 0).then(|| RankedDoc { id: *id, url: url.clone(), title: format!("doc {id}"), text: text.clone(), section: *s, raw_rank: -(n as f64) })
                })
                .collect();
            out.sort_by(|a, b| a.raw_rank.total_cmp(&b.raw_rank));
            out.truncate(limit);
            Ok(out)
        }

        fn fetch(&self, url: &str) -> anyhow::Result<Option<Page>> {
            Ok(self.docs.iter().find(|(_, u, _, _)| u == url).map(|(id, u, _, t)| Page { id: *id, url: u.clone(), title: format!("doc {id}"), text: t.clone() }))
        }
    }

    fn corpus() -> FakeIndex {
        FakeIndex::default()
            .add("https://docs.example/components/button/?tabId=api", Section::ComponentsApi, "button button button")
            .add("https://docs.example/components/button/?tabId=usage", Section::ComponentsUsage, "button usage")
            .add("https://docs.example/patterns/actions/", Section::Patterns, "button button")
            .add("https://docs.example/patterns/forms/", Section::Patterns, "a button")
            .add("https://docs.example/patterns/empty/", Section::Patterns, "button button button")
            .add("typedoc://button.md", Section::Typedoc, "button props")
            .add("https://docs.example/components/button/", Section::ComponentsOther, "button button button button button")
            // stored as a pattern although its URL looks like an api tab
            .add("https://docs.example/components/odd/?tabId=api", Section::Patterns, "button")
    }

    fn retriever(strategy: Strategy) -> BucketedRetriever<FakeIndex> {
        BucketedRetriever::new(corpus()).with_strategy(strategy).with_canonicalizer(Canonicalizer::new("docs.example"))
    }

    #[test]
    fn exact_buckets_follow_stored_section() {
        let r = retriever(Strategy::Exact);
        let resp = r.search(&SearchRequest { k_patterns: 10, ..SearchRequest::new("button") }).expect("search");
        assert_eq!(resp.query, "button");
        assert_eq!(resp.components.api.len(), 1);
        assert_eq!(resp.components.usage.len(), 1);
        assert_eq!(resp.typedoc.len(), 1);
        let pattern_urls: Vec<_> = resp.patterns.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(pattern_urls, ["https://docs.example/patterns/empty/", "https://docs.example/patterns/actions/", "https://docs.example/patterns/forms/", "https://docs.example/components/odd/?tabId=api"]);
        for b in Bucket::ALL {
            for hit in resp.bucket(b) { assert_eq!(hit.section, Some(b.section())); }
        }
    }

    #[test]
    fn each_bucket_is_normalized_on_its_own() {
        let r = retriever(Strategy::Exact);
        let resp = r.search(&SearchRequest { k_patterns: 3, ..SearchRequest::new("button") }).expect("search");
        assert_eq!(resp.components.api[0].score, 1.0);
        assert_eq!(resp.components.usage[0].score, 1.0);
        let scores: Vec<f64> = resp.patterns.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![1.0, 0.5, 0.0]);
        let raws: Vec<f64> = resp.patterns.iter().map(|h| h.raw_rank).collect();
        assert_eq!(raws, vec![-3.0, -2.0, -1.0]);
    }

    #[test]
    fn zero_and_negative_caps_skip_the_query() {
        let r = retriever(Strategy::Exact);
        let req = SearchRequest { q: "button".into(), k_components: 0, k_patterns: -3, k_typedoc: 2 };
        let resp = r.search(&req).expect("search");
        assert!(resp.components.api.is_empty() && resp.components.usage.is_empty() && resp.patterns.is_empty());
        assert_eq!(resp.typedoc.len(), 1);
        assert_eq!(*r.index().calls.lock().expect("lock"), vec![(Some(Section::Typedoc), 2)]);
    }

    #[test]
    fn hits_carry_preview_and_length() {
        let r = retriever(Strategy::Exact).with_preview_chars(10);
        let resp = r.search(&SearchRequest::new("props")).expect("search");
        let hit = &resp.typedoc[0];
        assert_eq!(hit.text_len, "button props".len());
        assert_eq!(hit.text_preview, "tton **props**");
        assert_eq!(hit.title, "doc 6");
    }

    #[test]
    fn approximate_classifies_by_url_in_one_query() {
        let r = retriever(Strategy::Approximate);
        let req = SearchRequest { q: "button".into(), k_components: 2, k_patterns: 10, k_typedoc: 3 };
        let resp = r.search(&req).expect("search");
        assert_eq!(*r.index().calls.lock().expect("lock"), vec![(None, 102)]);
        // the odd page is stored as a pattern but its URL puts it in the api bucket
        let api: Vec<_> = resp.components.api.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(api, ["https://docs.example/components/button/?tabId=api", "https://docs.example/components/odd/?tabId=api"]);
        assert_eq!(resp.components.api[1].section, Some(Section::ComponentsApi));
        assert_eq!(resp.components.usage.len(), 1);
        assert_eq!(resp.patterns.len(), 3);
        assert_eq!(resp.typedoc.len(), 1);
    }

    #[test]
    fn approximate_oversamples_with_a_floor() {
        let r = retriever(Strategy::Approximate);
        r.search(&SearchRequest { q: "button".into(), k_components: 1, k_patterns: 1, k_typedoc: 1 }).expect("search");
        r.search(&SearchRequest { q: "button".into(), k_components: 5, k_patterns: 5, k_typedoc: 5 }).expect("search");
        r.search(&SearchRequest { q: "button".into(), k_components: 0, k_patterns: 0, k_typedoc: -1 }).expect("search");
        assert_eq!(*r.index().calls.lock().expect("lock"), vec![(None, 50), (None, 120)]);
    }

    #[test]
    fn classify_url_mirrors_section_rules() {
        let c = Canonicalizer::new("docs.example");
        assert_eq!(classify_url(&c, "https://docs.example/components/x/?tabId=api"), Some(Bucket::ComponentsApi));
        assert_eq!(classify_url(&c, "https://docs.example/components/x/?tabId=usage#a"), Some(Bucket::ComponentsUsage));
        assert_eq!(classify_url(&c, "https://docs.example/components/x/?tabId=api&example=1"), None);
        assert_eq!(classify_url(&c, "https://docs.example/components/x/"), None);
        assert_eq!(classify_url(&c, "https://docs.example/patterns/x/"), Some(Bucket::Patterns));
        assert_eq!(classify_url(&c, "TYPEDOC://x.md"), Some(Bucket::Typedoc));
        assert_eq!(classify_url(&c, "https://elsewhere.example/patterns/x/"), None);
    }

    #[test]
    fn page_lookup_with_typedoc_fallback() {
        let index = FakeIndex::default().add("guides/intro.md", Section::Typedoc, "intro");
        let r = BucketedRetriever::new(index);
        let found = r.page("typedoc://guides/intro.md").expect("page");
        assert_eq!(found.page().map(|p| p.url.as_str()), Some("guides/intro.md"));
        assert_eq!(r.page("https://nowhere/").expect("page"), PageResult::not_found("https://nowhere/"));
    }

    #[test]
    fn strategy_names() {
        assert_eq!("exact".parse::<Strategy>().unwrap(), Strategy::Exact);
        assert_eq!(" Approximate ".parse::<Strategy>().unwrap(), Strategy::Approximate);
        assert!("fuzzy".parse::<Strategy>().is_err());
    }
}
