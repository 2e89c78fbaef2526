//! Raw record readers: crawled page records (JSONL in a directory or a WACZ
//! archive) and TypeDoc Markdown trees.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Error;
use crate::types::{RawRecord, Section};

pub const PAGE_FILES: [&str; 2] = ["pages/pages.jsonl", "pages/extraPages.jsonl"];
pub const TYPEDOC_SCHEME: &str = "typedoc://";

#[derive(Debug, Default)]
pub struct PageRecords {
    pub records: Vec<RawRecord>,
    /// Lines that were not valid JSON.
    pub malformed: usize,
}

#[derive(Debug, Deserialize)]
struct JsonlPage {
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Reads page records from an extracted crawl directory or a `.wacz` archive.
///
/// Fails when neither page file is present; individual bad lines are skipped.
pub fn read_page_records(src: &Path) -> Result<PageRecords> {
    if src.is_dir() { read_dir(src) } else { read_wacz(src) }
}

fn read_dir(src: &Path) -> Result<PageRecords> {
    let mut out = PageRecords::default();
    let mut found_any = false;
    for name in PAGE_FILES {
        let path = src.join(name);
        if !path.is_file() { continue; }
        load_jsonl(BufReader::new(File::open(&path)?), &mut out)?;
        found_any = true;
    }
    if !found_any { return Err(Error::MissingPageRecords(src.to_path_buf()).into()); }
    Ok(out)
}

fn read_wacz(src: &Path) -> Result<PageRecords> {
    let mut archive = zip::ZipArchive::new(File::open(src)?)?;
    let mut out = PageRecords::default();
    let mut found_any = false;
    for name in PAGE_FILES {
        match archive.by_name(name) {
            Ok(entry) => {
                load_jsonl(BufReader::new(entry), &mut out)?;
                found_any = true;
            }
            Err(zip::result::ZipError::FileNotFound) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if !found_any { return Err(Error::MissingPageRecords(src.to_path_buf()).into()); }
    Ok(out)
}

fn load_jsonl<R: BufRead>(reader: R, out: &mut PageRecords) -> std::io::Result<()> {
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if line.trim().is_empty() { continue; }
        match serde_json::from_str::<JsonlPage>(&line) {
            Ok(JsonlPage { url: Some(url), title, text }) => out.records.push(RawRecord {
                url,
                title: title.unwrap_or_default(),
                text: text.unwrap_or_default(),
                section: None,
            }),
            // header lines and other objects without a url
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "skipping malformed page record");
                out.malformed += 1;
            }
        }
    }
    Ok(())
}

/// Markdown files under `root` as TypeDoc records. A missing root yields nothing.
pub fn read_typedoc_markdown(root: &Path) -> Vec<RawRecord> {
    if !root.is_dir() {
        warn!(path = %root.display(), "typedoc directory not found, skipping");
        return Vec::new();
    }
    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "md"))
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) => { warn!(path = %path.display(), error = %e, "unreadable markdown file"); continue; }
        };
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let rel_posix = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        let stem = path.file_stem().map(|s| s.to_string_lossy().replace('-', " ")).unwrap_or_default();
        docs.push(RawRecord {
            url: format!("{TYPEDOC_SCHEME}{rel_posix}"),
            title: format!("TypeDoc: {}", title_case(&stem)),
            text: String::from_utf8_lossy(&bytes).into_owned(),
            section: Some(Section::Typedoc),
        });
    }
    docs
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if prev_alpha { out.extend(ch.to_lowercase()); } else { out.extend(ch.to_uppercase()); }
        prev_alpha = ch.is_alphabetic();
    }
    out
}
