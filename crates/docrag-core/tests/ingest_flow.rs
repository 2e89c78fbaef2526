use std::fs;
use std::io::Write;
use std::path::Path;

use docrag_core::source::read_page_records;
use docrag_core::{Canonicalizer, DataProcessor, Section};
use tempfile::TempDir;

const PAGES: &str = r#"{"format":"json-pages-1.0","id":"pages","title":"All Pages"}
{"url":"https://docs.example/components/button/?tabId=api","title":"Button","text":"Button API. Properties: variant."}
{"url":"https://docs.example/components/button/?tabId=api#slots","title":"Button","text":"Button API. Properties: variant, iconName, loading."}
{"url":"https://docs.example/components/button/?tabId=playground","title":"Button","text":"Playground noise"}
{"url":"https://docs.example/patterns/general/errors/","title":"","text":"Error messages pattern."}
this line is broken
"#;

const EXTRA: &str = r#"{"url":"https://docs.example/components/button/?tabId=usage","title":"Button usage","text":"Use buttons for actions."}
{"url":"https://docs.example/components/button/?tabId=usage&example=primary","title":"x","text":"example noise"}
{"url":"","title":"empty","text":"no url"}
"#;

fn write_crawl(dir: &Path) {
    fs::create_dir_all(dir.join("pages")).unwrap();
    fs::write(dir.join("pages/pages.jsonl"), PAGES).unwrap();
    fs::write(dir.join("pages/extraPages.jsonl"), EXTRA).unwrap();
}

#[test]
fn directory_source_with_typedoc() {
    let tmp = TempDir::new().unwrap();
    let crawl = tmp.path().join("crawl");
    write_crawl(&crawl);
    let typedoc = tmp.path().join("typedoc");
    fs::create_dir_all(typedoc.join("interfaces")).unwrap();
    fs::write(typedoc.join("interfaces/button-props.md"), "# ButtonProps\n\nvariant: string\n").unwrap();
    fs::write(typedoc.join("interfaces/blank.md"), "   \n").unwrap();
    fs::write(typedoc.join("notes.txt"), "ignored").unwrap();

    let processor = DataProcessor::new(Canonicalizer::new("docs.example"));
    let out = processor.process_source(&crawl, Some(&typedoc)).expect("process");

    let urls: Vec<_> = out.documents.iter().map(|d| d.canonical_url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://docs.example/components/button/?tabId=api",
            "https://docs.example/components/button/?tabId=usage",
            "https://docs.example/patterns/general/errors/",
            "typedoc://interfaces/button-props.md",
        ]
    );
    let api = &out.documents[0];
    assert!(api.text.ends_with("loading."), "longest variant wins: {}", api.text);
    assert_eq!(out.documents[2].title, "https://docs.example/patterns/general/errors/");
    assert_eq!(out.documents[3].title, "TypeDoc: Button Props");
    assert_eq!(out.documents[3].section, Section::Typedoc);

    assert_eq!(out.stats.kept, 4);
    assert_eq!(out.stats.dropped, 2);
    assert_eq!(out.stats.skipped, 2);
    assert_eq!(out.stats.malformed, 1);
    assert_eq!(out.stats.section(Section::ComponentsApi), 1);
    assert_eq!(out.stats.section(Section::Typedoc), 1);
}

#[test]
fn wacz_archive_source() {
    let tmp = TempDir::new().unwrap();
    let wacz = tmp.path().join("crawl.wacz");
    let mut zip = zip::ZipWriter::new(fs::File::create(&wacz).unwrap());
    let opts = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("pages/pages.jsonl", opts).unwrap();
    zip.write_all(PAGES.as_bytes()).unwrap();
    zip.finish().unwrap();

    let records = read_page_records(&wacz).expect("read");
    assert_eq!(records.records.len(), 4);
    assert_eq!(records.malformed, 1);
}

#[test]
fn source_without_page_files_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let err = read_page_records(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("pages.jsonl"), "{err}");

    let wacz = tmp.path().join("empty.wacz");
    let mut zip = zip::ZipWriter::new(fs::File::create(&wacz).unwrap());
    zip.start_file("datapackage.json", zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)).unwrap();
    zip.write_all(b"{}").unwrap();
    zip.finish().unwrap();
    assert!(read_page_records(&wacz).is_err());
}
