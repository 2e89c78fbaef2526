use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docrag_core::config::{Config, Settings};
use docrag_core::{BucketedRetriever, Canonicalizer, SearchRequest, Section, Strategy};
use docrag_text::{build_index, BuildOptions, TantivySearchEngine};

#[derive(Parser)]
#[command(name = "docrag", version, about = "Build and query a documentation search index")]
struct Cli {
	/// Debug-level logging and detailed build statistics.
	#[arg(short, long, global = true)]
	verbose: bool,

	/// Index directory (overrides `data.index_dir`).
	#[arg(long, global = true)]
	index: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Rebuild the index from a crawl directory or .wacz archive.
	Build {
		/// Crawl directory or .wacz archive (overrides `data.source`).
		source: Option<PathBuf>,
		/// Directory of TypeDoc Markdown files.
		#[arg(long)]
		typedoc: Option<PathBuf>,
		/// Documentation domain to keep.
		#[arg(long)]
		domain: Option<String>,
		#[arg(long)]
		no_progress: bool,
	},
	/// Bucketed search, printed as JSON.
	Search {
		q: String,
		#[arg(long, allow_negative_numbers = true)]
		k_components: Option<i64>,
		#[arg(long, allow_negative_numbers = true)]
		k_patterns: Option<i64>,
		#[arg(long, allow_negative_numbers = true)]
		k_typedoc: Option<i64>,
		/// `exact` or `approximate`.
		#[arg(long)]
		strategy: Option<Strategy>,
		#[arg(long)]
		preview_chars: Option<usize>,
	},
	/// Fetch one stored page by URL, printed as JSON.
	Page { url: String },
}

fn init_tracing(verbose: bool) {
	let default = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn open_retriever(settings: &Settings, index_dir: &Path) -> Result<BucketedRetriever<TantivySearchEngine>> {
	let engine = TantivySearchEngine::open(index_dir)?;
	Ok(BucketedRetriever::new(engine)
		.with_strategy(settings.search.strategy)
		.with_preview_chars(settings.search.preview_chars)
		.with_canonicalizer(Canonicalizer::new(settings.canonical.domain.clone())))
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
	let mut settings = config.settings()?;
	let index_dir = cli.index.clone().unwrap_or_else(|| config.resolve(&settings.data.index_dir));
	debug!(index = %index_dir.display(), "resolved index directory");

	match cli.command {
		Command::Build { source, typedoc, domain, no_progress } => {
			let Some(source) = source.or_else(|| settings.data.source.as_deref().map(|s| config.resolve(s))) else {
				bail!("no page-record source given (pass one or set data.source)");
			};
			let typedoc_dir = typedoc.or_else(|| settings.data.typedoc_dir.as_deref().map(|s| config.resolve(s)));
			let domain = domain.unwrap_or(settings.canonical.domain);
			let opts = BuildOptions { source, index_dir: index_dir.clone(), typedoc_dir, canonicalizer: Canonicalizer::new(domain), progress: !no_progress };
			let report = build_index(&opts)?;
			if cli.verbose {
				let s = &report.stats;
				println!("kept: {}", s.kept);
				println!("dropped: {}", s.dropped);
				println!("skipped: {}", s.skipped);
				println!("malformed: {}", s.malformed);
				for section in Section::ALL {
					println!("  {}: {}", section, s.section(section));
				}
				println!("documents in index: {}", report.total_docs);
				if !report.compacted { println!("compaction: skipped after error"); }
			}
			println!("Indexed {} pages -> {}", report.indexed, index_dir.display());
		}
		Command::Search { q, k_components, k_patterns, k_typedoc, strategy, preview_chars } => {
			if let Some(s) = strategy { settings.search.strategy = s; }
			if let Some(n) = preview_chars { settings.search.preview_chars = n; }
			let retriever = open_retriever(&settings, &index_dir)?;
			let req = SearchRequest {
				q,
				k_components: k_components.unwrap_or(settings.search.k_components),
				k_patterns: k_patterns.unwrap_or(settings.search.k_patterns),
				k_typedoc: k_typedoc.unwrap_or(settings.search.k_typedoc),
			};
			let response = retriever.search(&req)?;
			println!("{}", serde_json::to_string_pretty(&response)?);
		}
		Command::Page { url } => {
			let retriever = open_retriever(&settings, &index_dir)?;
			println!("{}", serde_json::to_string_pretty(&retriever.page(&url)?)?);
		}
	}
	Ok(())
}
