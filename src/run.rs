use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::{AuthorsArgs, CommonArgs, EnrichArgs, LlmEngine, PagesArgs};
use crate::config::{
    DEFAULT_AUTHOR_INDEX, DEFAULT_BOOKS_PER_AUTHOR, DEFAULT_ENTRY_DELAY_MS, DEFAULT_MAX_BOOKS,
    DEFAULT_ORIGIN, DEFAULT_PAGES, FileConfig, GeminiConfig,
};
use crate::enrich::{BackoffPolicy, EnrichmentClient};
use crate::extract::CatalogSelectors;
use crate::fetch::PageFetcher;
use crate::formats::{RunResult, UNKNOWN_AUTHOR};
use crate::harvest::{Harvester, PageHarvest};
use crate::pipeline::{EnrichmentStats, Pipeline, PipelineOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub pages_unavailable: usize,
    pub books: usize,
    pub entries_skipped: usize,
    pub entries_failed: usize,
    pub authors: usize,
    pub authors_skipped: usize,
    pub enrichment: EnrichmentStats,
}

impl RunSummary {
    fn absorb(&mut self, harvest: &PageHarvest) {
        self.pages += 1;
        if harvest.status != 200 {
            self.pages_unavailable += 1;
        }
        self.entries_skipped += harvest.skipped;
        self.entries_failed += harvest.failed;
        self.enrichment.add(&harvest.stats);
    }

    fn log(&self) {
        tracing::info!(
            books = self.books,
            pages = self.pages,
            pages_unavailable = self.pages_unavailable,
            authors = self.authors,
            authors_skipped = self.authors_skipped,
            entries_skipped = self.entries_skipped,
            entries_failed = self.entries_failed,
            translation_failures = self.enrichment.translation_failures,
            sentiments_unparsed = self.enrichment.sentiments_unparsed,
            sentiments_failed = self.enrichment.sentiments_failed,
            rate_limit_exhausted = self.enrichment.rate_limit_exhausted,
            "run summary"
        );
    }
}

/// Harvests each page in order and concatenates the results.
pub fn collect_pages(
    harvester: &Harvester,
    pages: &[String],
    max_per_page: Option<usize>,
) -> (RunResult, RunSummary) {
    let mut result = RunResult::default();
    let mut summary = RunSummary::default();

    for (index, url) in pages.iter().enumerate() {
        tracing::info!(url = %url, page = index + 1, total = pages.len(), "harvesting page");
        match harvester.harvest(url, max_per_page, None) {
            Ok(harvest) => {
                summary.absorb(&harvest);
                result.books.extend(harvest.records);
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(url = %url, error = %error, "page fetch failed; continuing");
                summary.pages += 1;
                summary.pages_unavailable += 1;
            }
        }
    }

    summary.books = result.books.len();
    (result, summary)
}

/// Walks the author index, taking at most `books_per_author` books from each
/// author page.
///
/// The cap is checked before each author: an author's batch is always kept
/// whole, so the result can exceed `max_books` by less than
/// `books_per_author`.
pub fn collect_authors(
    harvester: &Harvester,
    index_url: &str,
    books_per_author: usize,
    max_books: usize,
) -> anyhow::Result<(RunResult, RunSummary)> {
    let authors = harvester.authors(index_url).context("read author index")?;
    tracing::info!(url = %index_url, authors = authors.len(), "author index loaded");

    let mut result = RunResult::default();
    let mut summary = RunSummary::default();

    for author in &authors {
        if result.books.len() >= max_books {
            tracing::info!(collected = result.books.len(), max_books, "book cap reached");
            break;
        }
        summary.authors += 1;

        let Some(page_url) = author.page_url.as_deref() else {
            tracing::warn!(author = %author.name, "author has no page link; skipping");
            summary.authors_skipped += 1;
            continue;
        };

        // The fallback name is not an author from markup; leave it to inference.
        let known_author = (author.name != UNKNOWN_AUTHOR).then_some(author.name.as_str());

        tracing::info!(author = %author.name, url = %page_url, "harvesting author");
        match harvester.harvest(page_url, Some(books_per_author), known_author) {
            Ok(harvest) => {
                if harvest.status != 200 {
                    summary.authors_skipped += 1;
                }
                summary.absorb(&harvest);
                result.books.extend(harvest.records);
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::warn!(author = %author.name, error = %error, "author page failed; skipping");
                summary.authors_skipped += 1;
            }
        }
    }

    summary.books = result.books.len();
    Ok((result, summary))
}

pub fn pages(args: PagesArgs) -> anyhow::Result<()> {
    ensure_output_available(&args.common)?;
    let file = FileConfig::load_optional(args.common.config.as_deref())?;
    let pages = if !args.pages.is_empty() {
        args.pages.clone()
    } else if let Some(pages) = file.pages.clone() {
        pages
    } else {
        DEFAULT_PAGES.iter().map(|url| (*url).to_owned()).collect()
    };
    if pages.is_empty() {
        anyhow::bail!("no catalog pages configured");
    }

    let harvester = build_harvester(&args.common, &file)?;
    let (result, summary) = collect_pages(&harvester, &pages, args.max_per_page);
    finish(&args.common, &result, &summary)
}

pub fn authors(args: AuthorsArgs) -> anyhow::Result<()> {
    ensure_output_available(&args.common)?;
    let file = FileConfig::load_optional(args.common.config.as_deref())?;
    let index = args
        .index
        .clone()
        .or_else(|| file.author_index.clone())
        .unwrap_or_else(|| DEFAULT_AUTHOR_INDEX.to_owned());
    let books_per_author = args
        .books_per_author
        .or(file.books_per_author)
        .unwrap_or(DEFAULT_BOOKS_PER_AUTHOR);
    let max_books = args
        .max_books
        .or(file.max_books)
        .unwrap_or(DEFAULT_MAX_BOOKS);
    if books_per_author == 0 || max_books == 0 {
        anyhow::bail!("--books-per-author and --max-books must be > 0");
    }

    let harvester = build_harvester(&args.common, &file)?;
    let (result, summary) = collect_authors(&harvester, &index, books_per_author, max_books)?;
    finish(&args.common, &result, &summary)
}

fn ensure_output_available(common: &CommonArgs) -> anyhow::Result<()> {
    if Path::new(&common.out).exists() && !common.force {
        anyhow::bail!("output already exists: {} (use --force)", common.out);
    }
    Ok(())
}

fn build_harvester(common: &CommonArgs, file: &FileConfig) -> anyhow::Result<Harvester> {
    let selectors = CatalogSelectors::new(&file.selectors).context("compile selectors")?;
    let origin = common
        .origin
        .clone()
        .or_else(|| file.origin.clone())
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_owned());
    let entry_delay = Duration::from_millis(
        common
            .entry_delay_ms
            .or(file.entry_delay_ms)
            .unwrap_or(DEFAULT_ENTRY_DELAY_MS),
    );

    let client = build_client(&common.enrich)?;
    let pipeline = Pipeline::new(&PipelineOptions {
        translate_to: common.enrich.translate_to.clone(),
        infer_author: common.enrich.infer_author,
        classify_sentiments: !common.enrich.no_sentiments,
    });
    let stages: Vec<&str> = pipeline.stages().iter().map(|stage| stage.name()).collect();
    tracing::info!(
        engine = ?common.enrich.engine,
        stages = ?stages,
        origin = %origin,
        "enrichment pipeline"
    );

    Ok(Harvester::new(
        PageFetcher::new()?,
        selectors,
        origin,
        client,
        pipeline,
        entry_delay,
    ))
}

fn build_client(args: &EnrichArgs) -> anyhow::Result<EnrichmentClient> {
    match args.engine {
        LlmEngine::Noop => Ok(EnrichmentClient::noop()),
        LlmEngine::Gemini => {
            let config = GeminiConfig::from_env()?;
            let policy = BackoffPolicy {
                default_delay: Duration::from_secs(args.default_backoff_secs),
                max_total_wait: (args.max_backoff_secs > 0)
                    .then(|| Duration::from_secs(args.max_backoff_secs)),
            };
            EnrichmentClient::gemini(&config, policy)
        }
    }
}

fn finish(common: &CommonArgs, result: &RunResult, summary: &RunSummary) -> anyhow::Result<()> {
    summary.log();
    let out = Path::new(&common.out);
    crate::output::write_run_result(out, result, common.force).context("write output")?;
    tracing::info!(out = %out.display(), books = result.books.len(), "output written");
    println!("saved {} books to {}", result.books.len(), out.display());
    Ok(())
}
