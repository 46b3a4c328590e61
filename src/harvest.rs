use std::cell::Cell;
use std::time::Duration;

use anyhow::Context as _;

use crate::enrich::EnrichmentClient;
use crate::extract::{CatalogSelectors, Extractor};
use crate::fetch::PageFetcher;
use crate::formats::{AuthorEntry, BookRecord};
use crate::pipeline::{EnrichmentStats, Pipeline};

#[derive(Debug, Default)]
pub struct PageHarvest {
    pub records: Vec<BookRecord>,
    pub status: u16,
    pub skipped: usize,
    pub failed: usize,
    pub stats: EnrichmentStats,
}

/// Turns catalog pages into enriched records.
pub struct Harvester {
    fetcher: PageFetcher,
    selectors: CatalogSelectors,
    origin: String,
    client: EnrichmentClient,
    pipeline: Pipeline,
    entry_delay: Duration,
    enriched_any: Cell<bool>,
}

impl Harvester {
    pub fn new(
        fetcher: PageFetcher,
        selectors: CatalogSelectors,
        origin: String,
        client: EnrichmentClient,
        pipeline: Pipeline,
        entry_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            selectors,
            origin,
            client,
            pipeline,
            entry_delay,
            enriched_any: Cell::new(false),
        }
    }

    /// Harvests up to `limit` entries of one page, in markup order.
    ///
    /// A non-200 page yields no records. When `author` is given it is
    /// recorded on every book and author inference is skipped for them.
    pub fn harvest(
        &self,
        page_url: &str,
        limit: Option<usize>,
        author: Option<&str>,
    ) -> anyhow::Result<PageHarvest> {
        let page = self.fetcher.fetch(page_url)?;
        if !page.is_ok() {
            tracing::warn!(url = %page_url, status = page.status, "page not available; no entries");
            return Ok(PageHarvest {
                status: page.status,
                ..PageHarvest::default()
            });
        }

        let extractor = Extractor::new(&self.selectors, &self.origin);
        let extracted = extractor.extract_page(&page.body, limit);
        tracing::info!(
            url = %page_url,
            entries = extracted.records.len(),
            skipped = extracted.skipped,
            failed = extracted.failed,
            "extracted catalog entries"
        );

        let mut harvest = PageHarvest {
            records: Vec::with_capacity(extracted.records.len()),
            status: page.status,
            skipped: extracted.skipped,
            failed: extracted.failed,
            stats: EnrichmentStats::default(),
        };

        for mut record in extracted.records {
            if let Some(author) = author {
                record.author = Some(author.to_owned());
            }

            self.pace_enrichment();
            let record = self.pipeline.run(&self.client, record, &mut harvest.stats);
            tracing::debug!(
                title = %record.title,
                sentiments = ?record.sentiments,
                "entry enriched"
            );
            harvest.records.push(record);
        }

        Ok(harvest)
    }

    /// Keeps `entry_delay` between the enrichment of successive entries,
    /// across pages.
    fn pace_enrichment(&self) {
        if self.pipeline.stages().is_empty() || self.entry_delay.is_zero() {
            return;
        }
        if self.enriched_any.replace(true) {
            std::thread::sleep(self.entry_delay);
        }
    }

    /// Reads the author index. Unlike catalog pages, an unavailable index is
    /// an error.
    pub fn authors(&self, index_url: &str) -> anyhow::Result<Vec<AuthorEntry>> {
        let page = self.fetcher.fetch(index_url)?;
        if !page.is_ok() {
            anyhow::bail!("author index returned HTTP {}: {index_url}", page.status);
        }
        Extractor::new(&self.selectors, &self.origin)
            .extract_authors(&page.body, index_url)
            .context("extract author index")
    }
}
