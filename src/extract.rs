use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SelectorConfig;
use crate::formats::{AuthorEntry, BookRecord, UNKNOWN_AUTHOR};
use crate::normalize::{normalize_link, normalize_name, resolve_image_url};

/// Compiled selectors for one catalog layout.
#[derive(Debug)]
pub struct CatalogSelectors {
    entry: Selector,
    title: Selector,
    description: Selector,
    download: Selector,
    read: Selector,
    image: Selector,
    author_entry: Selector,
    author_name: Selector,
    author_link: Selector,
}

impl CatalogSelectors {
    pub fn new(config: &SelectorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            entry: parse_selector(&config.entry)?,
            title: parse_selector(&config.title)?,
            description: parse_selector(&config.description)?,
            download: parse_selector(&config.download)?,
            read: parse_selector(&config.read)?,
            image: parse_selector(&config.image)?,
            author_entry: parse_selector(&config.author_entry)?,
            author_name: parse_selector(&config.author_name)?,
            author_link: parse_selector(&config.author_link)?,
        })
    }
}

fn parse_selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse css selector {css:?}: {err}"))
}

#[derive(Debug, Default)]
pub struct PageExtraction {
    pub records: Vec<BookRecord>,
    /// Entries without a title element.
    pub skipped: usize,
    /// Entries whose markup could not be turned into a record.
    pub failed: usize,
}

pub struct Extractor<'a> {
    selectors: &'a CatalogSelectors,
    origin: &'a str,
}

impl<'a> Extractor<'a> {
    pub fn new(selectors: &'a CatalogSelectors, origin: &'a str) -> Self {
        Self { selectors, origin }
    }

    /// Extracts every catalog entry of a page, in markup order.
    ///
    /// Entries are isolated from each other: a missing title skips the entry
    /// and a malformed entry is logged and dropped, without affecting the
    /// entries that follow.
    pub fn extract_page(&self, html: &str, limit: Option<usize>) -> PageExtraction {
        let document = Html::parse_document(html);
        let mut page = PageExtraction::default();

        for (index, entry) in document.select(&self.selectors.entry).enumerate() {
            if limit.is_some_and(|limit| page.records.len() >= limit) {
                break;
            }

            match self.extract_entry(entry) {
                Ok(Some(record)) => page.records.push(record),
                Ok(None) => {
                    tracing::debug!(entry = index, "catalog entry has no title; skipping");
                    page.skipped += 1;
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    tracing::warn!(entry = index, error = %error, "failed to process catalog entry");
                    page.failed += 1;
                }
            }
        }

        page
    }

    /// Returns `Ok(None)` when the entry has no title element.
    pub fn extract_entry(&self, entry: ElementRef<'_>) -> anyhow::Result<Option<BookRecord>> {
        let Some(title_node) = entry.select(&self.selectors.title).next() else {
            return Ok(None);
        };

        let title = normalize_name(&text_content(&title_node));
        if title.is_empty() {
            anyhow::bail!("title element is empty after normalization");
        }

        let mut record = BookRecord::new(title);

        record.description = entry
            .select(&self.selectors.description)
            .nth(1)
            .map(|node| text_content(&node))
            .unwrap_or_default();

        record.download_link = first_href(entry, &self.selectors.download)
            .or_else(|| first_href(entry, &self.selectors.read))
            .map(|href| normalize_link(&href));

        record.cover_image = entry
            .select(&self.selectors.image)
            .next()
            .and_then(|img| {
                let value = img.value();
                value
                    .attr("data-src")
                    .filter(|src| !src.trim().is_empty())
                    .or_else(|| value.attr("src"))
            })
            .and_then(|src| resolve_image_url(src, self.origin));

        Ok(Some(record))
    }

    /// Lists the authors on an author index page. Links are resolved against
    /// `page_url`.
    pub fn extract_authors(&self, html: &str, page_url: &str) -> anyhow::Result<Vec<AuthorEntry>> {
        let base = Url::parse(page_url).with_context(|| format!("parse index url: {page_url}"))?;
        let document = Html::parse_document(html);

        let mut authors = Vec::new();
        for entry in document.select(&self.selectors.author_entry) {
            let name = entry
                .select(&self.selectors.author_name)
                .next()
                .map(|node| normalize_name(&text_content(&node)))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());

            let page_url = first_href(entry, &self.selectors.author_link).and_then(|href| {
                match base.join(&normalize_link(&href)) {
                    Ok(url) => Some(url.to_string()),
                    Err(err) => {
                        tracing::warn!(author = %name, href = %href, %err, "unresolvable author link");
                        None
                    }
                }
            });

            authors.push(AuthorEntry { name, page_url });
        }

        Ok(authors)
    }
}

fn first_href(entry: ElementRef<'_>, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .filter_map(|node| node.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_owned)
}

fn text_content(node: &ElementRef<'_>) -> String {
    node.text().collect::<String>().trim().to_owned()
}
