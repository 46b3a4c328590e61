use crate::enrich::{AuthorOutcome, EnrichmentClient, SentimentOutcome, TranslationOutcome};
use crate::formats::BookRecord;

/// One enrichment step applied to an extracted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Translate { target_language: String },
    InferAuthor,
    ClassifySentiments,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translate { .. } => "translate",
            Self::InferAuthor => "infer_author",
            Self::ClassifySentiments => "classify_sentiments",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub translate_to: Option<String>,
    pub infer_author: bool,
    pub classify_sentiments: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub translation_failures: usize,
    pub authors_unknown: usize,
    pub sentiments_unparsed: usize,
    pub sentiments_failed: usize,
    pub rate_limit_exhausted: usize,
}

impl EnrichmentStats {
    pub fn add(&mut self, other: &Self) {
        self.translation_failures += other.translation_failures;
        self.authors_unknown += other.authors_unknown;
        self.sentiments_unparsed += other.sentiments_unparsed;
        self.sentiments_failed += other.sentiments_failed;
        self.rate_limit_exhausted += other.rate_limit_exhausted;
    }
}

/// Ordered enrichment stages. Translation always runs first so that author
/// inference and classification see the translated description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(options: &PipelineOptions) -> Self {
        let mut stages = Vec::new();
        if let Some(target_language) = options
            .translate_to
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
        {
            stages.push(Stage::Translate {
                target_language: target_language.to_owned(),
            });
        }
        if options.infer_author {
            stages.push(Stage::InferAuthor);
        }
        if options.classify_sentiments {
            stages.push(Stage::ClassifySentiments);
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(
        &self,
        client: &EnrichmentClient,
        mut record: BookRecord,
        stats: &mut EnrichmentStats,
    ) -> BookRecord {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), title = %record.title, "enrichment stage");
            record = apply_stage(stage, client, record, stats);
        }
        record
    }
}

fn apply_stage(
    stage: &Stage,
    client: &EnrichmentClient,
    mut record: BookRecord,
    stats: &mut EnrichmentStats,
) -> BookRecord {
    match stage {
        Stage::Translate { target_language } => {
            if record.description.trim().is_empty() {
                return record;
            }
            tracing::info!(title = %record.title, to = %target_language, "translating description");
            match client.translate(&record.description, target_language) {
                TranslationOutcome::Translated(text) => record.description = text,
                outcome => {
                    if outcome == TranslationOutcome::RateLimitExhausted {
                        stats.rate_limit_exhausted += 1;
                    }
                    tracing::warn!(title = %record.title, "translation failed; keeping original description");
                    stats.translation_failures += 1;
                    record.translation_failed = true;
                }
            }
        }
        Stage::InferAuthor => {
            if record.author.is_some() {
                return record;
            }
            tracing::info!(title = %record.title, "inferring author");
            let outcome = client.infer_author(&record.title, &record.description);
            match outcome {
                AuthorOutcome::Inferred(_) => {}
                AuthorOutcome::RateLimitExhausted => {
                    stats.rate_limit_exhausted += 1;
                    stats.authors_unknown += 1;
                }
                AuthorOutcome::Unknown | AuthorOutcome::Failed => stats.authors_unknown += 1,
            }
            record.author = Some(outcome.into_author());
        }
        Stage::ClassifySentiments => {
            tracing::info!(title = %record.title, "classifying sentiments");
            let outcome = client.classify_sentiments(&record.title, &record.description);
            match outcome {
                SentimentOutcome::Classified(_) => {}
                SentimentOutcome::Unparsed => stats.sentiments_unparsed += 1,
                SentimentOutcome::Failed => stats.sentiments_failed += 1,
                SentimentOutcome::RateLimitExhausted => {
                    stats.rate_limit_exhausted += 1;
                    stats.sentiments_failed += 1;
                }
            }
            record.sentiments = outcome.into_tags();
        }
    }
    record
}
