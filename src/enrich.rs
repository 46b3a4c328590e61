use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::config::GeminiConfig;
use crate::formats::UNKNOWN_AUTHOR;
use crate::gemini::{self, GenerateReply};

pub const DEFAULT_QUOTA_DELAY: Duration = Duration::from_secs(60);
pub const MAX_SENTIMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentKind {
    SentimentClassification,
    AuthorInference,
    Translation,
}

impl EnrichmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SentimentClassification => "sentiment_classification",
            Self::AuthorInference => "author_inference",
            Self::Translation => "translation",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum EnrichmentRequest<'a> {
    Sentiments {
        title: &'a str,
        description: &'a str,
    },
    Author {
        title: &'a str,
        description: &'a str,
    },
    Translation {
        text: &'a str,
        target_language: &'a str,
    },
}

impl EnrichmentRequest<'_> {
    pub fn kind(&self) -> EnrichmentKind {
        match self {
            Self::Sentiments { .. } => EnrichmentKind::SentimentClassification,
            Self::Author { .. } => EnrichmentKind::AuthorInference,
            Self::Translation { .. } => EnrichmentKind::Translation,
        }
    }

    fn prompt(&self) -> String {
        match self {
            Self::Sentiments { title, description } => format!(
                "Classifique esse livro em até 3 sentimentos baseando-se no título e descrição. \
Os sentimentos podem incluir:\n\
- Felicidade → livros interessantes\n\
- Raiva → livros de terapias alternativas\n\
- Paixão → livros de romance\n\
- Tristeza → livros de superação pessoal\n\
Você pode inventar novos sentimentos se fizer sentido com o conteúdo.\n\
\n\
Título: {title}\n\
Descrição: {description}\n\
\n\
Responda apenas com uma lista JSON:\n\
[\"sent1\", \"sent2\", \"sent3\"]\n"
            ),
            Self::Author { title, description } => format!(
                "Quem é o autor do livro abaixo?\n\
\n\
Título: {title}\n\
Descrição: {description}\n\
\n\
Responda apenas com o nome do autor, sem comentários. \
Se não souber, responda exatamente: {UNKNOWN_AUTHOR}\n"
            ),
            Self::Translation {
                text,
                target_language,
            } => format!(
                "Traduza o texto abaixo para o idioma de código \"{target_language}\".\n\
Não resuma e não adicione comentários. Responda apenas com a tradução.\n\
\n\
{text}\n"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentimentOutcome {
    Classified(Vec<String>),
    /// The service answered but no bracketed string list could be parsed.
    Unparsed,
    Failed,
    RateLimitExhausted,
}

impl SentimentOutcome {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            Self::Classified(tags) => tags,
            Self::Unparsed | Self::Failed | Self::RateLimitExhausted => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorOutcome {
    Inferred(String),
    /// The service answered with an empty text.
    Unknown,
    Failed,
    RateLimitExhausted,
}

impl AuthorOutcome {
    pub fn into_author(self) -> String {
        match self {
            Self::Inferred(author) => author,
            Self::Unknown | Self::Failed | Self::RateLimitExhausted => UNKNOWN_AUTHOR.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    Failed,
    RateLimitExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentResult {
    Sentiments(SentimentOutcome),
    Author(AuthorOutcome),
    Translation(TranslationOutcome),
}

/// How long to wait on quota-exceeded replies.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Used when the provider does not send a usable `retryDelay`.
    pub default_delay: Duration,
    /// Ceiling on the cumulative wait of one call; `None` retries forever.
    pub max_total_wait: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            default_delay: DEFAULT_QUOTA_DELAY,
            max_total_wait: Some(Duration::from_secs(900)),
        }
    }
}

pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

enum Backend {
    Noop,
    Gemini {
        client: reqwest::blocking::Client,
        endpoint: String,
        api_key: String,
    },
}

enum CallOutcome {
    Text(String),
    Disabled,
    Failed,
    RateLimitExhausted,
}

/// Client for the text-generation service behind every enrichment.
///
/// Calls never fail: transport faults and unexpected statuses degrade to the
/// empty or sentinel result of the request kind, and quota-exceeded replies
/// are absorbed by blocking and retrying.
pub struct EnrichmentClient {
    backend: Backend,
    policy: BackoffPolicy,
    sleeper: Sleeper,
}

impl EnrichmentClient {
    pub fn gemini(config: &GeminiConfig, policy: BackoffPolicy) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("bookharvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build enrichment http client")?;

        Ok(Self {
            backend: Backend::Gemini {
                client,
                endpoint: gemini::generate_content_endpoint(&config.base_url, &config.model),
                api_key: config.api_key.clone(),
            },
            policy,
            sleeper: Arc::new(std::thread::sleep),
        })
    }

    /// A client that never calls out: no sentiments, unknown author, and the
    /// input returned as its own translation.
    pub fn noop() -> Self {
        Self {
            backend: Backend::Noop,
            policy: BackoffPolicy::default(),
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// Replaces the function used to wait out quota-exceeded replies.
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn enrich(&self, request: EnrichmentRequest<'_>) -> EnrichmentResult {
        match request {
            EnrichmentRequest::Sentiments { title, description } => {
                EnrichmentResult::Sentiments(self.classify_sentiments(title, description))
            }
            EnrichmentRequest::Author { title, description } => {
                EnrichmentResult::Author(self.infer_author(title, description))
            }
            EnrichmentRequest::Translation {
                text,
                target_language,
            } => EnrichmentResult::Translation(self.translate(text, target_language)),
        }
    }

    pub fn classify_sentiments(&self, title: &str, description: &str) -> SentimentOutcome {
        let request = EnrichmentRequest::Sentiments { title, description };
        match self.call(request.kind(), &request.prompt()) {
            CallOutcome::Text(text) => match parse_sentiment_list(&text) {
                Some(tags) => SentimentOutcome::Classified(tags),
                None => {
                    tracing::warn!(response = %text, "no sentiment list in response");
                    SentimentOutcome::Unparsed
                }
            },
            CallOutcome::Disabled => SentimentOutcome::Classified(Vec::new()),
            CallOutcome::Failed => SentimentOutcome::Failed,
            CallOutcome::RateLimitExhausted => SentimentOutcome::RateLimitExhausted,
        }
    }

    pub fn infer_author(&self, title: &str, description: &str) -> AuthorOutcome {
        let request = EnrichmentRequest::Author { title, description };
        match self.call(request.kind(), &request.prompt()) {
            CallOutcome::Text(text) => {
                let author = text.trim();
                if author.is_empty() {
                    AuthorOutcome::Unknown
                } else {
                    AuthorOutcome::Inferred(author.to_owned())
                }
            }
            CallOutcome::Disabled => AuthorOutcome::Unknown,
            CallOutcome::Failed => AuthorOutcome::Failed,
            CallOutcome::RateLimitExhausted => AuthorOutcome::RateLimitExhausted,
        }
    }

    pub fn translate(&self, text: &str, target_language: &str) -> TranslationOutcome {
        let request = EnrichmentRequest::Translation {
            text,
            target_language,
        };
        match self.call(request.kind(), &request.prompt()) {
            CallOutcome::Text(translated) if !translated.trim().is_empty() => {
                TranslationOutcome::Translated(translated.trim().to_owned())
            }
            CallOutcome::Text(_) => {
                tracing::warn!("translation output is empty");
                TranslationOutcome::Failed
            }
            CallOutcome::Disabled => TranslationOutcome::Translated(text.to_owned()),
            CallOutcome::Failed => TranslationOutcome::Failed,
            CallOutcome::RateLimitExhausted => TranslationOutcome::RateLimitExhausted,
        }
    }

    fn call(&self, kind: EnrichmentKind, prompt: &str) -> CallOutcome {
        let Backend::Gemini {
            client,
            endpoint,
            api_key,
        } = &self.backend
        else {
            return CallOutcome::Disabled;
        };

        let mut waited = Duration::ZERO;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tracing::debug!(kind = kind.as_str(), attempt, "enrichment request");

            match gemini::generate_content(client, endpoint, api_key, prompt) {
                Ok(GenerateReply::Text(text)) => return CallOutcome::Text(text),
                Ok(GenerateReply::QuotaExceeded { retry_after }) => {
                    let delay = retry_after.unwrap_or(self.policy.default_delay);
                    if let Some(max) = self.policy.max_total_wait
                        && waited.saturating_add(delay) > max
                    {
                        tracing::warn!(
                            kind = kind.as_str(),
                            attempts = attempt,
                            waited_ms = waited.as_millis() as u64,
                            max_wait_ms = max.as_millis() as u64,
                            "quota still exceeded; giving up"
                        );
                        return CallOutcome::RateLimitExhausted;
                    }

                    tracing::info!(
                        kind = kind.as_str(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "quota exceeded; waiting before retry"
                    );
                    (self.sleeper)(delay);
                    waited = waited.saturating_add(delay);
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    tracing::warn!(kind = kind.as_str(), error = %error, "enrichment call failed");
                    return CallOutcome::Failed;
                }
            }
        }
    }
}

/// Pulls the first bracketed list out of a model reply, ignoring code fences
/// and surrounding prose. Returns `None` when there is no list or it is not a
/// list of strings.
pub fn parse_sentiment_list(text: &str) -> Option<Vec<String>> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('[')?;
    let end = start + cleaned[start..].find(']')?;
    let inner = cleaned[start + 1..end].trim();

    let mut tags: Vec<String> = serde_json::from_str(&format!("[{inner}]")).ok()?;
    if tags.len() > MAX_SENTIMENTS {
        tracing::debug!(count = tags.len(), "truncating sentiment list");
        tags.truncate(MAX_SENTIMENTS);
    }
    Some(tags)
}
