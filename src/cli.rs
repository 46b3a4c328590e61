use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Harvest a fixed list of catalog pages.
    Pages(PagesArgs),
    /// Walk the author index, harvesting a few books per author.
    Authors(AuthorsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmEngine {
    /// Skip every enrichment call.
    Noop,
    /// Gemini `generateContent` API (reads `GEMINI_API_KEY`).
    Gemini,
}

#[derive(Debug, Args)]
pub struct PagesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Catalog page URL to harvest (repeatable; overrides the config file).
    #[arg(long = "page")]
    pub pages: Vec<String>,

    /// Maximum books taken from each page.
    #[arg(long)]
    pub max_per_page: Option<usize>,
}

#[derive(Debug, Args)]
pub struct AuthorsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Author index URL.
    #[arg(long)]
    pub index: Option<String>,

    /// Maximum books taken from each author page (default: 2).
    #[arg(long)]
    pub books_per_author: Option<usize>,

    /// Stop once this many books have been collected (default: 100).
    #[arg(long)]
    pub max_books: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Output JSON path.
    #[arg(long, default_value = "livros_com_sentimentos.json")]
    pub out: String,

    /// Overwrite the output if it exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// YAML config file (pages, caps, selectors).
    #[arg(long)]
    pub config: Option<String>,

    /// Site origin used to resolve root-relative image paths.
    #[arg(long)]
    pub origin: Option<String>,

    /// Delay between the enrichment of successive books (default: 1500).
    #[arg(long)]
    pub entry_delay_ms: Option<u64>,

    #[command(flatten)]
    pub enrich: EnrichArgs,
}

#[derive(Debug, Args)]
pub struct EnrichArgs {
    /// Enrichment engine.
    #[arg(long, value_enum, default_value_t = LlmEngine::Gemini)]
    pub engine: LlmEngine,

    /// Translate descriptions into this language code before classifying.
    #[arg(long)]
    pub translate_to: Option<String>,

    /// Ask the model for the author of books whose page does not name one.
    #[arg(long, default_value_t = false)]
    pub infer_author: bool,

    /// Skip sentiment classification.
    #[arg(long, default_value_t = false)]
    pub no_sentiments: bool,

    /// Wait used when a quota-exceeded reply has no usable retry hint.
    #[arg(long, default_value_t = 60)]
    pub default_backoff_secs: u64,

    /// Give up on a call after waiting this long for quota (0 = never).
    #[arg(long, default_value_t = 900)]
    pub max_backoff_secs: u64,
}
