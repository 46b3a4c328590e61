use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGIN: &str = "https://www.infolivros.org";
pub const DEFAULT_AUTHOR_INDEX: &str = "https://www.infolivros.org/autores/";
pub const DEFAULT_BOOKS_PER_AUTHOR: usize = 2;
pub const DEFAULT_MAX_BOOKS: usize = 100;
pub const DEFAULT_ENTRY_DELAY_MS: u64 = 1500;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const DEFAULT_PAGES: &[&str] = &[
    "https://www.infolivros.org/livros-pdf-gratis/terapia-alternativa/meditacao/",
    "https://www.infolivros.org/livros-pdf-gratis/terapia-alternativa/ioga/",
    "https://www.infolivros.org/livros-pdf-gratis/superacao-pessoal/auto-estima/",
    "https://www.infolivros.org/livros-pdf-gratis/superacao-pessoal/inteligencia-emocional/",
    "https://www.infolivros.org/livros-pdf-gratis/superacao-pessoal/reflexao/",
    "https://www.infolivros.org/livros-pdf-gratis/arte/fotografia/",
    "https://www.infolivros.org/livros-pdf-gratis/temas-varios/astronomia/",
    "https://www.infolivros.org/livros-pdf-gratis/amor/amor-de-verao/",
    "https://www.infolivros.org/livros-pdf-gratis/amor/romance/",
];

/// CSS selectors describing the catalog markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub entry: String,
    pub title: String,
    pub description: String,
    pub download: String,
    pub read: String,
    pub image: String,
    pub author_entry: String,
    pub author_name: String,
    pub author_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entry: "div.gb-loop-item.caja-pdfs.caja-pdfs-nuevo".to_owned(),
            title: "h3.titulo-caja-pdfs".to_owned(),
            description: "p.descripcion-caja-pdfs".to_owned(),
            download: "a.boton-descarga-caja-pdfs".to_owned(),
            read: "a.boton-leer-caja-pdfs".to_owned(),
            image: "img".to_owned(),
            author_entry: "div.gb-loop-item.caja-autores".to_owned(),
            author_name: "h3".to_owned(),
            author_link: "a[href]".to_owned(),
        }
    }
}

/// Contents of the optional `--config` YAML file. Every field is optional;
/// command line flags take precedence over values set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub origin: Option<String>,
    pub pages: Option<Vec<String>>,
    pub author_index: Option<String>,
    pub books_per_author: Option<usize>,
    pub max_books: Option<usize>,
    pub entry_delay_ms: Option<u64>,
    pub selectors: SelectorConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parse config: {}", path.display()))
    }

    pub fn load_optional(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(Path::new(path)),
            None => Ok(Self::default()),
        }
    }
}

/// Settings for the generative language service used for enrichment.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL` and `GEMINI_BASE_URL`, after
    /// loading a `.env` file from the working directory when one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            return Err(err).context("load .env");
        }

        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY is not set"))?;
        if api_key.trim().is_empty() {
            anyhow::bail!("GEMINI_API_KEY is empty");
        }

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_owned());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_owned());

        Ok(Self {
            base_url,
            model,
            api_key,
            timeout: Duration::from_secs(60),
        })
    }
}
