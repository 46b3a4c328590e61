use serde::{Deserialize, Serialize};

/// Author value used when no author could be determined.
pub const UNKNOWN_AUTHOR: &str = "Autor desconhecido";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "autor", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "link_download")]
    pub download_link: Option<String>,
    #[serde(rename = "imagem_capa")]
    pub cover_image: Option<String>,
    #[serde(rename = "sentimentos", default)]
    pub sentiments: Vec<String>,
    #[serde(
        rename = "traducao_falhou",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub translation_failed: bool,
}

impl BookRecord {
    pub fn new(title: String) -> Self {
        Self {
            title,
            description: String::new(),
            author: None,
            download_link: None,
            cover_image: None,
            sentiments: Vec::new(),
            translation_failed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(rename = "livros")]
    pub books: Vec<BookRecord>,
}

/// An author listed on the author index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorEntry {
    pub name: String,
    pub page_url: Option<String>,
}
