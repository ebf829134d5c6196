use chrono::NaiveDateTime;
use serde::Serialize;

use crate::locale::Locale;

pub mod frontmatter;
pub mod heading_decorator;
pub mod markdown_renderer;
pub mod typographic;

/// One heading anchor in the rendered document. Only levels 2-4 make it
/// into the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Post metadata as served to listings. The slug is locale-independent;
/// uniqueness holds per (locale, slug), not globally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub slug: String,
    pub title: String,
    pub date: NaiveDateTime,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub reading_time: u32,
    pub locale: Locale,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Locale>,
}

/// A fully rendered post. Owned by the repository, immutable after the
/// startup build.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub metadata: PostMetadata,
    pub html: String,
    pub toc: Vec<TocItem>,
}
