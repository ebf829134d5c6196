use std::fmt;
use std::fmt::Formatter;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages the site publishes in. The default locale never carries a
/// filename or path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Pt,
}

pub const DEFAULT_LOCALE: Locale = Locale::En;

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pt => "pt",
        }
    }

    pub fn parse(code: &str) -> Option<Locale> {
        Locale::ALL.into_iter().find(|l| l.as_str() == code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locale of a request path: the first non-empty segment if it is a
/// supported code, the default locale otherwise. Never fails.
pub fn locale_from_path(path: &str) -> Locale {
    path.split('/')
        .find(|part| !part.is_empty())
        .and_then(Locale::parse)
        .unwrap_or(DEFAULT_LOCALE)
}

/// Locale suffix of a post filename, e.g. `my-post.pt.md` -> `Pt`.
/// None means legacy naming: the file belongs to the default locale.
/// A two-letter suffix outside the supported set also yields None; the
/// repository scan decides what to do with those files.
pub fn locale_from_filename(filename: &str) -> Option<Locale> {
    lazy_static! {
        static ref SUFFIX_REGEX: Regex = Regex::new(r"\.([a-z]{2})\.md$").unwrap();
    }

    SUFFIX_REGEX
        .captures(filename)
        .and_then(|cap| cap.get(1))
        .and_then(|code| Locale::parse(code.as_str()))
}

/// Slug without any trailing locale suffix. Strips repeatedly so the
/// function is idempotent even on doubled suffixes.
pub fn original_slug(slug: &str) -> String {
    let mut slug = slug;
    'outer: loop {
        for locale in Locale::ALL {
            let suffix = format!(".{}", locale);
            if let Some(stripped) = slug.strip_suffix(suffix.as_str()) {
                slug = stripped;
                continue 'outer;
            }
        }
        break;
    }
    slug.to_string()
}

/// Inverse of the filename convention: default locale -> bare slug, any
/// other locale -> `slug.<locale>`.
pub fn translated_path(locale: Locale, slug: &str) -> String {
    let base = original_slug(slug);
    if locale == DEFAULT_LOCALE {
        base
    } else {
        format!("{}.{}", base, locale)
    }
}
