use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::{fs, io};

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use spdlog::{info, warn};

use crate::content::frontmatter::{parse_frontmatter, reading_time};
use crate::content::markdown_renderer::MarkdownRenderer;
use crate::content::{PostEntry, PostMetadata};
use crate::locale::{locale_from_filename, original_slug, Locale, DEFAULT_LOCALE};
use crate::text_utils::{make_excerpt, parse_date};

#[derive(Debug, Clone)]
struct PostDocument {
    locale: Locale,
    slug: String,
    path: PathBuf,
}

/// All posts, parsed and rendered once at startup. Read-only afterwards:
/// republishing means restarting the process.
pub struct PostRepository {
    posts_by_locale: HashMap<Locale, Vec<PostMetadata>>,
    entries: HashMap<(Locale, String), PostEntry>,
    locales_by_slug: HashMap<String, BTreeSet<Locale>>,
}

impl PostRepository {
    pub fn build(posts_dir: &Path) -> io::Result<PostRepository> {
        let documents = discover_documents(posts_dir)?;

        let mut entries: HashMap<(Locale, String), PostEntry> = HashMap::new();
        let mut discovery_order: Vec<(Locale, String)> = vec![];

        for document in &documents {
            let key = (document.locale, document.slug.clone());
            if entries.contains_key(&key) {
                warn!(
                    "Duplicate post {} ({}) at {} - keeping the first document",
                    document.slug,
                    document.locale,
                    document.path.display()
                );
                continue;
            }

            match load_entry(document) {
                Ok(entry) => {
                    discovery_order.push(key.clone());
                    entries.insert(key, entry);
                }
                Err(e) => {
                    // One bad document must not take the whole build down
                    warn!("Skipping {}: {}", document.path.display(), e);
                }
            }
        }

        let mut locales_by_slug: HashMap<String, BTreeSet<Locale>> = HashMap::new();
        for (locale, slug) in entries.keys() {
            locales_by_slug
                .entry(slug.clone())
                .or_default()
                .insert(*locale);
        }

        // Link translation groups: every entry lists its sibling locales
        for ((locale, slug), entry) in entries.iter_mut() {
            entry.metadata.translations = locales_by_slug[slug]
                .iter()
                .copied()
                .filter(|sibling| sibling != locale)
                .collect();
        }

        let mut posts_by_locale: HashMap<Locale, Vec<PostMetadata>> = HashMap::new();
        for key in &discovery_order {
            let entry = &entries[key];
            posts_by_locale
                .entry(key.0)
                .or_default()
                .push(entry.metadata.clone());
        }
        for posts in posts_by_locale.values_mut() {
            // Stable sort: date ties keep discovery (path) order
            posts.sort_by(|a, b| b.date.cmp(&a.date));
        }

        info!("Post repository built with {} documents", entries.len());

        Ok(PostRepository {
            posts_by_locale,
            entries,
            locales_by_slug,
        })
    }

    /// Newest-first metadata for one locale.
    pub fn all_posts(&self, locale: Locale) -> &[PostMetadata] {
        self.posts_by_locale
            .get(&locale)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Same, keyed by a raw locale code. Unknown codes yield an empty
    /// list, never an error.
    pub fn all_posts_by_code(&self, code: &str) -> &[PostMetadata] {
        Locale::parse(code)
            .map(|locale| self.all_posts(locale))
            .unwrap_or(&[])
    }

    /// Post in the requested locale, falling back to the default locale.
    /// None means not published anywhere; callers map that to a 404.
    pub fn post_by_slug(&self, slug: &str, locale: Locale) -> Option<&PostEntry> {
        self.entries
            .get(&(locale, slug.to_string()))
            .or_else(|| self.entries.get(&(DEFAULT_LOCALE, slug.to_string())))
    }

    /// Exact lookup without the default-locale fallback.
    pub fn post_in_locale(&self, slug: &str, locale: Locale) -> Option<&PostEntry> {
        self.entries.get(&(locale, slug.to_string()))
    }

    /// Every locale this slug is published in.
    pub fn available_locales(&self, slug: &str) -> BTreeSet<Locale> {
        self.locales_by_slug.get(slug).cloned().unwrap_or_default()
    }

    /// All known slugs, sorted for deterministic output.
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.locales_by_slug.keys().cloned().collect();
        slugs.sort();
        slugs
    }

    pub fn post_count(&self) -> usize {
        self.entries.len()
    }
}

fn discover_documents(posts_dir: &Path) -> io::Result<Vec<PostDocument>> {
    // A missing content root is an empty site, not an error
    if !posts_dir.is_dir() {
        warn!("Posts directory {} does not exist", posts_dir.display());
        return Ok(vec![]);
    }

    let mut documents = vec![];
    for path in sorted_dir_entries(posts_dir)? {
        if path.is_dir() {
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let Some(locale) = Locale::parse(dir_name) else {
                // Not a locale directory; nothing of ours in there
                continue;
            };

            for file in sorted_dir_entries(&path)? {
                let Some(file_name) = md_file_name(&file) else {
                    continue;
                };
                // The directory locale wins over any filename suffix
                documents.push(PostDocument {
                    locale,
                    slug: original_slug(file_name.trim_end_matches(".md")),
                    path: file.clone(),
                });
            }
        } else {
            let Some(file_name) = md_file_name(&path) else {
                continue;
            };

            let locale = match locale_from_filename(file_name) {
                Some(locale) => locale,
                None => {
                    if has_unsupported_locale_suffix(file_name) {
                        warn!("Skipping {}: unsupported locale suffix", path.display());
                        continue;
                    }
                    DEFAULT_LOCALE
                }
            };

            documents.push(PostDocument {
                locale,
                slug: original_slug(file_name.trim_end_matches(".md")),
                path: path.clone(),
            });
        }
    }

    Ok(documents)
}

fn sorted_dir_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths)
}

fn md_file_name(path: &Path) -> Option<&str> {
    if !path.is_file() {
        return None;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|name| name.ends_with(".md"))
}

fn has_unsupported_locale_suffix(file_name: &str) -> bool {
    lazy_static! {
        static ref SUFFIX_REGEX: Regex = Regex::new(r"\.([a-z]{2})\.md$").unwrap();
    }
    SUFFIX_REGEX
        .captures(file_name)
        .is_some_and(|cap| Locale::parse(&cap[1]).is_none())
}

fn load_entry(document: &PostDocument) -> io::Result<PostEntry> {
    let raw = fs::read_to_string(&document.path)?;
    let (meta, body) = parse_frontmatter(&raw);

    let title = meta
        .scalar("title")
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| document.slug.clone());

    let date = match meta.scalar("date").and_then(parse_date) {
        Some(date) => date,
        None => {
            warn!(
                "No parseable date in {}; falling back to build time",
                document.path.display()
            );
            Utc::now().naive_utc()
        }
    };

    let excerpt = meta
        .scalar("excerpt")
        .filter(|excerpt| !excerpt.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| make_excerpt(&body));

    let tags = meta.list("tags").map(<[String]>::to_vec).unwrap_or_default();

    let rendered = MarkdownRenderer::render(&body)?;

    Ok(PostEntry {
        metadata: PostMetadata {
            slug: document.slug.clone(),
            title,
            date,
            excerpt,
            tags,
            reading_time: reading_time(&body),
            locale: document.locale,
            translations: vec![],
        },
        html: rendered.html,
        toc: rendered.toc,
    })
}
