use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::text_utils::slugify;

pub const HEADING_CLASS: &str = "heading-with-bar";

/// One heading collected from the parsed document, in document order.
/// `id` is empty until the decoration pass assigns the anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineHeading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Tracks slugs already handed out in one document. On collision the
/// slug gets a `-2`, `-3`, ... suffix.
pub struct SlugDeduper {
    used: HashSet<String>,
}

impl SlugDeduper {
    pub fn new() -> Self {
        SlugDeduper { used: HashSet::new() }
    }

    pub fn register(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    pub fn assign(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for SlugDeduper {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref HEADING_TAG: Regex = Regex::new(r"<h([1-6])((?:\s[^>]*)?)>").unwrap();
    static ref ID_ATTR: Regex = Regex::new(r#"\bid\s*=\s*"([^"]*)""#).unwrap();
    static ref CLASS_ATTR: Regex = Regex::new(r#"\bclass\s*=\s*"([^"]*)""#).unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref CODE_OPEN: Regex = Regex::new(r#"<pre><code( class="([^"]*)")?>"#).unwrap();
}

/// Give every heading in the rendered HTML a slug id and the presentation
/// class.
///
/// Headings produced from markdown are matched positionally (by level)
/// against `outline`, so the ids written into the HTML are the exact ids
/// the table of contents reports. Headings that arrived as raw embedded
/// HTML keep an explicit id when they carry one; otherwise they are
/// slugged from their own inner text through the same deduplicator.
pub fn decorate_headings(html: &str, outline: &mut [OutlineHeading]) -> String {
    let mut deduper = SlugDeduper::new();
    let mut out = String::with_capacity(html.len() + 64);
    let mut last_end = 0;
    let mut pending = 0;

    for caps in HEADING_TAG.captures_iter(html) {
        let whole = caps.get(0).unwrap();
        let level: u8 = caps[1].parse().unwrap();
        let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        out.push_str(&html[last_end..whole.start()]);

        let explicit_id = ID_ATTR.captures(attrs).map(|c| c[1].to_string());
        let id = match explicit_id {
            Some(id) => {
                deduper.register(&id);
                id
            }
            None => {
                let matched = pending < outline.len() && outline[pending].level == level;
                let text = if matched {
                    outline[pending].text.clone()
                } else {
                    heading_inner_text(html, whole.end(), level)
                };
                let id = deduper.assign(&slugify(&text));
                if matched {
                    outline[pending].id = id.clone();
                    pending += 1;
                }
                id
            }
        };

        out.push_str(&rebuild_heading_tag(level, attrs, &id));
        last_end = whole.end();
    }

    out.push_str(&html[last_end..]);
    out
}

/// Mark fenced code blocks with the highlighter class contract
/// (`hljs` plus the `language-*` class the renderer already emits).
/// Unknown or missing languages stay untouched apart from the marker.
pub fn mark_code_blocks(html: &str) -> String {
    CODE_OPEN
        .replace_all(html, |caps: &regex::Captures| match caps.get(2) {
            Some(classes) if !classes.as_str().is_empty() => {
                let classes = classes.as_str();
                if classes.split_whitespace().any(|token| token == "hljs") {
                    caps[0].to_string()
                } else {
                    format!(r#"<pre><code class="hljs {}">"#, classes)
                }
            }
            _ => r#"<pre><code class="hljs">"#.to_string(),
        })
        .to_string()
}

fn rebuild_heading_tag(level: u8, attrs: &str, id: &str) -> String {
    let mut attrs = if ID_ATTR.is_match(attrs) {
        attrs.to_string()
    } else {
        format!(r#" id="{}"{}"#, id, attrs)
    };

    let existing_class = CLASS_ATTR
        .captures(&attrs)
        .map(|caps| (caps.get(0).unwrap().range(), caps[1].to_string()));

    if let Some((range, value)) = existing_class {
        let mut tokens: Vec<&str> = value.split_whitespace().collect();
        if !tokens.contains(&HEADING_CLASS) {
            tokens.push(HEADING_CLASS);
        }
        let merged = format!(r#"class="{}""#, tokens.join(" "));
        attrs.replace_range(range, &merged);
    } else {
        attrs.push_str(&format!(r#" class="{}""#, HEADING_CLASS));
    }

    format!("<h{}{}>", level, attrs)
}

fn heading_inner_text(html: &str, from: usize, level: u8) -> String {
    let close = format!("</h{}>", level);
    let inner = match html[from..].find(&close) {
        Some(pos) => &html[from..from + pos],
        None => return String::new(),
    };
    ANY_TAG.replace_all(inner, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(items: &[(u8, &str)]) -> Vec<OutlineHeading> {
        items
            .iter()
            .map(|(level, text)| OutlineHeading {
                level: *level,
                text: text.to_string(),
                id: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_plain_headings() {
        let html = "<h2>Getting Started</h2>\n<p>text</p>\n<h3>Install</h3>";
        let mut headings = outline(&[(2, "Getting Started"), (3, "Install")]);
        let decorated = decorate_headings(html, &mut headings);

        assert_eq!(
            decorated,
            "<h2 id=\"getting-started\" class=\"heading-with-bar\">Getting Started</h2>\n\
             <p>text</p>\n\
             <h3 id=\"install\" class=\"heading-with-bar\">Install</h3>"
        );
        assert_eq!(headings[0].id, "getting-started");
        assert_eq!(headings[1].id, "install");
    }

    #[test]
    fn test_duplicate_slugs_get_numeric_suffix() {
        let html = "<h2>Setup</h2><h2>Setup</h2><h2>Setup</h2>";
        let mut headings = outline(&[(2, "Setup"), (2, "Setup"), (2, "Setup")]);
        let decorated = decorate_headings(html, &mut headings);

        assert!(decorated.contains(r#"id="setup""#));
        assert!(decorated.contains(r#"id="setup-2""#));
        assert!(decorated.contains(r#"id="setup-3""#));
        assert_eq!(headings[1].id, "setup-2");
        assert_eq!(headings[2].id, "setup-3");
    }

    #[test]
    fn test_existing_class_is_kept() {
        let html = r#"<h2 class="intro">Hello</h2>"#;
        let mut headings = outline(&[(2, "Hello")]);
        let decorated = decorate_headings(html, &mut headings);
        assert_eq!(
            decorated,
            r#"<h2 id="hello" class="intro heading-with-bar">Hello</h2>"#
        );
    }

    #[test]
    fn test_empty_class_leaves_no_stray_token() {
        let html = r#"<h2 class="">Hello</h2>"#;
        let mut headings = outline(&[(2, "Hello")]);
        let decorated = decorate_headings(html, &mut headings);
        assert_eq!(
            decorated,
            r#"<h2 id="hello" class="heading-with-bar">Hello</h2>"#
        );
    }

    #[test]
    fn test_class_not_duplicated() {
        let html = r#"<h2 class="heading-with-bar">Hello</h2>"#;
        let mut headings = outline(&[(2, "Hello")]);
        let decorated = decorate_headings(html, &mut headings);
        assert_eq!(
            decorated,
            r#"<h2 id="hello" class="heading-with-bar">Hello</h2>"#
        );
    }

    #[test]
    fn test_raw_html_heading_keeps_explicit_id() {
        let html = r#"<h2 id="custom">Raw</h2><h2>Parsed</h2>"#;
        let mut headings = outline(&[(2, "Parsed")]);
        let decorated = decorate_headings(html, &mut headings);

        assert!(decorated.contains(r#"<h2 id="custom" class="heading-with-bar">Raw</h2>"#));
        assert!(decorated.contains(r#"<h2 id="parsed" class="heading-with-bar">Parsed</h2>"#));
        assert_eq!(headings[0].id, "parsed");
    }

    #[test]
    fn test_raw_heading_level_mismatch_slugged_from_inner_text() {
        // The outline expects an h2; the h5 in between came from raw HTML
        let html = "<h5>Fine <em>Print</em></h5><h2>Body</h2>";
        let mut headings = outline(&[(2, "Body")]);
        let decorated = decorate_headings(html, &mut headings);

        assert!(decorated.contains(r#"<h5 id="fine-print" class="heading-with-bar">"#));
        assert_eq!(headings[0].id, "body");
    }

    #[test]
    fn test_empty_heading_text_gets_fallback_slug() {
        let html = "<h2>!!!</h2>";
        let mut headings = outline(&[(2, "!!!")]);
        let decorated = decorate_headings(html, &mut headings);
        assert!(decorated.contains(r#"id="section""#));
    }

    #[test]
    fn test_mark_code_blocks() {
        assert_eq!(
            mark_code_blocks(r#"<pre><code class="language-rust">let x;</code></pre>"#),
            r#"<pre><code class="hljs language-rust">let x;</code></pre>"#
        );
        assert_eq!(
            mark_code_blocks("<pre><code>plain</code></pre>"),
            r#"<pre><code class="hljs">plain</code></pre>"#
        );
        // Idempotent
        assert_eq!(
            mark_code_blocks(r#"<pre><code class="hljs language-rust">x</code></pre>"#),
            r#"<pre><code class="hljs language-rust">x</code></pre>"#
        );
    }

    #[test]
    fn test_slug_deduper_explicit_collision() {
        let mut deduper = SlugDeduper::new();
        assert_eq!(deduper.assign("a"), "a");
        deduper.register("a-2");
        assert_eq!(deduper.assign("a"), "a-3");
    }
}
