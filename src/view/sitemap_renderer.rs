use std::io::Cursor;

use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::locale::Locale;
use crate::post_repository::PostRepository;

/* Example
<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:xhtml="http://www.w3.org/1999/xhtml">
  <url>
    <loc>https://example.dev/en</loc>
    <lastmod>2024-05-01</lastmod>
    <changefreq>daily</changefreq>
    <priority>1.0</priority>
    <xhtml:link rel="alternate" hreflang="en" href="https://example.dev/en"/>
    <xhtml:link rel="alternate" hreflang="pt" href="https://example.dev/pt"/>
  </url>
</urlset>
*/

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Fixed pages that exist in every locale. The empty name is the home
/// page.
const STATIC_PAGES: [&str; 3] = ["", "about", "contact"];

pub struct SitemapRenderer<'a> {
    pub base_url: &'a str,
}

impl<'a> SitemapRenderer<'a> {
    /// Per-locale URLs with cross-language alternates. Post URLs only
    /// list alternates for the locales the slug is actually published
    /// in; lastmod comes from the post date, static pages use `today`.
    pub fn render(&self, repo: &PostRepository, today: NaiveDate) -> quick_xml::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let base_url = self.base_url.trim_end_matches('/');
        let today = today.format("%Y-%m-%d").to_string();

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NS));
        urlset.push_attribute(("xmlns:xhtml", XHTML_NS));
        writer.write_event(Event::Start(urlset))?;

        for page in STATIC_PAGES {
            let (changefreq, priority) = if page.is_empty() {
                ("daily", "1.0")
            } else {
                ("monthly", "0.8")
            };

            let alternates: Vec<(Locale, String)> = Locale::ALL
                .into_iter()
                .map(|locale| (locale, page_url(base_url, locale, page)))
                .collect();

            for locale in Locale::ALL {
                let loc = page_url(base_url, locale, page);
                push_url(&mut writer, &loc, &today, changefreq, priority, &alternates)?;
            }
        }

        for slug in repo.slugs() {
            let locales = repo.available_locales(&slug);

            let alternates: Vec<(Locale, String)> = locales
                .iter()
                .map(|locale| (*locale, post_url(base_url, *locale, &slug)))
                .collect();

            for locale in &locales {
                let Some(entry) = repo.post_in_locale(&slug, *locale) else {
                    continue;
                };
                let loc = post_url(base_url, *locale, &slug);
                let lastmod = entry.metadata.date.format("%Y-%m-%d").to_string();
                push_url(&mut writer, &loc, &lastmod, "monthly", "0.9", &alternates)?;
            }
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        Ok(writer.into_inner().into_inner())
    }
}

fn page_url(base_url: &str, locale: Locale, page: &str) -> String {
    if page.is_empty() {
        format!("{}/{}", base_url, locale)
    } else {
        format!("{}/{}/{}", base_url, locale, page)
    }
}

fn post_url(base_url: &str, locale: Locale, slug: &str) -> String {
    format!("{}/{}/posts/{}", base_url, locale, slug)
}

fn push_url(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    loc: &str,
    lastmod: &str,
    changefreq: &str,
    priority: &str,
    alternates: &[(Locale, String)],
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;

    push_text(writer, "loc", loc)?;
    push_text(writer, "lastmod", lastmod)?;
    push_text(writer, "changefreq", changefreq)?;
    push_text(writer, "priority", priority)?;

    for (hreflang, href) in alternates {
        let mut link = BytesStart::new("xhtml:link");
        link.push_attribute(("rel", "alternate"));
        link.push_attribute(("hreflang", hreflang.as_str()));
        link.push_attribute(("href", href.as_str()));
        writer.write_event(Event::Empty(link))?;
    }

    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::str;

    use tempfile::TempDir;

    use super::*;

    fn build_repo() -> (TempDir, PostRepository) {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, title: &str| {
            fs::write(
                dir.path().join(name),
                format!("---\ntitle: {}\ndate: 2024-05-01\n---\n\nbody\n", title),
            )
            .unwrap();
        };
        write("my-post.md", "Hello");
        write("my-post.pt.md", "Olá");
        write("english-only.md", "Only English");

        let repo = PostRepository::build(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_sitemap_contents() {
        let (_dir, repo) = build_repo();
        let renderer = SitemapRenderer {
            base_url: "https://example.dev/",
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let xml = renderer.render(&repo, today).unwrap();
        let xml = str::from_utf8(&xml).unwrap();

        // Static pages in both locales, with cross-language alternates
        assert!(xml.contains("<loc>https://example.dev/en</loc>"));
        assert!(xml.contains("<loc>https://example.dev/pt</loc>"));
        assert!(xml.contains("<loc>https://example.dev/en/about</loc>"));
        assert!(xml.contains("<loc>https://example.dev/pt/contact</loc>"));
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="pt" href="https://example.dev/pt/about"/>"#
        ));

        // Translated post: one url per locale, alternates for both
        assert!(xml.contains("<loc>https://example.dev/en/posts/my-post</loc>"));
        assert!(xml.contains("<loc>https://example.dev/pt/posts/my-post</loc>"));
        assert!(xml.contains(
            r#"<xhtml:link rel="alternate" hreflang="pt" href="https://example.dev/pt/posts/my-post"/>"#
        ));

        // lastmod from the post date, not today
        assert!(xml.contains("<lastmod>2024-05-01</lastmod>"));
        assert!(xml.contains("<lastmod>2024-06-01</lastmod>"));
    }

    #[test]
    fn test_untranslated_post_has_single_alternate() {
        let (_dir, repo) = build_repo();
        let renderer = SitemapRenderer {
            base_url: "https://example.dev",
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let xml = renderer.render(&repo, today).unwrap();
        let xml = str::from_utf8(&xml).unwrap();

        assert!(xml.contains("<loc>https://example.dev/en/posts/english-only</loc>"));
        assert!(!xml.contains("<loc>https://example.dev/pt/posts/english-only</loc>"));
        assert!(!xml.contains(
            r#"hreflang="pt" href="https://example.dev/pt/posts/english-only""#
        ));
    }
}
