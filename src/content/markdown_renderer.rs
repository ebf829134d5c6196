use std::io;
use std::io::ErrorKind;

use markdown::mdast::Node;
use markdown::{CompileOptions, Options, ParseOptions};

use crate::content::heading_decorator::{decorate_headings, mark_code_blocks, OutlineHeading};
use crate::content::typographic::smarten;
use crate::content::TocItem;

pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocItem>,
}

pub struct MarkdownRenderer {}

impl MarkdownRenderer {
    /// Render a post body (frontmatter already stripped) to HTML plus its
    /// table of contents.
    ///
    /// The TOC keeps headings of level 2-4; their ids are assigned in one
    /// place, during heading decoration, so the ids reported here are
    /// exactly the ids embedded in the HTML.
    pub fn render(body: &str) -> io::Result<RenderedMarkdown> {
        let tree = match markdown::to_mdast(body, &Self::options().parse) {
            Ok(tree) => tree,
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e.reason)),
        };

        let mut outline = Vec::new();
        collect_outline(&tree, &mut outline);

        let html = match markdown::to_html_with_options(body, &Self::options()) {
            Ok(html) => html,
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e.reason)),
        };

        let html = smarten(&html);
        let html = decorate_headings(&html, &mut outline);
        let html = mark_code_blocks(&html);

        let toc = outline
            .into_iter()
            .filter(|heading| (2..=4).contains(&heading.level))
            .map(|heading| TocItem {
                id: heading.id,
                text: heading.text,
                level: heading.level,
            })
            .collect();

        Ok(RenderedMarkdown { html, toc })
    }

    fn options() -> Options {
        Options {
            parse: ParseOptions::gfm(),
            compile: CompileOptions {
                // Embedded HTML passes through instead of being escaped
                allow_dangerous_html: true,
                ..CompileOptions::gfm()
            },
        }
    }
}

/// Collect every heading in document order. Heading text concatenates the
/// direct literal-text and inline-code children only; formatting-only
/// children contribute nothing.
fn collect_outline(node: &Node, outline: &mut Vec<OutlineHeading>) {
    if let Node::Heading(heading) = node {
        let mut text = String::new();
        for child in &heading.children {
            match child {
                Node::Text(t) => text.push_str(&t.value),
                Node::InlineCode(code) => text.push_str(&code.value),
                _ => {}
            }
        }

        outline.push(OutlineHeading {
            level: heading.depth,
            text: smarten(text.trim_end()),
            id: String::new(),
        });
    }

    if let Some(children) = node.children() {
        for child in children {
            collect_outline(child, outline);
        }
    }
}
