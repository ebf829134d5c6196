/// Typographic substitution over rendered HTML: straight quotes become
/// curly ones, `--`/`---` become en/em dashes, `...` becomes an ellipsis.
/// Only text content is touched; markup, `code`, `pre`, `script` and
/// `style` regions pass through untouched.
///
/// Also works on plain text (heading text for the TOC) since text without
/// tags never enters the markup states.
pub fn smarten(html: &str) -> String {
    let chars: Vec<char> = html.chars().collect();
    let mut out = String::with_capacity(html.len() + 16);
    let mut skip_stack: Vec<String> = Vec::new();
    let mut prev: Option<char> = None;

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if ch == '<' {
            match chars[i..].iter().position(|c| *c == '>') {
                Some(offset) => {
                    let tag: String = chars[i..=i + offset].iter().collect();
                    track_skip_regions(&tag, &mut skip_stack);
                    out.push_str(&tag);
                    i += offset + 1;
                    prev = None;
                }
                None => {
                    // Unterminated tag: copy the rest verbatim
                    out.extend(&chars[i..]);
                    i = chars.len();
                }
            }
            continue;
        }

        if !skip_stack.is_empty() {
            out.push(ch);
            i += 1;
            continue;
        }

        if ch == '&' {
            if matches_at(&chars, i, "&quot;") {
                let quote = if is_open_context(prev) { '“' } else { '”' };
                out.push(quote);
                prev = Some(quote);
                i += "&quot;".len();
            } else {
                let len = entity_len(&chars, i).unwrap_or(1);
                out.extend(&chars[i..i + len]);
                prev = Some('&');
                i += len;
            }
            continue;
        }

        if ch == '"' {
            let quote = if is_open_context(prev) { '“' } else { '”' };
            out.push(quote);
            prev = Some(quote);
            i += 1;
            continue;
        }

        if ch == '\'' {
            let quote = if prev.is_some_and(|p| p.is_alphanumeric()) {
                '’'
            } else if is_open_context(prev) {
                '‘'
            } else {
                '’'
            };
            out.push(quote);
            prev = Some(quote);
            i += 1;
            continue;
        }

        if ch == '.' && matches_at(&chars, i, "...") {
            out.push('…');
            prev = Some('…');
            i += 3;
            continue;
        }

        if ch == '-' {
            if matches_at(&chars, i, "---") {
                out.push('—');
                prev = Some('—');
                i += 3;
                continue;
            }
            if matches_at(&chars, i, "--") {
                out.push('–');
                prev = Some('–');
                i += 2;
                continue;
            }
        }

        out.push(ch);
        prev = Some(ch);
        i += 1;
    }

    out
}

const SKIP_TAGS: [&str; 4] = ["code", "pre", "script", "style"];

fn track_skip_regions(tag: &str, skip_stack: &mut Vec<String>) {
    let inner = tag.trim_start_matches('<');
    let closing = inner.starts_with('/');
    let name: String = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    if name.is_empty() {
        return;
    }

    if closing {
        if skip_stack.last().map(String::as_str) == Some(name.as_str()) {
            skip_stack.pop();
        }
    } else if SKIP_TAGS.contains(&name.as_str()) && !tag.ends_with("/>") {
        skip_stack.push(name);
    }
}

fn matches_at(chars: &[char], at: usize, needle: &str) -> bool {
    needle
        .chars()
        .enumerate()
        .all(|(offset, expected)| chars.get(at + offset) == Some(&expected))
}

/// Length of an HTML entity starting at `at`, if one is there.
fn entity_len(chars: &[char], at: usize) -> Option<usize> {
    let mut len = 1;
    while let Some(ch) = chars.get(at + len) {
        if *ch == ';' {
            return Some(len + 1);
        }
        if !ch.is_ascii_alphanumeric() && *ch != '#' {
            return None;
        }
        if len > 9 {
            return None;
        }
        len += 1;
    }
    None
}

fn is_open_context(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(ch) => ch.is_whitespace() || matches!(ch, '(' | '[' | '{' | '-' | '–' | '—' | '“' | '‘'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quotes() {
        assert_eq!(smarten("<p>&quot;Hello&quot; world</p>"), "<p>“Hello” world</p>");
        assert_eq!(smarten(r#"He said "hi" twice"#), "He said “hi” twice");
    }

    #[test]
    fn test_single_quotes_and_apostrophes() {
        assert_eq!(smarten("<p>don't stop</p>"), "<p>don’t stop</p>");
        assert_eq!(smarten("<p>'quoted words'</p>"), "<p>‘quoted words’</p>");
    }

    #[test]
    fn test_dashes_and_ellipsis() {
        assert_eq!(smarten("<p>a -- b</p>"), "<p>a – b</p>");
        assert_eq!(smarten("<p>a --- b</p>"), "<p>a — b</p>");
        assert_eq!(smarten("<p>Wait...</p>"), "<p>Wait…</p>");
    }

    #[test]
    fn test_code_regions_untouched() {
        let html = r#"<p>text -- here</p><pre><code>let a = "x"; // b -- c</code></pre>"#;
        let smart = smarten(html);
        assert!(smart.contains("text – here"));
        assert!(smart.contains(r#"let a = "x"; // b -- c"#));

        assert_eq!(
            smarten("<code>don't...</code>"),
            "<code>don't...</code>"
        );
    }

    #[test]
    fn test_inline_code_inside_paragraph() {
        let html = r#"<p>Use <code>--flag</code> -- carefully</p>"#;
        let smart = smarten(html);
        assert!(smart.contains("<code>--flag</code>"));
        assert!(smart.contains("– carefully"));
    }

    #[test]
    fn test_attributes_untouched() {
        let html = r#"<a href="https://example.dev/a--b">a -- b</a>"#;
        let smart = smarten(html);
        assert!(smart.contains(r#"href="https://example.dev/a--b""#));
        assert!(smart.contains(">a – b<"));
    }

    #[test]
    fn test_other_entities_pass_through() {
        assert_eq!(smarten("<p>A &amp; B</p>"), "<p>A &amp; B</p>");
    }

    #[test]
    fn test_plain_text_input() {
        assert_eq!(smarten("it's -- fine..."), "it’s – fine…");
    }
}
