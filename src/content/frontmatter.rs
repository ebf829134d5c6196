use std::collections::HashMap;

/// A parsed frontmatter value: either a plain string or a bracketed
/// comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// Key/value metadata block at the top of a post document.
#[derive(Debug, Default, PartialEq)]
pub struct Frontmatter {
    fields: HashMap<String, FieldValue>,
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Scalar(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.fields.get(key) {
            Some(FieldValue::List(values)) => Some(values.as_slice()),
            _ => None,
        }
    }
}

/// Split a raw document into metadata and body.
///
/// The metadata block is a leading `---` line, arbitrary `key: value`
/// lines, and a closing `---` line. Parsing is tolerant: a missing or
/// unterminated block yields empty metadata and the original text, lines
/// without a colon are skipped, and malformed lines never raise an error.
pub fn parse_frontmatter(raw: &str) -> (Frontmatter, String) {
    let mut lines = raw.lines();

    // The opening delimiter must come before any content. Blank lines
    // above it are tolerated.
    let mut opening = lines.next();
    while let Some(line) = opening {
        if !line.trim().is_empty() {
            break;
        }
        opening = lines.next();
    }

    match opening {
        Some(line) if line.trim() == "---" => {}
        _ => return (Frontmatter::default(), raw.to_string()),
    }

    let mut fields = HashMap::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        fields.insert(key.to_string(), parse_value(value.trim()));
    }

    if !closed {
        // No closing delimiter: treat the whole document as body
        return (Frontmatter::default(), raw.to_string());
    }

    let body = lines.collect::<Vec<&str>>().join("\n").trim().to_string();
    (Frontmatter { fields }, body)
}

fn parse_value(value: &str) -> FieldValue {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        FieldValue::List(items)
    } else {
        FieldValue::Scalar(value.to_string())
    }
}

/// Estimated reading time in whole minutes at 200 words per minute.
pub fn reading_time(body: &str) -> u32 {
    const WORDS_PER_MINUTE: usize = 200;
    let word_count = body.split_whitespace().count();
    word_count.div_ceil(WORDS_PER_MINUTE) as u32
}
