use chrono::{DateTime, NaiveDate, NaiveDateTime};
use unidecode::unidecode;

/// Slug for a heading anchor: transliterate, lowercase, drop everything
/// that is not a word character, collapse whitespace runs into hyphens.
pub fn slugify(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    for ch in unidecode(text).to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            kept.push(ch);
        } else if ch.is_whitespace() {
            kept.push(' ');
        }
    }

    let words: Vec<&str> = kept.trim().split(' ').filter(|w| !w.is_empty()).collect();
    words.join("-")
}

/// Frontmatter dates arrive in whatever shape the author typed. Accept
/// RFC 3339, a date-time without zone, and a bare date.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

/// Fallback excerpt: the first 150 characters of the body.
pub fn make_excerpt(body: &str) -> String {
    let excerpt: String = body.chars().take(150).collect();
    format!("{}...", excerpt)
}
