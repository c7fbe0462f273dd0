//! Pure per-field sanitization and validation.
//!
//! Validating functions return the normalized value or `None` on rejection;
//! they never panic on malformed input. Escaping order matters and is fixed:
//! tag stripping runs before entity encoding (so encoded angle brackets from
//! user text are never mistaken for tags), entity encoding runs before
//! control-character stripping.

use crate::constants::{
    EMAIL_PATTERN, HTML_TAG_PATTERN, MAX_EMAIL_LENGTH, MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_LENGTH, MIN_MESSAGE_LENGTH, MIN_NAME_LENGTH, NAME_PATTERN, PHONE_BR_PATTERN,
    XSS_PATTERN,
};

/// Letters, accents and spaces only, 3-100 characters, no XSS markers.
pub fn sanitize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();

    if !NAME_PATTERN.is_match(trimmed) {
        return None;
    }

    let len = trimmed.chars().count();
    if len < MIN_NAME_LENGTH || len > MAX_NAME_LENGTH {
        return None;
    }

    if XSS_PATTERN.is_match(trimmed) {
        return None;
    }

    Some(trimmed.to_string())
}

/// Trimmed, lowercased, matched against the practical email grammar.
pub fn sanitize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();

    if !EMAIL_PATTERN.is_match(&normalized) {
        return None;
    }

    if normalized.chars().count() > MAX_EMAIL_LENGTH {
        return None;
    }

    Some(normalized)
}

/// Strips everything but digits, whitespace, parens, hyphen and plus, then
/// matches the Brazilian phone grammar.
pub fn sanitize_phone(phone: &str) -> Option<String> {
    let stripped: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '(' | ')' | '-' | '+'))
        .collect();

    if !PHONE_BR_PATTERN.is_match(&stripped) {
        return None;
    }

    if stripped.chars().count() > MAX_PHONE_LENGTH {
        return None;
    }

    Some(stripped.trim().to_string())
}

/// 10-2000 characters, no XSS markers, then HTML-escaped for display.
pub fn sanitize_message(message: &str) -> Option<String> {
    let trimmed = message.trim();

    let len = trimmed.chars().count();
    if len < MIN_MESSAGE_LENGTH || len > MAX_MESSAGE_LENGTH {
        return None;
    }

    if XSS_PATTERN.is_match(trimmed) {
        return None;
    }

    Some(sanitize(trimmed))
}

/// Strips HTML tags, entity-encodes `& < > " ' /`, drops control characters.
///
/// Not idempotent: applying it twice re-encodes the ampersands introduced by
/// the first pass.
pub fn sanitize(text: &str) -> String {
    let without_tags = HTML_TAG_PATTERN.replace_all(text, "");
    let escaped = encode_entities(&without_tags);
    let cleaned: String = escaped.chars().filter(|c| !is_control(*c)).collect();
    cleaned.trim().to_string()
}

/// [`sanitize`], but newlines become `<br>` markers for HTML display
/// contexts instead of being dropped with the other control characters.
pub fn sanitize_multiline(text: &str) -> String {
    let without_tags = HTML_TAG_PATTERN.replace_all(text, "");
    let escaped = encode_entities(&without_tags);
    let with_breaks = escaped.replace('\n', "<br>");
    let cleaned: String = with_breaks.chars().filter(|c| !is_control(*c)).collect();
    cleaned.trim().to_string()
}

fn encode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}
