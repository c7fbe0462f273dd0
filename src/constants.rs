use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum accepted length of the name field, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Minimum accepted length of the name field, in characters.
pub const MIN_NAME_LENGTH: usize = 3;

/// Maximum accepted length of the email field, in characters.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Maximum accepted length of the phone field, in characters.
pub const MAX_PHONE_LENGTH: usize = 20;

/// Minimum accepted length of the message field, in characters.
pub const MIN_MESSAGE_LENGTH: usize = 10;

/// Maximum accepted length of the message field, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Submissions allowed within one rolling hour before a block is imposed.
pub const MAX_SUBMISSIONS_PER_HOUR: usize = 5;

/// Submissions allowed within one rolling day before a block is imposed.
pub const MAX_SUBMISSIONS_PER_DAY: usize = 20;

/// Block imposed when the hourly threshold is hit, in minutes.
/// The daily threshold imposes twice this.
pub const BLOCK_DURATION_MINUTES: i64 = 60;

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 86_400_000;

/// Practical email grammar: local-part character classes, domain labels of
/// at most 63 characters that do not start or end with a hyphen.
pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Brazilian phone grammar: optional +55 country code, optional two-digit
/// area code (parenthesized or bare), 4-5 digit exchange, 4 digit line.
pub static PHONE_BR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+55\s?)?(\(?\d{2}\)?\s?)?(\d{4,5}[-.\s]?\d{4})$").expect("phone pattern is valid")
});

/// Letters (including Latin-1 accents) and spaces, three characters minimum.
pub static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s]{3,}$").expect("name pattern is valid"));

/// Cross-site-scripting markers rejected outright in free-text fields.
pub static XSS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript:|onerror=|onclick=|onload=|onmouseover=|onfocus=|onblur=")
        .expect("xss pattern is valid")
});

/// Anything that looks like an HTML tag. Stripped before entity encoding so
/// encoded angle brackets from user text are never mistaken for tags.
pub static HTML_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
