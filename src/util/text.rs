use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 80;

// Only tag-shaped markup: a bare `<` followed by a space or digit is text.
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[a-zA-Z/!?][^<>]*>").unwrap());
static CDATA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

/// Strips ASCII control characters that have no business in titles or summaries.
///
/// Tab, newline and carriage return survive; everything else below 0x20 and DEL is
/// dropped. Returns `Cow::Borrowed` when nothing needs stripping (the common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_bad = |c: char| c == '\x7f' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'));
    if !s.chars().any(is_bad) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_bad(c)).collect())
}

/// Unwraps every `<![CDATA[...]]>` section, keeping its payload verbatim.
pub fn unwrap_cdata(s: &str) -> Cow<'_, str> {
    if !s.contains("<![CDATA[") {
        return Cow::Borrowed(s);
    }
    CDATA_REGEX.replace_all(s, "$1")
}

/// Removes markup tags, leaving only their text.
pub fn strip_tags(html: &str) -> Cow<'_, str> {
    TAG_REGEX.replace_all(html, " ")
}

/// Decodes HTML entities (named, decimal and hex). Unknown entities are left as-is.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(s)
}

/// Collapses runs of whitespace (including non-breaking spaces) into single spaces and trims.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns a markup fragment into a single line of plain text.
///
/// CDATA is unwrapped, tags are removed, entities decoded (twice, since feeds
/// routinely double-escape), control characters dropped and whitespace collapsed.
/// Escaped comparison signs in plain text survive as `<` and `>`.
///
/// ```
/// use newswire::util::clean_text;
///
/// assert_eq!(clean_text("<p>Caf&eacute; &amp; p&atilde;o</p>"), "Café & pão");
/// ```
pub fn clean_text(raw: &str) -> String {
    let unwrapped = unwrap_cdata(raw);
    let raw_stripped = strip_tags(&unwrapped);
    let decoded = decode_entities(&raw_stripped);
    // Escaped markup (`&lt;p&gt;`) only becomes a tag after the first decode.
    let stripped = strip_tags(&decoded);
    let decoded = decode_entities(&stripped);
    collapse_whitespace(&strip_control_chars(&decoded))
}

/// Truncates to at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Normalises a title for duplicate detection: trimmed and case-folded.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Letters that carry no canonical decomposition but still have a plain ASCII spelling.
fn fold_special(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'đ' => "d",
        'Đ' => "D",
        'ł' => "l",
        'Ł' => "L",
        'ı' => "i",
        _ => return None,
    };
    Some(folded)
}

/// Strips diacritics: canonical decomposition (NFD) with the combining marks removed.
///
/// ```
/// use newswire::util::fold_accents;
///
/// assert_eq!(fold_accents("Tiếng Việt, São Paulo"), "Tieng Viet, Sao Paulo");
/// ```
pub fn fold_accents(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    for c in s.nfd().filter(|&c| !is_combining_mark(c)) {
        match fold_special(c) {
            Some(folded) => out.push_str(folded),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Derives a URL-safe slug from a title.
///
/// The result holds only `[a-z0-9-]`, never starts or ends with a hyphen, never
/// contains two hyphens in a row, and is at most [`MAX_SLUG_LEN`] characters.
///
/// ```
/// use newswire::util::slugify;
///
/// assert_eq!(slugify("Governo anuncia 2ª fase do Pé-de-Meia!"), "governo-anuncia-2-fase-do-pe-de-meia");
/// ```
pub fn slugify(title: &str) -> String {
    let folded = fold_accents(title).to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
        // Everything else (punctuation, symbols, unfoldable letters) is dropped in place.
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}
