//! Destination filename resolution and sanitization.

use reqwest::Url;
use std::borrow::Cow;

/// Extension used when the content type gives nothing usable.
pub const DEFAULT_EXTENSION: &str = ".bin";

/// Picks the stored filename for a response.
///
/// In order: the server-declared attachment name, the last non-empty segment
/// of `url` (percent-decoded), and finally a random name whose extension comes
/// from `content_type`. Whatever is picked is sanitized; a name that sanitizes
/// to nothing falls through to the random name.
pub fn resolve(declared: Option<&str>, url: &Url, content_type: Option<&str>) -> String {
    declared
        .map(unquote)
        .filter(|name| !name.is_empty())
        .map(Cow::Borrowed)
        .or_else(|| last_segment(url))
        .and_then(|name| sanitize(&name))
        .unwrap_or_else(|| fallback_name(content_type))
}

fn unquote(name: &str) -> &str {
    name.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

fn last_segment(url: &Url) -> Option<Cow<'_, str>> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    Some(Cow::Owned(decoded.trim().to_string()))
}

/// Replaces characters that are illegal in file names with `_`.
///
/// Returns `None` when nothing usable is left (`""`, `.` or `..`).
pub fn sanitize(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// A random 128-bit hex token plus an extension derived from `content_type`.
pub fn fallback_name(content_type: Option<&str>) -> String {
    format!(
        "{:032x}{}",
        rand::random::<u128>(),
        extension_for(content_type)
    )
}

/// `.pdf` for `application/pdf`; [`DEFAULT_EXTENSION`] when there is no usable subtype.
pub fn extension_for(content_type: Option<&str>) -> String {
    content_type
        .and_then(|value| value.split(';').next())
        .and_then(|essence| essence.split_once('/'))
        .map(|(_, subtype)| subtype.trim().to_ascii_lowercase())
        .and_then(|subtype| sanitize(&subtype))
        .map(|subtype| format!(".{subtype}"))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
