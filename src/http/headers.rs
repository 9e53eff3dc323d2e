//! Response header parsing.
//!
//! Helpers to pull the declared length, media type and attachment filename
//! out of a response.

use reqwest::{
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    Response,
};
use std::borrow::Cow;

/// Declared body length, if the server sent a usable `Content-Length`.
pub fn declared_length(response: &Response) -> Option<u64> {
    response.content_length()
}

/// Media type of the response without parameters, lowercased.
///
/// `text/html; charset=utf-8` becomes `text/html`.
pub fn media_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_media_type)
}

/// Attachment filename declared in `Content-Disposition`, if any.
pub fn attachment_name(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
}

/// Strips parameters from a `Content-Type` value.
pub fn parse_media_type(value: &str) -> Option<String> {
    let essence = value.split(';').next()?.trim();
    (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
}

/// Extracts the filename from a `Content-Disposition` value.
///
/// The extended form (`filename*=UTF-8''na%C3%AFve.pdf`, RFC 5987) wins over
/// the plain form (`filename="report.pdf"`). Quoted values may contain `;`
/// and backslash escapes. Surrounding whitespace is removed.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for parameter in split_parameters(header).into_iter().skip(1) {
        let Some((key, value)) = parameter.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended_value(value),
            "filename" => plain = Some(unquote(value)),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

// Splits on `;` outside of quoted-strings.
fn split_parameters(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (index, ch) in header.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            _ => out.push(ch),
        }
    }
    out
}

// charset'language'percent-encoded-value
fn decode_extended_value(value: &str) -> Option<String> {
    let value = value.trim_matches('"');
    let (_charset, rest) = value.split_once('\'')?;
    let (_language, encoded) = rest.split_once('\'')?;
    urlencoding::decode(encoded).ok().map(Cow::into_owned)
}
