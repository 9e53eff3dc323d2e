//! Validated remote location.

use crate::error::{Error, Result};

use reqwest::Url;
use std::fmt;
use std::str::FromStr;

/// An absolute `http` or `https` URL.
///
/// The only way to obtain one is [`DownloadUrl::parse`] (or its `FromStr` /
/// `TryFrom` equivalents), so holding a value proves it was validated.
///
/// ```rust
/// use fetchkeep::download::DownloadUrl;
///
/// let url = DownloadUrl::parse("https://example.com/report.pdf").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/report.pdf");
/// assert!(DownloadUrl::parse("ftp://example.com/x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadUrl(Url);

impl DownloadUrl {
    /// Parses and validates `value`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::Validation("URL must not be empty".into()));
        }

        let url = Url::parse(value).map_err(|_| Error::Validation("malformed URL".into()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            _ => Err(Error::Validation(
                "only HTTP/HTTPS URLs are supported".into(),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for DownloadUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DownloadUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DownloadUrl {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl AsRef<Url> for DownloadUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}
