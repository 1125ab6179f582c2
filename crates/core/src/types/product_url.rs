//! Product URL type.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors that can occur when parsing a [`ProductUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductUrlError {
    /// The input string is empty or whitespace.
    #[error("product URL cannot be empty")]
    Empty,
    /// The input could not be parsed as a URL.
    #[error("malformed product URL: {0}")]
    Malformed(String),
    /// The URL uses a scheme other than http or https.
    #[error("product URL must use http or https (got {0})")]
    UnsupportedScheme(String),
    /// The URL has no host.
    #[error("product URL must include a host")]
    MissingHost,
}

/// A third-party product page URL pasted by the shopper.
///
/// Parsing only checks that the input is a well-formed absolute web URL.
/// Whether it points at a resolvable product is decided by the pricing
/// service.
///
/// ## Examples
///
/// ```
/// use kashly_core::ProductUrl;
///
/// assert!(ProductUrl::parse("https://www.amazon.com/dp/B08N5WRWNW").is_ok());
/// assert!(ProductUrl::parse("  ").is_err());
/// assert!(ProductUrl::parse("bad-url").is_err());
/// assert!(ProductUrl::parse("ftp://example.com/file").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductUrl(Url);

impl ProductUrl {
    /// Parse a `ProductUrl`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not an absolute URL, uses a
    /// scheme other than `http`/`https`, or has no host.
    pub fn parse(s: &str) -> Result<Self, ProductUrlError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ProductUrlError::Empty);
        }

        let url = Url::parse(trimmed).map_err(|e| ProductUrlError::Malformed(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProductUrlError::UnsupportedScheme(url.scheme().to_owned()));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ProductUrlError::MissingHost);
        }

        Ok(Self(url))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the parsed URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ProductUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProductUrl {
    type Err = ProductUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductUrl {
    type Error = ProductUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductUrl> for String {
    fn from(url: ProductUrl) -> Self {
        url.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amazon_url() {
        let url = ProductUrl::parse(" https://www.amazon.com/dp/B08N5WRWNW?th=1 ")
            .expect("valid url");
        assert_eq!(url.as_url().host_str(), Some("www.amazon.com"));
        assert_eq!(url.as_str(), "https://www.amazon.com/dp/B08N5WRWNW?th=1");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ProductUrl::parse(""), Err(ProductUrlError::Empty));
        assert_eq!(ProductUrl::parse("   "), Err(ProductUrlError::Empty));
    }

    #[test]
    fn test_parse_relative_is_malformed() {
        assert!(matches!(
            ProductUrl::parse("bad-url"),
            Err(ProductUrlError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert_eq!(
            ProductUrl::parse("mailto:shopper@example.com"),
            Err(ProductUrlError::UnsupportedScheme("mailto".to_string()))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<ProductUrl, _> = serde_json::from_str("\"https://amazon.com/dp/X\"");
        assert!(ok.is_ok());

        let bad: Result<ProductUrl, _> = serde_json::from_str("\"not a url\"");
        assert!(bad.is_err());
    }
}
