use thiserror::Error;
use url::Url;

/// Errors that can occur while validating the backend base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host: {0}")]
    MissingHost(String),
    /// Query strings and fragments would be clobbered by endpoint joins.
    #[error("Base URL must not carry a query or fragment: {0}")]
    UnexpectedSuffix(String),
}

/// Validates the catalog backend root URL.
///
/// Unlike user-supplied links, the base URL is operator configuration, so
/// loopback and private hosts are allowed (local backends and test servers).
///
/// # Examples
///
/// ```
/// use cinedex::util::validate_base_url;
///
/// assert!(validate_base_url("https://movies.example.com").is_ok());
/// assert!(validate_base_url("http://127.0.0.1:8080/v1").is_ok());
/// assert!(validate_base_url("file:///etc/passwd").is_err());
/// assert!(validate_base_url("https://example.com/?page=2").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost(url_str.to_owned()));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::UnexpectedSuffix(url_str.to_owned()));
    }

    Ok(url)
}
