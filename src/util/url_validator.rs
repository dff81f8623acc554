use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating a relay target URL.
///
/// The relay attaches a bearer token to whatever it forwards, so the target
/// must be one of a small set of trusted API hosts.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// The host is not on the relay allowlist.
    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),
    /// Plain http to a non-loopback host.
    #[error("Insecure URL: HTTPS required for {0}")]
    InsecureScheme(String),
}

/// Validates a URL the relay has been asked to forward to.
///
/// Accepts the URL only if:
/// - the scheme is `http` or `https`
/// - the host (case-insensitive, without port) is in `allowed_hosts`
/// - plain `http` is used only for loopback hosts (local testing)
///
/// # Examples
///
/// ```
/// use reddit_cleaner::util::validate_target_url;
///
/// let allowed = vec!["oauth.reddit.com".to_string()];
/// assert!(validate_target_url("https://oauth.reddit.com/api/subscribe", &allowed).is_ok());
/// assert!(validate_target_url("https://evil.example/steal", &allowed).is_err());
/// assert!(validate_target_url("http://oauth.reddit.com/api/subscribe", &allowed).is_err());
/// ```
pub fn validate_target_url(
    url_str: &str,
    allowed_hosts: &[String],
) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned()));
    }

    let host = url
        .host_str()
        .ok_or(UrlValidationError::MissingHost)?
        .to_ascii_lowercase();

    if !allowed_hosts
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&host))
    {
        return Err(UrlValidationError::HostNotAllowed(host));
    }

    if scheme == "http" && !is_loopback_host(&host) {
        return Err(UrlValidationError::InsecureScheme(host));
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
