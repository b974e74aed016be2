//! Forwarded request utilities
//!
//! A forward-auth service never sees the client's request directly; the
//! reverse proxy describes it through `X-Forwarded-*` headers. This module
//! rebuilds the original URL from them.

use axum::http::HeaderMap;
use url::Url;

pub const X_FORWARDED_URI: &str = "x-forwarded-uri";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Error when reconstructing the forwarded URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardedUriError {
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid forwarded URI: {0}")]
    Invalid(String),
}

/// Extract the original request URL
///
/// `X-Forwarded-Uri` may hold an absolute URL, which is used as-is, or a
/// path with query (Traefik style), which is joined with
/// `X-Forwarded-Proto` (default `https`) and `X-Forwarded-Host`.
///
/// ## Returns
/// * `Ok(Url)` - absolute `http`/`https` URL with a host
/// * `Err(ForwardedUriError)` - headers missing or unusable
pub fn extract_forwarded_url(headers: &HeaderMap) -> Result<Url, ForwardedUriError> {
    let uri = header_str(headers, X_FORWARDED_URI)
        .ok_or(ForwardedUriError::MissingHeader("X-Forwarded-Uri"))?;

    let candidate = if uri.starts_with('/') {
        let host = header_str(headers, X_FORWARDED_HOST)
            .and_then(first_list_item)
            .ok_or(ForwardedUriError::MissingHeader("X-Forwarded-Host"))?;
        let proto = header_str(headers, X_FORWARDED_PROTO)
            .and_then(first_list_item)
            .unwrap_or("https");
        format!("{}://{}{}", proto, host, uri)
    } else {
        uri.to_string()
    };

    let url = Url::parse(&candidate).map_err(|e| ForwardedUriError::Invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ForwardedUriError::Invalid(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ForwardedUriError::Invalid("missing host".to_string()));
    }

    Ok(url)
}

/// Lower-cased host of a URL, without port
pub fn url_host(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_ascii_lowercase()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn first_list_item(value: &str) -> Option<&str> {
    value.split(',').map(str::trim).find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_absolute_forwarded_uri() {
        let h = headers(&[("x-forwarded-uri", "https://app.example.com/secret?a=1")]);
        let url = extract_forwarded_url(&h).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/secret?a=1");
        assert_eq!(url.path(), "/secret");
    }

    #[test]
    fn test_path_only_forwarded_uri() {
        let h = headers(&[
            ("x-forwarded-uri", "/_oauth?code=abc&state=xyz"),
            ("x-forwarded-host", "auth.example.com"),
            ("x-forwarded-proto", "http"),
        ]);
        let url = extract_forwarded_url(&h).unwrap();
        assert_eq!(url.as_str(), "http://auth.example.com/_oauth?code=abc&state=xyz");
    }

    #[test]
    fn test_path_only_defaults_to_https() {
        let h = headers(&[
            ("x-forwarded-uri", "/"),
            ("x-forwarded-host", "app.example.com, proxy.internal"),
        ]);
        let url = extract_forwarded_url(&h).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn test_missing_headers() {
        let h = HeaderMap::new();
        assert_eq!(
            extract_forwarded_url(&h),
            Err(ForwardedUriError::MissingHeader("X-Forwarded-Uri"))
        );

        let h = headers(&[("x-forwarded-uri", "/secret")]);
        assert_eq!(
            extract_forwarded_url(&h),
            Err(ForwardedUriError::MissingHeader("X-Forwarded-Host"))
        );
    }

    #[test]
    fn test_unparseable_uri() {
        let h = headers(&[("x-forwarded-uri", "not a url")]);
        assert!(matches!(
            extract_forwarded_url(&h),
            Err(ForwardedUriError::Invalid(_))
        ));

        let h = headers(&[("x-forwarded-uri", "ftp://files.example.com/x")]);
        assert!(matches!(
            extract_forwarded_url(&h),
            Err(ForwardedUriError::Invalid(_))
        ));
    }

    #[test]
    fn test_url_host() {
        let url = Url::parse("https://App.Example.com:8443/x").unwrap();
        assert_eq!(url_host(&url), "app.example.com");
    }
}
