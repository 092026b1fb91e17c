// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use url::{ParseError, Url};

/// Derive the lowercase host of a URL.
///
/// URLs without a scheme (`example.com/path`) are read as `http://`. When no
/// host can be derived the whole input, lowercased, is used as the domain.
/// This never fails.
pub fn extract_domain(url: &str) -> String {
    let trimmed = url.trim();

    let with_http = || Url::parse(&format!("http://{}", trimmed)).ok();
    let parsed = match Url::parse(trimmed) {
        // `host:port/path` parses with the host as its scheme
        Ok(parsed) if parsed.host_str().is_none() && !trimmed.contains("://") => with_http(),
        Ok(parsed) => Some(parsed),
        Err(ParseError::RelativeUrlWithoutBase) => with_http(),
        Err(_) => None,
    };

    match parsed.as_ref().and_then(|u| u.host_str()) {
        Some(host) if !host.is_empty() => host.trim_end_matches('.').to_lowercase(),
        _ => trimmed.to_lowercase(),
    }
}

/// Whether `domain` is `parent` itself or one of its subdomains.
pub fn is_same_or_subdomain(domain: &str, parent: &str) -> bool {
    domain == parent
        || domain
            .strip_suffix(parent)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain_lowercases_host() {
        assert_eq!(extract_domain("http://www.FACEBOOK.com/x"), "www.facebook.com");
        assert_eq!(extract_domain("https://Example.org:8443/a?b=c"), "example.org");
    }

    #[test]
    fn test_extract_domain_without_scheme() {
        assert_eq!(extract_domain("facebook.com/feed"), "facebook.com");
        assert_eq!(extract_domain("  news.example.com  "), "news.example.com");
        assert_eq!(extract_domain("facebook.com:443/feed"), "facebook.com");
        assert_eq!(extract_domain("WWW.Facebook.com:8080"), "www.facebook.com");
        assert_eq!(extract_domain("localhost:3000/app"), "localhost");
    }

    #[test]
    fn test_extract_domain_strips_userinfo_and_trailing_dot() {
        assert_eq!(extract_domain("http://user:pw@Host.example.com./"), "host.example.com");
    }

    #[test]
    fn test_extract_domain_malformed_falls_back_to_input() {
        assert_eq!(extract_domain("http://"), "http://");
        assert_eq!(extract_domain("NOT A URL"), "not a url");
        assert_eq!(extract_domain(""), "");
    }

    #[test]
    fn test_is_same_or_subdomain() {
        assert!(is_same_or_subdomain("x.com", "x.com"));
        assert!(is_same_or_subdomain("mobile.x.com", "x.com"));
        assert!(!is_same_or_subdomain("box.com", "x.com"));
        assert!(!is_same_or_subdomain("com", "x.com"));
    }
}
