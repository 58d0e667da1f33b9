use url::{Host, Url};

use crate::errors::ValidationError;

/// A raw URL string together with its parsed components.
///
/// Lives only for the duration of one validation call.
#[derive(Debug, Clone)]
pub struct UrlCandidate<'a> {
    raw: &'a str,
    url: Url,
}

impl<'a> UrlCandidate<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, ValidationError> {
        let url = Url::parse(raw)?;
        Ok(Self { raw, url })
    }

    /// The input exactly as received.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Parsed host, distinguishing domains from literal IPv4/IPv6 addresses.
    pub fn host(&self) -> Option<Host<&str>> {
        self.url.host()
    }

    /// Serialized host (IPv6 literals keep their brackets).
    pub fn host_str(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_components() {
        let c = UrlCandidate::parse("https://Example.com:8443/a/b?x=1&y=2#frag").unwrap();
        assert_eq!(c.raw(), "https://Example.com:8443/a/b?x=1&y=2#frag");
        assert_eq!(c.scheme(), "https");
        assert_eq!(c.host_str(), Some("example.com"));
        assert_eq!(c.port(), Some(8443));
        assert_eq!(c.path(), "/a/b");
        assert_eq!(c.query(), Some("x=1&y=2"));
    }

    #[test]
    fn literal_ip_hosts() {
        let c = UrlCandidate::parse("http://192.168.1.1/admin").unwrap();
        assert!(matches!(c.host(), Some(Host::Ipv4(_))));
        let c = UrlCandidate::parse("http://[::1]:8080/").unwrap();
        assert!(matches!(c.host(), Some(Host::Ipv6(_))));
        assert_eq!(c.host_str(), Some("[::1]"));
    }

    #[test]
    fn rejects_relative_input() {
        assert!(matches!(
            UrlCandidate::parse("not a url"),
            Err(ValidationError::Parse(_))
        ));
    }

    #[test]
    fn opaque_urls_have_no_host() {
        let c = UrlCandidate::parse("mailto:someone@example.com").unwrap();
        assert_eq!(c.scheme(), "mailto");
        assert!(c.host().is_none());
    }
}
