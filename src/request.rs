use anyhow::{anyhow, bail, Context};
use std::collections::BTreeMap;
use url::Url;

const ORIGIN_BASE: &str = "http://localhost";

/// The parts of an inbound request that routing looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    scheme: String,
    host: Option<String>,
    path: String,
    // Keyed by lower-cased header name
    headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        HttpRequest {
            method: method.to_ascii_uppercase(),
            scheme: "http".to_string(),
            host: None,
            path: path.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Builds a request from a method and a target.
    ///
    /// The target is either an absolute URL (`https://example.com/users/42`)
    /// or an origin-form path (`/users/42`).
    pub fn parse(method: &str, target: &str) -> anyhow::Result<Self> {
        if method.is_empty() {
            bail!("Empty request method");
        }

        if target.starts_with('/') {
            // Resolve against a placeholder origin to drop query and fragment.
            let url = Url::parse(ORIGIN_BASE)?
                .join(target)
                .with_context(|| format!("Invalid request target `{}`", target))?;
            return Ok(HttpRequest::new(method, url.path()));
        }

        let url = Url::parse(target).with_context(|| format!("Invalid request target `{}`", target))?;
        let mut request = HttpRequest::new(method, url.path()).with_scheme(url.scheme());
        if let Some(host) = url.host_str() {
            request = request.with_host(host);
        }
        Ok(request)
    }

    /// Parses a `METHOD TARGET` line, e.g. `GET /users/42`.
    pub fn from_request_line(line: &str) -> anyhow::Result<Self> {
        let mut parts = line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| anyhow!("Empty request line"))?;
        let target = parts
            .next()
            .ok_or_else(|| anyhow!("Missing request target in `{}`", line))?;
        if parts.next().is_some() {
            bail!("Unexpected trailing data in request line `{}`", line);
        }
        HttpRequest::parse(method, target)
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_ascii_lowercase();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Adds a header. A `Host` header supplies the host when none is set.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "host" && self.host.is_none() {
            let host = strip_port(value.trim());
            if !host.is_empty() {
                self.host = Some(host.to_ascii_lowercase());
            }
        }
        self.headers.insert(name, value);
        self
    }

    /// Parses a `Name: value` header line and adds it.
    pub fn with_raw_header(self, raw: &str) -> anyhow::Result<Self> {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid header `{}`, expected `Name: value`", raw))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid header `{}`, empty name", raw);
        }
        Ok(self.with_header(name, value.trim()))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// `example.com:8080` -> `example.com`, `[::1]:80` -> `[::1]`.
fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin_form() {
        let request = HttpRequest::parse("get", "/users/42").unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.scheme(), "http");
        assert_eq!(request.host(), None);
        assert_eq!(request.path(), "/users/42");
    }

    #[test]
    fn test_parse_origin_form_drops_query_and_fragment() {
        let request = HttpRequest::parse("GET", "/users?page=2").unwrap();
        assert_eq!(request.path(), "/users");

        let request = HttpRequest::parse("GET", "/users/42?x=1#top").unwrap();
        assert_eq!(request.path(), "/users/42");
        assert_eq!(request.host(), None);
        assert_eq!(request.scheme(), "http");
    }

    #[test]
    fn test_host_header_supplies_host() {
        let request = HttpRequest::parse("GET", "/api")
            .unwrap()
            .with_raw_header("Host: API.example.com:8080")
            .unwrap();
        assert_eq!(request.host(), Some("api.example.com"));
        assert_eq!(request.header("host"), Some("API.example.com:8080"));

        let ipv6 = HttpRequest::new("GET", "/").with_header("Host", "[::1]:80");
        assert_eq!(ipv6.host(), Some("[::1]"));
    }

    #[test]
    fn test_url_host_wins_over_host_header() {
        let request = HttpRequest::parse("GET", "https://api.example.com/v1")
            .unwrap()
            .with_header("Host", "other.example.com");
        assert_eq!(request.host(), Some("api.example.com"));
    }

    #[test]
    fn test_parse_absolute_url() {
        let request = HttpRequest::parse("POST", "https://Api.Example.com/v1/items?x=1").unwrap();
        assert_eq!(request.scheme(), "https");
        // url lower-cases the host
        assert_eq!(request.host(), Some("api.example.com"));
        assert_eq!(request.path(), "/v1/items");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(HttpRequest::parse("GET", "not a url").is_err());
        assert!(HttpRequest::parse("", "/").is_err());
    }

    #[test]
    fn test_request_line() {
        let request = HttpRequest::from_request_line("DELETE  /users/7").unwrap();
        assert_eq!(request.method(), "DELETE");
        assert_eq!(request.path(), "/users/7");

        assert!(HttpRequest::from_request_line("").is_err());
        assert!(HttpRequest::from_request_line("GET").is_err());
        assert!(HttpRequest::from_request_line("GET / extra").is_err());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = HttpRequest::new("GET", "/")
            .with_raw_header("X-Api-Version: 2")
            .unwrap();
        assert_eq!(request.header("x-api-version"), Some("2"));
        assert_eq!(request.header("X-API-VERSION"), Some("2"));
        assert!(HttpRequest::new("GET", "/").with_raw_header("broken").is_err());
    }
}
