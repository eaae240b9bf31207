use crate::request::HttpRequest;
use crate::router::path::template_matches;
use crate::router::route::Requirements;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether the current request satisfies a set of requirements.
pub trait RequestMatcher: Send + Sync + std::fmt::Debug {
    fn does_match(&self, requirements: &Requirements) -> bool;
}

pub const PATH: &str = "path";
pub const METHOD: &str = "method";
pub const SCHEME: &str = "scheme";
pub const HOST: &str = "host";
pub const HEADER_PREFIX: &str = "header.";

/// Host requirement patterns compiled ahead of matching, keyed by the
/// pattern as written in the requirements.
#[derive(Debug, Clone, Default)]
pub struct HostPatterns {
    compiled: HashMap<String, Regex>,
}

impl HostPatterns {
    /// Compiles `pattern` unless it is already known.
    pub fn insert(&mut self, pattern: &str) -> Result<(), regex::Error> {
        if !self.compiled.contains_key(pattern) {
            let regex = compile_host_pattern(pattern)?;
            self.compiled.insert(pattern.to_string(), regex);
        }
        Ok(())
    }

    pub fn get(&self, pattern: &str) -> Option<&Regex> {
        self.compiled.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Matches requirements against one inbound [`HttpRequest`].
///
/// All requirements must hold. Unknown requirement keys never match.
#[derive(Debug, Clone)]
pub struct HttpRequestMatcher {
    request: HttpRequest,
    host_patterns: Arc<HostPatterns>,
}

impl HttpRequestMatcher {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            host_patterns: Arc::default(),
        }
    }

    /// Reuses host patterns compiled at config load.
    pub fn with_host_patterns(mut self, host_patterns: Arc<HostPatterns>) -> Self {
        self.host_patterns = host_patterns;
        self
    }

    fn host_matches(&self, pattern: &str, host: &str) -> bool {
        if let Some(regex) = self.host_patterns.get(pattern) {
            return regex.is_match(host);
        }

        match compile_host_pattern(pattern) {
            Ok(regex) => regex.is_match(host),
            Err(err) => {
                warn!("Invalid host pattern `{}`: {}", pattern, err);
                false
            }
        }
    }

    fn requirement_holds(&self, key: &str, expected: &str) -> bool {
        match key {
            PATH => template_matches(expected, self.request.path()),
            METHOD => one_of(expected, self.request.method()),
            SCHEME => one_of(expected, self.request.scheme()),
            HOST => match self.request.host() {
                Some(host) => self.host_matches(expected, host),
                None => false,
            },
            _ => match key.strip_prefix(HEADER_PREFIX) {
                Some(name) => match self.request.header(name) {
                    Some(_) if expected == "*" => true,
                    Some(value) => value == expected,
                    None => false,
                },
                None => {
                    debug!("Unknown requirement `{}`, treating as no match", key);
                    false
                }
            },
        }
    }
}

impl RequestMatcher for HttpRequestMatcher {
    fn does_match(&self, requirements: &Requirements) -> bool {
        requirements
            .iter()
            .all(|(key, expected)| self.requirement_holds(key, expected))
    }
}

/// `GET|POST` style alternatives, compared case-insensitively.
fn one_of(alternatives: &str, actual: &str) -> bool {
    alternatives
        .split('|')
        .map(str::trim)
        .any(|candidate| candidate.eq_ignore_ascii_case(actual))
}

/// Anchors a host pattern so it has to match the whole host.
pub fn compile_host_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}
