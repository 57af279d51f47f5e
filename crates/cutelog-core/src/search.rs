//! Message text search

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the query text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Substring match
    #[default]
    Plain,
    /// Regular expression, matched anywhere in the message
    Regex,
    /// `*` and `?` wildcards, matched against the whole message
    Wildcard,
}

/// A compiled message search.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    query: String,
    mode: SearchMode,
    case_sensitive: bool,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Pattern(Regex),
}

impl SearchFilter {
    /// Compile a search. Fails only for an invalid regular expression.
    pub fn new(query: impl Into<String>, mode: SearchMode, case_sensitive: bool) -> Result<Self> {
        let query = query.into();
        let matcher = match mode {
            SearchMode::Plain => Matcher::Substring(if case_sensitive {
                query.clone()
            } else {
                query.to_lowercase()
            }),
            SearchMode::Regex => Matcher::Pattern(build_regex(&query, case_sensitive)?),
            SearchMode::Wildcard => {
                Matcher::Pattern(build_regex(&wildcard_to_regex(&query), case_sensitive)?)
            }
        };
        Ok(Self {
            query,
            mode,
            case_sensitive,
            matcher,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Whether `message` satisfies the search. A missing message never does.
    pub fn matches(&self, message: Option<&str>) -> bool {
        let Some(message) = message else {
            return false;
        };
        match &self.matcher {
            Matcher::Substring(needle) if self.case_sensitive => message.contains(needle.as_str()),
            Matcher::Substring(needle) => message.to_lowercase().contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(message),
        }
    }
}

fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| Error::invalid_pattern(e.to_string()))
}

/// Translate a wildcard pattern into an anchored regex
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}
