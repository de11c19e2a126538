use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors from compiling a `/pattern/flags` query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid pattern /{pattern}/: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown regex flag '{0}'")]
    UnknownFlag(char),
}

#[derive(Clone)]
enum Matcher {
    /// Plain, case-sensitive substring
    Literal(String),
    /// Query written as `/pattern/flags`
    Pattern(Regex),
}

/// Compiled search or filter query
///
/// A query of the form `/pattern/flags` with a non-empty pattern is a regular
/// expression; anything else is matched as a literal substring.
#[derive(Clone)]
pub struct Query {
    /// Original query string
    text: String,

    matcher: Matcher,
}

impl Query {
    /// Compile a query. Empty text means "no query" and yields `None`.
    pub fn parse(text: &str) -> Result<Option<Self>, QueryError> {
        if text.is_empty() {
            return Ok(None);
        }

        let matcher = match split_pattern(text) {
            Some((pattern, flags)) => Matcher::Pattern(build_regex(pattern, flags)?),
            None => Matcher::Literal(text.to_string()),
        };

        Ok(Some(Self {
            text: text.to_string(),
            matcher,
        }))
    }

    /// Check if a line matches
    pub fn matches(&self, line: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(needle) => line.contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(line),
        }
    }

    /// Find all match positions in a line (for highlighting)
    pub fn find_matches(&self, line: &str) -> Vec<(usize, usize)> {
        match &self.matcher {
            Matcher::Literal(needle) => line
                .match_indices(needle.as_str())
                .map(|(start, m)| (start, start + m.len()))
                .collect(),
            Matcher::Pattern(re) => re.find_iter(line).map(|m| (m.start(), m.end())).collect(),
        }
    }

    /// Get the original query text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.matcher, Matcher::Pattern(_))
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("text", &self.text)
            .field("regex", &self.is_regex())
            .finish()
    }
}

/// Split `/pattern/flags` on its last slash. Returns `None` when the text is
/// not in that form or the pattern is empty.
fn split_pattern(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let pattern = &rest[..end];
    if pattern.is_empty() {
        return None;
    }
    Some((pattern, &rest[end + 1..]))
}

fn build_regex(pattern: &str, flags: &str) -> Result<Regex, QueryError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // Global, sticky, unicode and index flags have no effect on a
            // yes/no match against a single line
            'g' | 'y' | 'u' | 'v' | 'd' => {}
            other => return Err(QueryError::UnknownFlag(other)),
        }
    }

    builder.build().map_err(|source| QueryError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}
