use crate::errors::{Error, Result};
use crate::formats::{ExtractedUnit, Location};
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::ops::Range;

/// A search pattern compiled once per request.
///
/// Literal patterns are escaped and run through the same engine as regular
/// expressions, so both modes share the non-overlapping, leftmost-first,
/// left-to-right scan. Literal matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
    source: String,
    is_regex: bool,
}

/// One occurrence of a pattern inside an extracted unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    #[serde(flatten)]
    pub location: Location,
    /// Character offset of the match start within `line_content`.
    pub start: usize,
    /// Character offset one past the match end within `line_content`.
    pub end: usize,
    pub match_text: String,
    /// The full text of the line or cell.
    pub line_content: String,
    pub context_before: String,
    pub context_after: String,
}

impl SearchPattern {
    /// Compiles a pattern. An empty pattern or malformed regex is an
    /// [`Error::InvalidPattern`].
    pub fn new(pattern: &str, is_regex: bool) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern(
                "search pattern must not be empty".to_string(),
            ));
        }
        let regex = if is_regex {
            Regex::new(pattern)?
        } else {
            Regex::new(&regex::escape(pattern))?
        };
        Ok(Self {
            regex,
            source: pattern.to_string(),
            is_regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    /// Byte ranges of every match in `text`. Zero-width matches are skipped.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).filter(|m| !m.is_empty()).count()
    }

    /// Finds every match in a unit along with up to `context_chars` characters
    /// of surrounding text on each side. Offsets count characters, not bytes.
    pub fn find_matches(&self, unit: &ExtractedUnit, context_chars: usize) -> Vec<Match> {
        let text = unit.value.as_str();
        self.spans(text)
            .into_iter()
            .map(|span| {
                let before = &text[..span.start];
                let match_text = &text[span.clone()];
                let start = before.chars().count();
                Match {
                    location: unit.location.clone(),
                    start,
                    end: start + match_text.chars().count(),
                    match_text: match_text.to_string(),
                    line_content: text.to_string(),
                    context_before: last_chars(before, context_chars).to_string(),
                    context_after: first_chars(&text[span.end..], context_chars).to_string(),
                }
            })
            .collect()
    }

    /// Rewrites every match in `text`.
    ///
    /// Literal patterns insert `replacement` verbatim. Regex patterns expand
    /// `$1`, `${1}` and `${name}` against the match's groups.
    pub fn replace<'t>(&self, text: &'t str, replacement: &str) -> Cow<'t, str> {
        self.regex.replace_all(text, |caps: &Captures| {
            let whole = &caps[0];
            if whole.is_empty() {
                String::new()
            } else if self.is_regex {
                let mut expanded = String::new();
                caps.expand(replacement, &mut expanded);
                expanded
            } else {
                replacement.to_string()
            }
        })
    }

    /// Checks that every group a regex replacement refers to exists.
    pub fn validate_replacement(&self, replacement: &str) -> Result<()> {
        if !self.is_regex {
            return Ok(());
        }
        let group_count = self.regex.captures_len();
        let names: Vec<&str> = self.regex.capture_names().flatten().collect();

        let reference = Regex::new(r"\$\$|\$\{([^}]*)\}|\$([0-9A-Za-z_]+)")?;
        for cap in reference.captures_iter(replacement) {
            let Some(name) = cap.get(1).or_else(|| cap.get(2)).map(|m| m.as_str()) else {
                continue;
            };
            let exists = match name.parse::<usize>() {
                Ok(num) => num < group_count,
                Err(_) => names.contains(&name),
            };
            if !exists {
                return Err(Error::InvalidPattern(format!(
                    "replacement refers to missing capture group ${name}"
                )));
            }
        }
        Ok(())
    }
}

/// Case-insensitive keyword containment, used by the keyword search.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    // (as given, lowercase)
    keywords: Vec<(String, String)>,
}

impl KeywordSet {
    /// Blank keywords are dropped; an empty result is an [`Error::InvalidRequest`].
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self> {
        let keywords: Vec<(String, String)> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(|k| (k.to_string(), k.to_lowercase()))
            .collect();
        if keywords.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one keyword is required".to_string(),
            ));
        }
        Ok(Self { keywords })
    }

    /// Keywords contained in `value`, in the order they were given.
    pub fn matching<'a>(&'a self, value: &str) -> impl Iterator<Item = &'a str> + 'a {
        let haystack = value.to_lowercase();
        self.keywords
            .iter()
            .filter(move |(_, lower)| haystack.contains(lower.as_str()))
            .map(|(original, _)| original.as_str())
    }

    pub fn keywords(&self) -> Vec<&str> {
        self.keywords.iter().map(|(k, _)| k.as_str()).collect()
    }
}

fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn first_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
