//! Query matcher — compiles a search query under a comparison mode and
//! scans text for non-overlapping match ranges.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Comparison mode for a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// Case-sensitive when the query contains an uppercase character,
    /// case-insensitive otherwise. Decided once per query.
    #[default]
    SmartCase,
    CaseSensitive,
    CaseInsensitive,
    /// Query compiled as a regular expression, case-sensitive.
    CaseSensitiveRegex,
}

/// A compiled query. Compilation never fails: an empty query or an
/// unparsable regex compiles to a matcher that yields nothing.
#[derive(Debug, Clone)]
pub struct Matcher {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    /// Nothing ever matches.
    Never,
    Literal { needle: String, fold: bool },
    Pattern(regex::Regex),
}

impl Matcher {
    /// Compiles `query` under `kind`.
    pub fn new(query: &str, kind: MatcherKind) -> Self {
        if query.is_empty() {
            return Self { inner: Inner::Never };
        }
        let inner = match kind {
            MatcherKind::CaseSensitive => Inner::Literal {
                needle: query.to_string(),
                fold: false,
            },
            MatcherKind::CaseInsensitive => Inner::Literal {
                needle: query.to_lowercase(),
                fold: true,
            },
            MatcherKind::SmartCase => {
                let sensitive = query.chars().any(char::is_uppercase);
                Inner::Literal {
                    needle: if sensitive {
                        query.to_string()
                    } else {
                        query.to_lowercase()
                    },
                    fold: !sensitive,
                }
            }
            MatcherKind::CaseSensitiveRegex => match regex::Regex::new(query) {
                Ok(re) => Inner::Pattern(re),
                // Invalid pattern reads as "no matches", never an error.
                Err(err) => {
                    log::debug!("unparsable regex query: {err}");
                    Inner::Never
                }
            },
        };
        Self { inner }
    }

    /// Whether this matcher can ever produce a match.
    pub const fn is_never(&self) -> bool {
        matches!(self.inner, Inner::Never)
    }

    /// All non-overlapping matches in `haystack`, as half-open byte ranges
    /// into the original string, earliest first. Zero-length regex matches
    /// are dropped; the scan still advances past them.
    pub fn find_all(&self, haystack: &str) -> Vec<Range<usize>> {
        match &self.inner {
            Inner::Never => Vec::new(),
            Inner::Literal {
                needle,
                fold: false,
            } => find_literal(haystack, needle, None),
            Inner::Literal { needle, fold: true } => {
                let (folded, map) = fold_text(haystack);
                find_literal(&folded, needle, Some(&map))
            }
            Inner::Pattern(re) => re
                .find_iter(haystack)
                .filter(|m| m.start() < m.end())
                .map(|m| m.start()..m.end())
                .collect(),
        }
    }
}

/// Scan for literal occurrences of `needle`. When `map` is given the scan
/// runs over folded text and ranges are projected back onto the original
/// string's byte offsets.
#[expect(
    clippy::string_slice,
    reason = "find() returns byte positions on char boundaries"
)]
fn find_literal(haystack: &str, needle: &str, map: Option<&[usize]>) -> Vec<Range<usize>> {
    debug_assert!(!needle.is_empty());
    let mut out = Vec::new();
    let mut at = 0;
    while at <= haystack.len() {
        let Some(pos) = haystack[at..].find(needle) else {
            break;
        };
        let start = at + pos;
        let end = start + needle.len();
        match map {
            None => out.push(start..end),
            Some(map) => {
                let (orig_start, orig_end) = (map[start], map[end]);
                // A char that folds to several chars can produce a span
                // ending inside the fold; such a span is unmappable.
                if orig_start < orig_end {
                    out.push(orig_start..orig_end);
                }
            }
        }
        // Non-overlapping: resume past the match.
        at = end;
    }
    out
}

/// Lowercase `text`, returning the folded string and a map from each folded
/// byte offset (plus one-past-the-end) back to the original byte offset of
/// the char it came from.
fn fold_text(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut map = Vec::with_capacity(text.len() + 1);
    for (orig, ch) in text.char_indices() {
        for low in ch.to_lowercase() {
            let before = folded.len();
            folded.push(low);
            map.resize(folded.len(), orig);
            debug_assert!(map.len() > before);
        }
    }
    map.push(text.len());
    (folded, map)
}
