// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use enum_dispatch::enum_dispatch;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Trait for deciding whether a single input line is selected
#[enum_dispatch]
pub trait Matcher {
    /// Tests whether the given line satisfies the configured pattern
    ///
    /// # Arguments
    /// * `line` - The line to test, without its trailing newline
    ///
    /// # Returns
    /// * `true` - Line is selected and should be dispatched downstream
    /// * `false` - Line is not selected
    fn matches(&self, line: &str) -> bool;
}

/// Literal substring matcher with case sensitivity control
///
/// Case-insensitive matching lowercases both needle and line (Unicode case
/// folding, not locale-aware). The needle is folded once at construction so
/// the per-line cost is a single containment scan.
#[derive(Debug)]
pub struct SubstringMatcher {
    needle: String,
    fold_case: bool,
}

impl SubstringMatcher {
    pub fn new(pattern: String, ignore_case: bool) -> Self {
        let needle = if ignore_case {
            pattern.to_lowercase()
        } else {
            pattern
        };

        Self {
            needle,
            fold_case: ignore_case,
        }
    }
}

impl Matcher for SubstringMatcher {
    fn matches(&self, line: &str) -> bool {
        if self.fold_case {
            line.to_lowercase().contains(&self.needle)
        } else {
            line.contains(&self.needle)
        }
    }
}

/// Regex-based matcher with case sensitivity control
///
/// The pattern is compiled once at construction; case-insensitivity is
/// achieved by prepending the inline `(?i)` modifier to the pattern source.
#[derive(Debug)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: String, ignore_case: bool) -> Result<Self, PatternError> {
        let regex_pattern = if ignore_case {
            format!("(?i){}", pattern)
        } else {
            pattern.clone()
        };

        let regex = Regex::new(&regex_pattern)
            .map_err(|source| PatternError::InvalidRegex { pattern, source })?;

        Ok(Self { regex })
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Matcher that negates the decision of an inner matcher
#[derive(Debug)]
pub struct InvertMatcher {
    inner: Box<LineMatcher>,
}

impl InvertMatcher {
    pub fn new(inner: LineMatcher) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Matcher for InvertMatcher {
    fn matches(&self, line: &str) -> bool {
        !self.inner.matches(line)
    }
}

/// Enum dispatch for the matcher implementations
#[enum_dispatch(Matcher)]
#[derive(Debug)]
pub enum LineMatcher {
    Substring(SubstringMatcher),
    Regex(RegexMatcher),
    Invert(InvertMatcher),
}

impl LineMatcher {
    /// Creates a new LineMatcher from CLI arguments
    ///
    /// # Arguments
    /// * `pattern` - Pattern source, a literal substring unless `use_regex` is set
    /// * `use_regex` - Compile the pattern as a regular expression
    /// * `ignore_case` - Case-insensitive matching
    /// * `invert` - Select lines that do NOT match
    ///
    /// # Returns
    /// * `Ok(LineMatcher)` - Successfully created matcher
    /// * `Err(PatternError)` - Invalid regex pattern
    pub fn from_args(
        pattern: String,
        use_regex: bool,
        ignore_case: bool,
        invert: bool,
    ) -> Result<Self, PatternError> {
        let base_matcher = if use_regex {
            LineMatcher::Regex(RegexMatcher::new(pattern, ignore_case)?)
        } else {
            LineMatcher::Substring(SubstringMatcher::new(pattern, ignore_case))
        };

        if invert {
            Ok(LineMatcher::Invert(InvertMatcher::new(base_matcher)))
        } else {
            Ok(base_matcher)
        }
    }
}
