//! Placeholder types for route patterns.
//!
//! A placeholder is a bracketed token such as `[i:id]` inside a route pattern.
//! Its type decides what the generated capture group accepts.
//!
//! # Built-in types
//!
//! | Type        | Regex               | Matches                                 |
//! |-------------|---------------------|-----------------------------------------|
//! | (none)      | `[^/]+?`            | one path segment                        |
//! | `i`         | `[0-9]+`            | digits                                  |
//! | `a`         | `[0-9A-Za-z]+`      | letters and digits                      |
//! | `h`         | `[0-9A-Fa-f]+`      | hex digits                              |
//! | `s`         | `[0-9A-Za-z_-]+`    | slugs                                   |
//! | `*`         | `.+?`               | anything, across `/`, as little as possible |
//! | `**`        | `.+`                | anything, across `/`, the whole rest    |
//! | `a\|b\|...` | `a\|b\|...`         | one of the listed literals              |

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use switchyard_core::{SwitchyardError, SwitchyardResult};

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("placeholder name regex is valid")
});

/// What a placeholder accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// A single path segment, no `/`.
    Segment,
    /// One or more digits.
    Integer,
    /// One or more ASCII letters or digits.
    Alphanumeric,
    /// One or more hex digits.
    Hex,
    /// Letters, digits, `_` and `-`.
    Slug,
    /// Anything, including `/`, matched lazily.
    Wildcard,
    /// Anything, including `/`, matched to the end.
    GreedyWildcard,
    /// Exactly one of the listed literals.
    Alternation(Vec<String>),
}

impl PlaceholderKind {
    /// Resolves the type part of a placeholder token.
    ///
    /// Anything that is not a built-in type code is read as a `|`-separated
    /// list of literals.
    pub fn from_type(type_code: &str) -> SwitchyardResult<Self> {
        Ok(match type_code {
            "" => Self::Segment,
            "i" => Self::Integer,
            "a" => Self::Alphanumeric,
            "h" => Self::Hex,
            "s" => Self::Slug,
            "*" => Self::Wildcard,
            "**" => Self::GreedyWildcard,
            other => {
                let literals: Vec<String> = other.split('|').map(String::from).collect();
                if literals.iter().any(String::is_empty) {
                    return Err(SwitchyardError::invalid_pattern(
                        other,
                        "empty alternative in placeholder type",
                    ));
                }
                Self::Alternation(literals)
            }
        })
    }

    /// Returns the regex fragment for this kind.
    pub fn regex(&self) -> String {
        match self {
            Self::Segment => "[^/]+?".to_string(),
            Self::Integer => "[0-9]+".to_string(),
            Self::Alphanumeric => "[0-9A-Za-z]+".to_string(),
            Self::Hex => "[0-9A-Fa-f]+".to_string(),
            Self::Slug => "[0-9A-Za-z_-]+".to_string(),
            Self::Wildcard => ".+?".to_string(),
            Self::GreedyWildcard => ".+".to_string(),
            Self::Alternation(literals) => literals
                .iter()
                .map(|l| regex::escape(l))
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// The character that introduces a placeholder, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Nothing precedes the placeholder.
    None,
    /// A `/` precedes the placeholder.
    Slash,
    /// A `.` precedes the placeholder.
    Dot,
}

impl Separator {
    /// Returns the separator text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Slash => "/",
            Self::Dot => ".",
        }
    }

    pub(crate) const fn from_char(c: char) -> Self {
        match c {
            '/' => Self::Slash,
            '.' => Self::Dot,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placeholder parsed out of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The capture name. `None` for an unnamed, non-capturing placeholder.
    pub name: Option<String>,
    /// What the placeholder accepts.
    pub kind: PlaceholderKind,
    /// Byte offset of the opening `[` in the pattern.
    pub position: usize,
    /// The separator folded into this placeholder.
    pub separator: Separator,
    /// Whether a trailing `?` made the placeholder (and its separator) optional.
    pub optional: bool,
    /// Byte range of the whole token in the pattern: separator, brackets, and `?`.
    pub span: (usize, usize),
}

impl Placeholder {
    /// Parses the text between `[` and `]`.
    ///
    /// `[type:name]` gives a typed placeholder, `[name]` a free segment, and an
    /// empty name (`[i:]`) an unnamed one.
    pub(crate) fn parse_inner(
        pattern: &str,
        inner: &str,
    ) -> SwitchyardResult<(Option<String>, PlaceholderKind)> {
        if inner.contains('.') {
            return Err(SwitchyardError::invalid_pattern(
                pattern,
                format!("'.' is not allowed inside placeholder [{inner}]"),
            ));
        }
        let (type_code, name) = inner.rsplit_once(':').unwrap_or(("", inner));
        if !name.is_empty() && !NAME_RE.is_match(name) {
            return Err(SwitchyardError::invalid_pattern(
                pattern,
                format!("invalid placeholder name '{name}'"),
            ));
        }
        let kind = PlaceholderKind::from_type(type_code)
            .map_err(|_| SwitchyardError::invalid_pattern(pattern, format!("invalid placeholder type '{type_code}'")))?;
        let name = (!name.is_empty()).then(|| name.to_string());
        Ok((name, kind))
    }

    /// Returns the regex fragment for this placeholder, separator and optional marker included.
    pub fn regex(&self) -> String {
        let group = self.name.as_ref().map_or_else(
            || format!("(?:{})", self.kind.regex()),
            |name| format!("(?P<{name}>{})", self.kind.regex()),
        );
        let sep = regex::escape(self.separator.as_str());
        let optional = if self.optional { "?" } else { "" };
        format!("(?:{sep}{group}){optional}")
    }
}
