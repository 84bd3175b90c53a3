//! Route pattern compilation and matching.
//!
//! [`RoutePattern::compile`] turns a pattern string into a matcher. Four forms
//! are recognized:
//!
//! - a catch-all: an empty pattern or `*`, which matches every path,
//! - a raw regex: `@` followed by a regular expression, searched unanchored,
//! - a negation: `!` followed by any other form, which matches when that form
//!   does not,
//! - a placeholder pattern such as `/users/[i:id]/[edit|show:action]?`, which is
//!   anchored to the whole path.
//!
//! Matching runs against the raw request path. Captured values are
//! percent-decoded afterwards; `+` is left alone.

use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;

use switchyard_core::{SwitchyardError, SwitchyardResult};

use super::placeholder::{Placeholder, Separator};

/// The marker that introduces a raw regex pattern.
pub const REGEX_MARKER: char = '@';

/// The marker that introduces a negated pattern.
pub const NEGATION_MARKER: char = '!';

/// The broad shape of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches every path.
    CatchAll,
    /// A placeholder pattern anchored to the whole path.
    Placeholders,
    /// A raw, unanchored regex.
    Regex,
    /// Matches when the inner pattern does not.
    Negated,
}

#[derive(Debug, Clone)]
enum Matcher {
    Always,
    Anchored(Regex),
    Search(Regex),
    Not(Box<Matcher>),
    // A negated regex scoped under a prefix: the path must start with the
    // prefix and the rest must not start with the inner regex.
    PrefixNot { prefix: String, inner: Regex },
}

impl Matcher {
    fn captures(&self, path: &str, tolerant: bool) -> Option<Vec<(String, String)>> {
        match self {
            Self::Always => Some(Vec::new()),
            Self::Anchored(regex) => {
                if tolerant && path.len() > 1 {
                    if let Some(stripped) = path.strip_suffix('/') {
                        if let Some(found) = named_captures(regex, stripped) {
                            return Some(found);
                        }
                    }
                }
                named_captures(regex, path)
            }
            Self::Search(regex) => named_captures(regex, path),
            Self::Not(inner) => match inner.captures(path, tolerant) {
                Some(_) => None,
                None => Some(Vec::new()),
            },
            Self::PrefixNot { prefix, inner } => path
                .strip_prefix(prefix.as_str())
                .filter(|rest| !inner.is_match(rest))
                .map(|_| Vec::new()),
        }
    }
}

fn named_captures(regex: &Regex, path: &str) -> Option<Vec<(String, String)>> {
    let caps = regex.captures(path)?;
    Some(
        regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), decode_segment(m.as_str())))
            })
            .collect(),
    )
}

/// Percent-decodes a captured value. `+` stays `+`.
pub fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// A compiled route pattern.
///
/// # Examples
///
/// ```
/// use switchyard_http::urls::pattern::RoutePattern;
///
/// let pattern = RoutePattern::compile("/users/[i:id]/[edit|show:action]?").unwrap();
/// let found = pattern.match_path("/users/42/edit").unwrap();
/// assert_eq!(found.get("id"), Some("42"));
/// assert_eq!(found.get("action"), Some("edit"));
///
/// assert!(pattern.match_path("/users/42").is_some());
/// assert!(pattern.match_path("/users/bob").is_none());
/// ```
#[derive(Clone)]
pub struct RoutePattern {
    raw: String,
    kind: PatternKind,
    matcher: Matcher,
    placeholders: Vec<Placeholder>,
    trailing_slash_tolerant: bool,
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePattern")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .field("regex", &self.regex_str())
            .field("placeholders", &self.placeholders.len())
            .finish()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The outcome of a successful match: decoded named captures in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    params: Vec<(String, String)>,
}

impl PathMatch {
    /// Returns the decoded value captured under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every capture in order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Consumes the match, returning its captures.
    pub fn into_params(self) -> Vec<(String, String)> {
        self.params
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl RoutePattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::InvalidPattern`] for an unterminated placeholder, an
    /// invalid placeholder name or type, or a regex that does not compile.
    pub fn compile(raw: &str) -> SwitchyardResult<Self> {
        let (kind, matcher, placeholders) = compile_matcher(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            kind,
            matcher,
            placeholders,
            trailing_slash_tolerant: true,
        })
    }

    /// Compiles `raw` as if it were registered under the namespace `prefix`.
    ///
    /// | Pattern        | Scoped form                                   |
    /// |----------------|-----------------------------------------------|
    /// | `@re`          | `@^<prefix><re>` (`.*` prepended unless `re` starts with `^`) |
    /// | `!@re`         | `@^<prefix>(?!<re>)`                          |
    /// | catch-all      | `@^<prefix>(/\|$)`                            |
    /// | `!pattern`     | `!<prefix><pattern>`                          |
    /// | anything else  | `<prefix><pattern>`                           |
    pub fn compile_scoped(prefix: &str, raw: &str) -> SwitchyardResult<Self> {
        if prefix.is_empty() {
            return Self::compile(raw);
        }
        let escaped = regex::escape(prefix);

        if is_catch_all(raw) {
            return Self::compile(&format!("{REGEX_MARKER}^{escaped}(/|$)"));
        }

        let (negated, body) = raw
            .strip_prefix(NEGATION_MARKER)
            .map_or((false, raw), |rest| (true, rest));

        let Some(re) = body.strip_prefix(REGEX_MARKER) else {
            let scoped = if negated {
                format!("{NEGATION_MARKER}{prefix}{body}")
            } else {
                format!("{prefix}{body}")
            };
            return Self::compile(&scoped);
        };

        let re = re
            .strip_prefix('^')
            .map_or_else(|| format!(".*{re}"), String::from);

        if !negated {
            return Self::compile(&format!("{REGEX_MARKER}^{escaped}{re}"));
        }

        let inner = Regex::new(&format!("^(?:{re})"))
            .map_err(|e| SwitchyardError::invalid_pattern(raw, e.to_string()))?;
        Ok(Self {
            raw: format!("{REGEX_MARKER}^{escaped}(?!{re})"),
            kind: PatternKind::Negated,
            matcher: Matcher::PrefixNot {
                prefix: prefix.to_string(),
                inner,
            },
            placeholders: Vec::new(),
            trailing_slash_tolerant: true,
        })
    }

    /// Sets whether a single trailing `/` on the path is ignored.
    #[must_use]
    pub const fn with_trailing_slash_tolerance(mut self, tolerant: bool) -> Self {
        self.trailing_slash_tolerant = tolerant;
        self
    }

    /// Returns the pattern as it was written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the pattern kind.
    pub const fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Returns `true` for the universal catch-all.
    pub fn is_catch_all(&self) -> bool {
        self.kind == PatternKind::CatchAll
    }

    /// Returns `true` for raw regex and negated patterns.
    pub fn is_regex_like(&self) -> bool {
        matches!(self.kind, PatternKind::Regex | PatternKind::Negated)
    }

    /// Returns the placeholders in pattern order.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Returns the generated regex source, if the pattern has one.
    pub fn regex_str(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Anchored(r) | Matcher::Search(r) => Some(r.as_str()),
            Matcher::Not(inner) => match inner.as_ref() {
                Matcher::Anchored(r) | Matcher::Search(r) => Some(r.as_str()),
                _ => None,
            },
            Matcher::Always | Matcher::PrefixNot { .. } => None,
        }
    }

    /// Matches `path`, returning the decoded captures on success.
    pub fn match_path(&self, path: &str) -> Option<PathMatch> {
        self.matcher
            .captures(path, self.trailing_slash_tolerant)
            .map(|params| PathMatch { params })
    }

    /// Returns `true` if `path` matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }
}

/// Returns `true` for patterns that match everything: empty or `*`.
pub fn is_catch_all(raw: &str) -> bool {
    raw.is_empty() || raw == "*"
}

fn compile_matcher(raw: &str) -> SwitchyardResult<(PatternKind, Matcher, Vec<Placeholder>)> {
    if is_catch_all(raw) {
        return Ok((PatternKind::CatchAll, Matcher::Always, Vec::new()));
    }
    if let Some(rest) = raw.strip_prefix(NEGATION_MARKER) {
        let (_, inner, _) = compile_matcher(rest)?;
        return Ok((PatternKind::Negated, Matcher::Not(Box::new(inner)), Vec::new()));
    }
    if let Some(re) = raw.strip_prefix(REGEX_MARKER) {
        let regex =
            Regex::new(re).map_err(|e| SwitchyardError::invalid_pattern(raw, e.to_string()))?;
        return Ok((PatternKind::Regex, Matcher::Search(regex), Vec::new()));
    }

    let (source, placeholders) = parse_placeholders(raw)?;
    let regex =
        Regex::new(&source).map_err(|e| SwitchyardError::invalid_pattern(raw, e.to_string()))?;
    Ok((PatternKind::Placeholders, Matcher::Anchored(regex), placeholders))
}

/// Scans a placeholder pattern into an anchored regex source and its placeholders.
fn parse_placeholders(raw: &str) -> SwitchyardResult<(String, Vec<Placeholder>)> {
    let mut source = String::from("^");
    let mut placeholders = Vec::new();
    let mut offset = 0;

    while offset < raw.len() {
        let remaining = &raw[offset..];
        let Some(rel_start) = remaining.find('[') else {
            push_literal(&mut source, remaining);
            break;
        };
        let start = offset + rel_start;
        let mut literal = &raw[offset..start];

        // A `/` or `.` right before the bracket belongs to the placeholder.
        let separator = literal
            .chars()
            .last()
            .map_or(Separator::None, Separator::from_char);
        if separator != Separator::None {
            literal = &literal[..literal.len() - 1];
        }
        push_literal(&mut source, literal);

        let end = raw[start..]
            .find(']')
            .ok_or_else(|| SwitchyardError::invalid_pattern(raw, "unterminated placeholder"))?
            + start;
        let inner = &raw[start + 1..end];
        if inner.contains('[') {
            return Err(SwitchyardError::invalid_pattern(raw, "nested '[' in placeholder"));
        }
        let (name, kind) = Placeholder::parse_inner(raw, inner)?;

        let optional = raw[end + 1..].starts_with('?');
        let token_end = if optional { end + 2 } else { end + 1 };
        let token_start = if separator == Separator::None { start } else { start - 1 };

        let placeholder = Placeholder {
            name,
            kind,
            position: start,
            separator,
            optional,
            span: (token_start, token_end),
        };
        source.push_str(&placeholder.regex());
        placeholders.push(placeholder);

        offset = token_end;
    }

    source.push('$');
    Ok((source, placeholders))
}

/// Escapes literal text, keeping `?` as the optional marker.
fn push_literal(source: &mut String, literal: &str) {
    for (i, part) in literal.split('?').enumerate() {
        if i > 0 {
            source.push('?');
        }
        source.push_str(&regex::escape(part));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::placeholder::PlaceholderKind;

    fn params(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        RoutePattern::compile(pattern)
            .unwrap()
            .match_path(path)
            .map(PathMatch::into_params)
    }

    // ── Classification ──────────────────────────────────────────────

    #[test]
    fn test_catch_all_forms() {
        for raw in ["", "*"] {
            let p = RoutePattern::compile(raw).unwrap();
            assert!(p.is_catch_all());
            assert!(p.is_match("/anything/at/all"));
            assert!(p.is_match(""));
        }
    }

    #[test]
    fn test_regex_is_unanchored() {
        let p = RoutePattern::compile("@/bar").unwrap();
        assert_eq!(p.kind(), PatternKind::Regex);
        assert!(p.is_match("/foo/bar/baz"));
        assert!(!p.is_match("/foo"));
    }

    #[test]
    fn test_regex_named_groups_bind() {
        let found = params("@^/posts/(?P<year>[0-9]{4})$", "/posts/2024").unwrap();
        assert_eq!(found, vec![("year".to_string(), "2024".to_string())]);
    }

    #[test]
    fn test_negated_regex() {
        let p = RoutePattern::compile("!@^/admin").unwrap();
        assert_eq!(p.kind(), PatternKind::Negated);
        assert!(p.is_match("/users"));
        assert!(!p.is_match("/admin/panel"));
        assert!(p.match_path("/users").unwrap().is_empty());
    }

    #[test]
    fn test_negated_placeholder_pattern() {
        let p = RoutePattern::compile("!/foo").unwrap();
        assert!(p.is_match("/bar"));
        assert!(!p.is_match("/foo"));
        assert!(!p.is_match("/foo/"));
    }

    // ── Placeholder types ───────────────────────────────────────────

    #[test]
    fn test_integer_placeholder() {
        assert_eq!(
            params("/[i:age]", "/987"),
            Some(vec![("age".to_string(), "987".to_string())])
        );
        assert!(params("/[i:age]", "/blue").is_none());
    }

    #[test]
    fn test_alnum_hex_slug() {
        assert!(params("/[a:id]", "/abc123").is_some());
        assert!(params("/[a:id]", "/abc-123").is_none());
        assert!(params("/[h:id]", "/00FFaa").is_some());
        assert!(params("/[h:id]", "/00FFgg").is_none());
        assert!(params("/[s:slug]", "/hello_world-2").is_some());
        assert!(params("/[s:slug]", "/hello world").is_none());
    }

    #[test]
    fn test_free_segment_stops_at_slash() {
        let found = params("/[:name]", "/user@example.com").unwrap();
        assert_eq!(found[0].1, "user@example.com");
        assert!(params("/[:name]", "/a/b").is_none());
    }

    #[test]
    fn test_name_without_type_is_segment() {
        let p = RoutePattern::compile("/[controller]").unwrap();
        assert_eq!(p.placeholders()[0].kind, PlaceholderKind::Segment);
        assert_eq!(p.match_path("/users").unwrap().get("controller"), Some("users"));
    }

    #[test]
    fn test_lazy_wildcard_with_trailing_integer() {
        let found = params("/posts/[*:title][i:id]", "/posts/this-is-a-title-123").unwrap();
        assert_eq!(found[0], ("title".to_string(), "this-is-a-title-".to_string()));
        assert_eq!(found[1], ("id".to_string(), "123".to_string()));
    }

    #[test]
    fn test_greedy_wildcard_takes_rest() {
        let found = params("/files/[**:path]", "/files/a/b/c.txt").unwrap();
        assert_eq!(found[0].1, "a/b/c.txt");
    }

    #[test]
    fn test_alternation_with_dot_separator() {
        let p = RoutePattern::compile("/output.[xml|json:format]").unwrap();
        assert_eq!(p.match_path("/output.json").unwrap().get("format"), Some("json"));
        assert!(!p.is_match("/output.html"));
        assert!(!p.is_match("/outputxjson"));
    }

    #[test]
    fn test_unnamed_placeholder_does_not_capture() {
        let found = params("/[i:]/[:name]", "/12/bob").unwrap();
        assert_eq!(found, vec![("name".to_string(), "bob".to_string())]);
    }

    // ── Optional parts and anchoring ────────────────────────────────

    #[test]
    fn test_optional_placeholders() {
        let p = RoutePattern::compile("/[:controller]?/[:action]?").unwrap();
        assert_eq!(p.match_path("/donkey/kick").unwrap().get("action"), Some("kick"));
        let found = p.match_path("/donkey").unwrap();
        assert_eq!(found.get("controller"), Some("donkey"));
        assert_eq!(found.get("action"), None);
        assert!(p.placeholders().iter().all(|ph| ph.optional));
    }

    #[test]
    fn test_optional_dot_format() {
        let p = RoutePattern::compile("/[:module]/[:action].[:format]?").unwrap();
        let found = p.match_path("/blog/list.json").unwrap();
        assert_eq!(found.get("action"), Some("list"));
        assert_eq!(found.get("format"), Some("json"));
        let found = p.match_path("/blog/list").unwrap();
        assert_eq!(found.get("format"), None);
    }

    #[test]
    fn test_literal_question_mark_makes_char_optional() {
        let p = RoutePattern::compile("/?[*:trailing]/dog/?").unwrap();
        assert_eq!(p.match_path("/cat/dog").unwrap().get("trailing"), Some("cat"));
        assert_eq!(
            p.match_path("/cat/cheese/dog/").unwrap().get("trailing"),
            Some("cat/cheese")
        );
        assert!(!p.is_match("/cat/dog/bird"));
    }

    #[test]
    fn test_full_path_anchoring() {
        assert!(params("/foo", "/foo/bar").is_none());
        assert!(params("/foo", "/xfoo").is_none());
    }

    #[test]
    fn test_trailing_slash_tolerance() {
        let p = RoutePattern::compile("/users/[i:id]").unwrap();
        assert!(p.is_match("/users/5/"));
        assert!(!p.is_match("/users/5//"));

        let strict = RoutePattern::compile("/users/[i:id]")
            .unwrap()
            .with_trailing_slash_tolerance(false);
        assert!(!strict.is_match("/users/5/"));
        assert!(RoutePattern::compile("/").unwrap().is_match("/"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert!(params("/a.b", "/a.b").is_some());
        assert!(params("/a.b", "/axb").is_none());
        assert!(params("/f(o)o+", "/f(o)o+").is_some());
    }

    // ── Decoding ────────────────────────────────────────────────────

    #[test]
    fn test_captures_are_percent_decoded() {
        let found = params("/[:test]", "/a%2Fb%20c").unwrap();
        assert_eq!(found[0].1, "a/b c");
    }

    #[test]
    fn test_plus_is_not_decoded() {
        let found = params("/[:test]", "/Knife+Party").unwrap();
        assert_eq!(found[0].1, "Knife+Party");
    }

    // ── Errors ──────────────────────────────────────────────────────

    #[test]
    fn test_compile_errors() {
        for raw in ["/[i:id", "/[i:a.b]", "/[i:1x]", "@(unclosed", "/[i:[x]]", "/[i:id]/[:id]"] {
            let err = RoutePattern::compile(raw).unwrap_err();
            assert!(
                matches!(err, SwitchyardError::InvalidPattern { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    // ── Placeholder metadata ────────────────────────────────────────

    #[test]
    fn test_placeholder_metadata() {
        let p = RoutePattern::compile("/users/[i:id]/[edit|show:action]?").unwrap();
        let [id, action] = p.placeholders() else {
            panic!("expected two placeholders");
        };
        assert_eq!(id.name.as_deref(), Some("id"));
        assert_eq!(id.separator, Separator::Slash);
        assert_eq!(id.position, 7);
        assert_eq!(id.span, (6, 13));
        assert!(!id.optional);
        assert!(action.optional);
        assert_eq!(&p.raw()[action.span.0..action.span.1], "/[edit|show:action]?");
    }

    // ── Scoping ─────────────────────────────────────────────────────

    #[test]
    fn test_scoped_plain_pattern() {
        let p = RoutePattern::compile_scoped("/u", "/[i:id]").unwrap();
        assert_eq!(p.raw(), "/u/[i:id]");
        assert!(p.is_match("/u/3"));
    }

    #[test]
    fn test_scoped_catch_all() {
        let p = RoutePattern::compile_scoped("/u", "*").unwrap();
        assert_eq!(p.raw(), "@^/u(/|$)");
        assert!(p.is_match("/u"));
        assert!(p.is_match("/u/anything"));
        assert!(!p.is_match("/users"));
    }

    #[test]
    fn test_scoped_regex() {
        let anchored = RoutePattern::compile_scoped("/u", "@^/[0-9]+$").unwrap();
        assert_eq!(anchored.raw(), "@^/u/[0-9]+$");
        assert!(anchored.is_match("/u/42"));
        assert!(!anchored.is_match("/x/u/42"));

        let floating = RoutePattern::compile_scoped("/u", "@/edit$").unwrap();
        assert_eq!(floating.raw(), "@^/u.*/edit$");
        assert!(floating.is_match("/u/7/edit"));
    }

    #[test]
    fn test_scoped_negated_regex() {
        let p = RoutePattern::compile_scoped("/u", "!@^/admin").unwrap();
        assert_eq!(p.raw(), "@^/u(?!/admin)");
        assert_eq!(p.kind(), PatternKind::Negated);
        assert!(p.is_match("/u/profile"));
        assert!(!p.is_match("/u/admin/x"));
        assert!(!p.is_match("/other"));
    }

    #[test]
    fn test_scoped_negated_plain() {
        let p = RoutePattern::compile_scoped("/u", "!/admin").unwrap();
        assert_eq!(p.raw(), "!/u/admin");
        assert!(p.is_match("/u/other"));
        assert!(!p.is_match("/u/admin"));
    }
}
