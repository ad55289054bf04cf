//! # Pattern Compiler
//!
//! Turns a route definition into a [`CompiledPattern`]: a single regular expression
//! anchored at both ends of the normalised path, plus the ordered parameter names of
//! its capture groups.
//!
//! Two notations are accepted and may be mixed freely:
//!
//! - **Raw regex groups**: `/hello/(\w+)`, `/blog(/\d{4}(/\d{2})?)?`, `/(.*)/page([0-9]+)`.
//!   Groups can be nested and made optional to any depth.
//! - **Placeholders**: `/hello/{name}` is rewritten to the ungreedy group `/(.*?)`.
//!   A placeholder must open a path segment (`/{...}`), which keeps regex quantifiers
//!   such as `\d{4}` untouched.
//!
//! Matching is Unicode-aware (`regex` operates on `&str`), so literal segments like
//! `/bg/това` and placeholders receiving emoji behave the same as ASCII ones.
//!
//! Parameter *positions* drive extraction. Names are kept only for the convenience
//! lookup [`Params::named`](crate::Params::named).

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::error::RouterError;

/// Prefix of the synthetic group names used to locate placeholders after compilation.
const PLACEHOLDER_GROUP: &str = "__wm";

/// Anchored, capture-group-aware form of a route definition.
///
/// Cheap to clone: the regex program and the name table are shared.
#[derive(Clone)]
pub struct CompiledPattern {
    source: Arc<str>,
    regex: Regex,
    names: Arc<[Option<Arc<str>>]>,
}

impl CompiledPattern {
    /// Compile a fully-qualified route definition (prefixes already applied).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] when the definition is not a valid
    /// regular expression once placeholders have been translated.
    pub fn compile(definition: &str) -> Result<Self, RouterError> {
        let (body, placeholders) = translate_placeholders(definition);
        let anchored = format!("^(?:{body})$");

        let regex = Regex::new(&anchored).map_err(|source| RouterError::InvalidPattern {
            pattern: definition.to_string(),
            source,
        })?;

        let names: Vec<Option<Arc<str>>> = regex
            .capture_names()
            .skip(1)
            .map(|name| match name {
                Some(n) => match placeholder_index(n) {
                    Some(idx) => placeholders.get(idx).cloned(),
                    None => Some(Arc::from(n)),
                },
                None => None,
            })
            .collect();

        Ok(Self {
            source: Arc::from(definition),
            regex,
            names: names.into(),
        })
    }

    /// The route definition this pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The anchored expression actually used for matching.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of capture groups, i.e. the number of positional parameters.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.names.len()
    }

    /// Parameter names by position; `None` for unnamed regex groups.
    #[must_use]
    pub fn names(&self) -> &Arc<[Option<Arc<str>>]> {
        &self.names
    }

    /// Whole-path match test.
    #[inline]
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("expression", &self.regex.as_str())
            .field("names", &self.names)
            .finish()
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Rewrite every `/{name}` into `/(?P<__wmN>.*?)` and return the collected names.
///
/// The synthetic group names let us find each placeholder's group index through
/// [`Regex::capture_names`] without parsing the surrounding user regex.
fn translate_placeholders(definition: &str) -> (String, Vec<Arc<str>>) {
    let mut out = String::with_capacity(definition.len() + 16);
    let mut names = Vec::new();
    let mut rest = definition;

    while let Some(pos) = rest.find("/{") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        let inner = &tail[2..];
        match inner.find(|c: char| c == '}' || c == '/' || c == '{') {
            Some(end) if end > 0 && inner[end..].starts_with('}') => {
                names.push(Arc::from(&inner[..end]));
                out.push_str("/(?P<");
                out.push_str(PLACEHOLDER_GROUP);
                out.push_str(&(names.len() - 1).to_string());
                out.push_str(">.*?)");
                rest = &inner[end + 1..];
            }
            _ => {
                // Not a placeholder, keep the slash and brace as written.
                out.push_str("/{");
                rest = inner;
            }
        }
    }
    out.push_str(rest);
    (out, names)
}

fn placeholder_index(group_name: &str) -> Option<usize> {
    group_name.strip_prefix(PLACEHOLDER_GROUP)?.parse().ok()
}
