//! Matcher & Extractor: test a compiled pattern against a path and slice out the
//! positional parameters.
//!
//! # Extraction
//!
//! Each capture group's value is bounded on the right by the start of the *next*
//! capture group when that group took part in the match. An outer optional group
//! therefore yields only its own leading part instead of the whole remaining tail:
//!
//! ```text
//! /blog(/\d{4}(/\d{2})?)?   against   /blog/1983/12
//!        group 1 = "/1983/12"  ->  bounded by group 2 start  ->  "1983"
//!        group 2 = "/12"                                     ->  "12"
//! ```
//!
//! Values are `/`-trimmed. A group that did not participate yields `None`, never `""`.
//! All offsets come from the regex engine and fall on UTF-8 boundaries.

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::pattern::CompiledPattern;

/// Maximum number of parameters stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Positional parameter storage. `None` marks an optional group that did not match.
pub type ParamVec = SmallVec<[Option<String>; MAX_INLINE_PARAMS]>;

/// Parameters extracted from one successful match.
#[derive(Clone, Default)]
pub struct Params {
    values: ParamVec,
    names: Option<Arc<[Option<Arc<str>>]>>,
}

impl Params {
    /// Build from positional values only.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Params {
            values: values.into_iter().map(|v| v.map(Into::into)).collect(),
            names: None,
        }
    }

    /// Number of positional parameters, participating or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the pattern has no capture groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at position `index`. `None` both for an absent optional group and for an
    /// out-of-range index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Positional values in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.values.iter().map(|v| v.as_deref())
    }

    /// Lookup by placeholder or named-group name.
    ///
    /// Uses "last write wins" semantics: in `/org/{id}/user/{id}` the user id is returned.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&str> {
        let names = self.names.as_ref()?;
        names
            .iter()
            .zip(self.values.iter())
            .rfind(|(n, _)| n.as_deref() == Some(name))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Collect into owned values, e.g. for assertions or handing off to another thread.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<String>> {
        self.values.to_vec()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// Match `path` against `pattern` and extract its parameters.
///
/// Returns `None` unless the whole path matches.
#[must_use]
pub fn match_path(pattern: &CompiledPattern, path: &str) -> Option<Params> {
    let caps = pattern.regex().captures(path)?;

    let spans: SmallVec<[Option<(usize, usize)>; MAX_INLINE_PARAMS]> = (1..caps.len())
        .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
        .collect();

    let values = spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let (start, end) = (*span)?;
            let bound = match spans.get(i + 1).copied().flatten() {
                Some((next_start, _)) if next_start >= start => end.min(next_start),
                _ => end,
            };
            Some(path[start..bound].trim_matches('/').to_string())
        })
        .collect();

    Some(Params {
        values,
        names: Some(Arc::clone(pattern.names())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(pattern: &str, path: &str) -> Option<Vec<Option<String>>> {
        let compiled = CompiledPattern::compile(pattern).unwrap();
        match_path(&compiled, path).map(|p| p.to_vec())
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some((*v).to_string())).collect()
    }

    #[test]
    fn nested_optional_groups_are_bounded_by_next_group() {
        let pattern = r"/blog(/\d{4}(/\d{2}(/\d{2}(/[a-z0-9_-]+)?)?)?)?";
        assert_eq!(
            extract(pattern, "/blog/1983/12/26"),
            Some(vec![
                Some("1983".to_string()),
                Some("12".to_string()),
                Some("26".to_string()),
                None
            ])
        );
        assert_eq!(
            extract(pattern, "/blog/1983/12/26/bramus"),
            Some(some(&["1983", "12", "26", "bramus"]))
        );
        assert_eq!(extract(pattern, "/blog"), Some(vec![None, None, None, None]));
    }

    #[test]
    fn empty_group_differs_from_absent_group() {
        assert_eq!(
            extract(r"/x-(\w*)(/y)?", "/x-"),
            Some(vec![Some(String::new()), None])
        );
        let compiled = CompiledPattern::compile(r"/x-(\w*)(/y)?").unwrap();
        let params = match_path(&compiled, "/x-").unwrap();
        assert_eq!(params.get(0), Some(""));
        assert_eq!(params.get(1), None);
    }

    #[test]
    fn last_group_takes_the_remainder() {
        assert_eq!(
            extract("/hello/(.*)", "/hello/bramus/sumarb"),
            Some(some(&["bramus/sumarb"]))
        );
    }

    #[test]
    fn lazy_placeholders_split_segments() {
        assert_eq!(
            extract("/hello/{name}/{lastname}", "/hello/bramus/sumarb"),
            Some(some(&["bramus", "sumarb"]))
        );
    }

    #[test]
    fn unicode_values_slice_on_char_boundaries() {
        assert_eq!(
            extract("/{това}/{това2}", "/bramus/Сумарб"),
            Some(some(&["bramus", "Сумарб"]))
        );
        assert_eq!(extract("/emoji/{emoji}", "/emoji/🤯"), Some(some(&["🤯"])));
    }

    #[test]
    fn partial_match_is_rejected() {
        assert_eq!(extract(r"/hello/(\w+)", "/hello/bramus/extra"), None);
    }

    #[test]
    fn named_lookup_is_last_occurrence() {
        let compiled = CompiledPattern::compile("/org/{id}/user/{id}").unwrap();
        let params = match_path(&compiled, "/org/7/user/42").unwrap();
        assert_eq!(params.named("id"), Some("42"));
        assert_eq!(params.get(0), Some("7"));
        assert_eq!(params.named("missing"), None);
    }

    #[test]
    fn no_groups_gives_empty_params() {
        let compiled = CompiledPattern::compile("/about").unwrap();
        let params = match_path(&compiled, "/about").unwrap();
        assert!(params.is_empty());
    }
}
