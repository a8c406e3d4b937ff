//! KeyCatalog - classified view over a default table's keys
//!
//! The catalog is built once from the key mapping a default table declares.
//! Every key is classified at construction and the queries only read that
//! cached classification, so results depend on nothing but the mapping the
//! catalog was built from.

use crate::kind::{FigureArity, KeyKind};
use indexmap::IndexMap;
use serde::Serialize;

/// Ordered key → metadata mapping, as served for a default table
pub type KeyMap = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassifiedKey {
    value: String,
    kind: KeyKind,
}

/// Classified key set of one default table
///
/// # Example
/// ```
/// use car_keys::KeyCatalog;
///
/// let catalog: KeyCatalog = [("comment.intro", ""), ("comment.outro", "")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(catalog.comment_key_for("outro"), Some("comment.outro"));
/// assert_eq!(catalog.comment_key_for("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCatalog {
    entries: IndexMap<String, ClassifiedKey>,
}

impl KeyCatalog {
    /// Classify a key mapping
    #[must_use]
    pub fn new(key_properties: KeyMap) -> Self {
        let entries = key_properties
            .into_iter()
            .map(|(key, value)| {
                let kind = KeyKind::of(&key);
                (key, ClassifiedKey { value, kind })
            })
            .collect();
        Self { entries }
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata value of a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Cached classification of a known key
    #[inline]
    #[must_use]
    pub fn kind_of(&self, key: &str) -> Option<KeyKind> {
        self.entries.get(key).map(|e| e.kind)
    }

    /// Arity of a known figure key
    #[inline]
    #[must_use]
    pub fn arity_of(&self, key: &str) -> Option<FigureArity> {
        self.kind_of(key).and_then(KeyKind::arity)
    }

    /// Iterate keys, values and kinds in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, KeyKind)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str(), e.kind))
    }

    /// Keys offered in the figure key chooser
    ///
    /// Every `figure*` key that is neither a `.default` nor a `.scale` key.
    #[must_use]
    pub fn figure_keys(&self) -> Vec<&str> {
        self.keys_where(KeyKind::is_figure)
    }

    /// Figure seed values, keyed by the full `.default` key
    #[must_use]
    pub fn figure_defaults(&self) -> KeyMap {
        self.map_where(|kind| kind == KeyKind::FigureDefault)
    }

    /// Figure scale factors, keyed by the full `.scale` key
    #[must_use]
    pub fn figure_scalings(&self) -> KeyMap {
        self.map_where(|kind| kind == KeyKind::FigureScale)
    }

    /// All `comment.` keys
    #[must_use]
    pub fn comment_keys(&self) -> Vec<&str> {
        self.keys_where(|kind| kind == KeyKind::Comment)
    }

    /// Comment keys followed by paragraph and word keys
    #[must_use]
    pub fn text_keys(&self) -> Vec<&str> {
        let mut keys = self.comment_keys();
        keys.extend(self.keys_where(|kind| kind == KeyKind::Text));
        keys
    }

    /// Paragraph and word seed values, keyed by the full `.default` key
    #[must_use]
    pub fn text_defaults(&self) -> KeyMap {
        self.map_where(|kind| kind == KeyKind::TextDefault)
    }

    /// First comment key whose name ends with `name_part`
    #[must_use]
    pub fn comment_key_for(&self, name_part: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, e)| e.kind == KeyKind::Comment && k.ends_with(name_part))
            .map(|(k, _)| k.as_str())
    }

    /// Snapshot of every derived group
    #[must_use]
    pub fn groups(&self) -> KeyGroups {
        KeyGroups {
            figure_keys: owned(self.figure_keys()),
            figure_defaults: self.figure_defaults(),
            figure_scalings: self.figure_scalings(),
            comment_keys: owned(self.comment_keys()),
            text_keys: owned(self.text_keys()),
            text_defaults: self.text_defaults(),
        }
    }

    fn keys_where(&self, pred: impl Fn(KeyKind) -> bool) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| pred(e.kind))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    fn map_where(&self, pred: impl Fn(KeyKind) -> bool) -> KeyMap {
        self.entries
            .iter()
            .filter(|(_, e)| pred(e.kind))
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }
}

fn owned(keys: Vec<&str>) -> Vec<String> {
    keys.into_iter().map(str::to_string).collect()
}

impl From<KeyMap> for KeyCatalog {
    fn from(key_properties: KeyMap) -> Self {
        Self::new(key_properties)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Every derived group of a catalog, owned and serializable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyGroups {
    /// See [`KeyCatalog::figure_keys`]
    pub figure_keys: Vec<String>,
    /// See [`KeyCatalog::figure_defaults`]
    pub figure_defaults: KeyMap,
    /// See [`KeyCatalog::figure_scalings`]
    pub figure_scalings: KeyMap,
    /// See [`KeyCatalog::comment_keys`]
    pub comment_keys: Vec<String>,
    /// See [`KeyCatalog::text_keys`]
    pub text_keys: Vec<String>,
    /// See [`KeyCatalog::text_defaults`]
    pub text_defaults: KeyMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{DEFAULT_SUFFIX, FIGURE_PREFIX, SCALE_SUFFIX};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn catalog(pairs: &[(&str, &str)]) -> KeyCatalog {
        pairs.iter().copied().collect()
    }

    fn key_map(pairs: &[(&str, &str)]) -> KeyMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn figure_scenario() {
        let catalog = catalog(&[
            ("figure.a", ""),
            ("figure.a.default", "X"),
            ("figure.a.scale", "1.5"),
            ("figures.b", ""),
        ]);

        assert_eq!(catalog.figure_keys(), vec!["figure.a", "figures.b"]);
        assert_eq!(catalog.figure_defaults(), key_map(&[("figure.a.default", "X")]));
        assert_eq!(catalog.figure_scalings(), key_map(&[("figure.a.scale", "1.5")]));
    }

    #[test]
    fn empty_catalog_is_empty_everywhere() {
        let catalog = KeyCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.figure_keys().is_empty());
        assert!(catalog.figure_defaults().is_empty());
        assert!(catalog.text_keys().is_empty());
        assert_eq!(catalog.comment_key_for(""), None);
    }

    #[test]
    fn text_keys_put_comments_first() {
        let catalog = catalog(&[
            ("word.region", "r"),
            ("comment.intro", ""),
            ("paragraph.summary", ""),
            ("paragraph.summary.default", "Lorem"),
            ("comment.outro", ""),
        ]);

        assert_eq!(catalog.comment_keys(), vec!["comment.intro", "comment.outro"]);
        assert_eq!(
            catalog.text_keys(),
            vec!["comment.intro", "comment.outro", "word.region", "paragraph.summary"]
        );
        assert_eq!(
            catalog.text_defaults(),
            key_map(&[("paragraph.summary.default", "Lorem")])
        );
    }

    #[test]
    fn comment_key_lookup_returns_first_match() {
        let catalog = catalog(&[
            ("comment.fig_sst", ""),
            ("comment.table_sst", ""),
            ("paragraph.sst", ""),
        ]);

        assert_eq!(catalog.comment_key_for("sst"), Some("comment.fig_sst"));
        assert_eq!(catalog.comment_key_for("table_sst"), Some("comment.table_sst"));
        assert_eq!(catalog.comment_key_for("nothing"), None);
    }

    #[test]
    fn unmatched_keys_stay_out_of_groups() {
        let catalog = catalog(&[("title", "Report"), ("figure.a", "")]);

        assert_eq!(catalog.kind_of("title"), Some(KeyKind::Other));
        assert_eq!(catalog.get("title"), Some("Report"));
        let groups = catalog.groups();
        assert_eq!(groups.figure_keys, vec!["figure.a".to_string()]);
        assert!(groups.text_keys.is_empty());
    }

    #[test]
    fn arity_only_for_figure_keys() {
        let catalog = catalog(&[("figures.b", ""), ("figures.b.scale", "2")]);
        assert_eq!(catalog.arity_of("figures.b"), Some(FigureArity::Multi));
        assert_eq!(catalog.arity_of("figures.b.scale"), None);
        assert_eq!(catalog.arity_of("unknown"), None);
    }

    #[test]
    fn table_order_is_preserved() {
        let catalog = catalog(&[("figures.z", ""), ("figure.a", ""), ("figure.m", "")]);
        assert_eq!(catalog.figure_keys(), vec!["figures.z", "figure.a", "figure.m"]);
    }

    fn key_strategy() -> impl Strategy<Value = String> {
        "(figure|figures|comment|paragraph|word|other)(\\.[a-z]{1,3}){0,2}(\\.default|\\.scale)?"
    }

    proptest! {
        #[test]
        fn prop_figure_keys_follow_naming(
            pairs in prop::collection::vec((key_strategy(), "[a-z0-9.]{0,4}"), 0..24)
        ) {
            let map: KeyMap = pairs.into_iter().collect();
            let catalog = KeyCatalog::new(map.clone());
            let figure_keys = catalog.figure_keys();

            for key in &figure_keys {
                prop_assert!(key.starts_with(FIGURE_PREFIX));
                prop_assert!(!key.ends_with(DEFAULT_SUFFIX));
                prop_assert!(!key.ends_with(SCALE_SUFFIX));
            }
            for key in map.keys() {
                let plain = key.starts_with(FIGURE_PREFIX)
                    && !key.ends_with(DEFAULT_SUFFIX)
                    && !key.ends_with(SCALE_SUFFIX);
                prop_assert_eq!(plain, figure_keys.contains(&key.as_str()));
            }
        }

        #[test]
        fn prop_figure_groups_are_disjoint(
            pairs in prop::collection::vec((key_strategy(), "[a-z]{0,3}"), 0..24)
        ) {
            let catalog = KeyCatalog::new(pairs.into_iter().collect());
            let defaults = catalog.figure_defaults();
            let scalings = catalog.figure_scalings();

            for key in catalog.figure_keys() {
                prop_assert!(!defaults.contains_key(key));
                prop_assert!(!scalings.contains_key(key));
            }
            for key in defaults.keys() {
                prop_assert!(!scalings.contains_key(key));
            }
        }
    }
}
