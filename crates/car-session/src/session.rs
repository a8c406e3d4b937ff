//! Session - the editable key/value state of one report

use crate::multi::{MultiFigureList, MULTI_FIGURE_DELIMITER};
use std::collections::BTreeMap;

/// Flat key → value mapping, saved and loaded as-is
pub type PropertyMap = BTreeMap<String, String>;

/// Session file name
pub const FILENAME_KEY: &str = "filename";

/// Path of the selected report template
pub const TEMPLATE_PATH_KEY: &str = "template_path";

/// Path of the selected default table
pub const DEFAULT_TABLE_PATH_KEY: &str = "default_table_path";

/// Directory images are chosen from
pub const FIGURES_DIRECTORY_KEY: &str = "figures.directory";

/// Suffix appended to a figure key to store its scale
pub const SCALE_KEY_SUFFIX: &str = ".scale";

/// Keys that survive a reset
pub const CARRIED_KEYS: [&str; 4] = [
    FIGURES_DIRECTORY_KEY,
    DEFAULT_TABLE_PATH_KEY,
    TEMPLATE_PATH_KEY,
    FILENAME_KEY,
];

/// Editable key/value state with a dirty flag
///
/// Reads never fail: absent keys come back as `None` from [`Session::property`]
/// and as `""` from the typed accessors.
///
/// # Example
/// ```
/// use car_session::Session;
///
/// let mut session = Session::new();
/// assert!(!session.is_changed());
///
/// session.set_filename("sst_report");
/// assert!(session.is_changed());
/// assert!(session.has_file_name());
///
/// session.mark_saved();
/// assert!(!session.is_changed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    properties: PropertyMap,
    changed: bool,
}

impl Session {
    /// Empty, unchanged session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session holding a loaded property mapping, unchanged
    #[inline]
    #[must_use]
    pub fn from_properties(properties: PropertyMap) -> Self {
        Self {
            properties,
            changed: false,
        }
    }

    /// Fresh session holding exactly the [`CARRIED_KEYS`] of `previous`
    ///
    /// Every carried key is written, as `""` when `previous` lacks it.
    /// Everything else, including every figure and text binding, is dropped.
    #[must_use]
    pub fn reset_from(previous: &Session) -> Self {
        let properties = CARRIED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), previous.text(key).to_string()))
            .collect();
        Self::from_properties(properties)
    }

    // ------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------

    /// Store `value` under `key`, replacing any previous value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        tracing::trace!(key = %key, "session property set");
        self.properties.insert(key, value.into());
        self.changed = true;
    }

    /// Stored value, `None` when never set
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Delete `key`
    ///
    /// Returns whether a value was removed. The dirty flag is only raised
    /// when something was actually deleted.
    pub fn remove_property(&mut self, key: &str) -> bool {
        let removed = self.properties.remove(key).is_some();
        if removed {
            tracing::trace!(key, "session property removed");
            self.changed = true;
        }
        removed
    }

    /// True when `key` holds a value
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True when nothing is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The whole mapping, as serialized to the server
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Consume into the underlying mapping
    #[inline]
    #[must_use]
    pub fn into_properties(self) -> PropertyMap {
        self.properties
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    #[inline]
    fn text(&self, key: &str) -> &str {
        self.property(key).unwrap_or_default()
    }

    /// Session file name, `""` when unset
    #[inline]
    #[must_use]
    pub fn filename(&self) -> &str {
        self.text(FILENAME_KEY)
    }

    /// Set the session file name
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.set_property(FILENAME_KEY, filename);
    }

    /// True when the file name is non-blank
    #[inline]
    #[must_use]
    pub fn has_file_name(&self) -> bool {
        !self.filename().trim().is_empty()
    }

    /// Template path, `""` when unset
    #[inline]
    #[must_use]
    pub fn template_doc_path(&self) -> &str {
        self.text(TEMPLATE_PATH_KEY)
    }

    /// Set the template path
    pub fn set_template_doc_path(&mut self, path: impl Into<String>) {
        self.set_property(TEMPLATE_PATH_KEY, path);
    }

    /// Default table path, `""` when unset
    #[inline]
    #[must_use]
    pub fn default_table_path(&self) -> &str {
        self.text(DEFAULT_TABLE_PATH_KEY)
    }

    /// Set the default table path
    pub fn set_default_table_path(&mut self, path: impl Into<String>) {
        self.set_property(DEFAULT_TABLE_PATH_KEY, path);
    }

    /// Figures directory, `""` when unset
    #[inline]
    #[must_use]
    pub fn figures_directory(&self) -> &str {
        self.text(FIGURES_DIRECTORY_KEY)
    }

    /// Set the figures directory
    pub fn set_figures_directory(&mut self, directory: impl Into<String>) {
        self.set_property(FIGURES_DIRECTORY_KEY, directory);
    }

    /// Set the scale of a figure key, stored under `<figure_key>.scale`
    pub fn set_scale(&mut self, figure_key: &str, scale: impl Into<String>) {
        self.set_property(format!("{figure_key}{SCALE_KEY_SUFFIX}"), scale);
    }

    /// Scale of a figure key
    #[must_use]
    pub fn scale(&self, figure_key: &str) -> Option<&str> {
        self.property(&format!("{figure_key}{SCALE_KEY_SUFFIX}"))
    }

    // ------------------------------------------------------------------
    // Multi-figure lists
    // ------------------------------------------------------------------

    /// Decoded list stored under `key`, empty when absent
    #[must_use]
    pub fn multi_figure_list(&self, key: &str) -> MultiFigureList {
        self.property(key)
            .map(MultiFigureList::parse)
            .unwrap_or_default()
    }

    /// Image names stored under a multi-figure key
    #[must_use]
    pub fn multi_figure_names(&self, key: &str) -> Vec<String> {
        self.multi_figure_list(key).into_names()
    }

    /// Append `name` to a multi-figure list unless already present
    ///
    /// The name is trimmed first; blank names are ignored. Returns whether
    /// the list changed.
    pub fn add_to_multi_figure(&mut self, key: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let list = self.multi_figure_list(key);
        if list.is_empty() {
            self.set_property(key, name);
            return true;
        }
        if list.contains(name) {
            return false;
        }

        let raw = self.text(key);
        let value = format!("{raw}{MULTI_FIGURE_DELIMITER}{name}");
        self.set_property(key, value);
        true
    }

    /// Drop `name` from a multi-figure list
    ///
    /// Removing the last name deletes the key instead of leaving `""`.
    /// Returns whether the list changed.
    pub fn remove_from_multi_figure(&mut self, key: &str, name: &str) -> bool {
        let name = name.trim();
        let list = self.multi_figure_list(key);
        if !list.contains(name) {
            return false;
        }

        let rest = list.without(name);
        if rest.is_empty() {
            self.remove_property(key);
        } else {
            self.set_property(key, rest.join());
        }
        true
    }

    // ------------------------------------------------------------------
    // Dirty flag
    // ------------------------------------------------------------------

    /// True when unsaved mutations exist
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Acknowledge a successful save
    #[inline]
    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Raise the dirty flag without a mutation
    #[inline]
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }
}

impl From<PropertyMap> for Session {
    fn from(properties: PropertyMap) -> Self {
        Self::from_properties(properties)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Session {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_properties(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
