//! Multi-figure value encoding
//!
//! A multi-figure key stores its image names as one string joined by `;`.
//! Elements are trimmed and empty elements dropped when read.

/// Separator between image names in a multi-figure value
pub const MULTI_FIGURE_DELIMITER: char = ';';

/// Decoded multi-figure value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiFigureList {
    names: Vec<String>,
}

impl MultiFigureList {
    /// Decode a raw stored value
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let names = raw
            .split(MULTI_FIGURE_DELIMITER)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Names in stored order
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Consume into the name list
    #[inline]
    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        self.names
    }

    /// Exact membership test on trimmed names
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Number of names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no names are stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Copy of this list with every occurrence of `name` dropped
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        Self {
            names: self.names.iter().filter(|n| *n != name).cloned().collect(),
        }
    }

    /// Encode for storage
    #[must_use]
    pub fn join(&self) -> String {
        let delimiter = MULTI_FIGURE_DELIMITER.to_string();
        self.names.join(delimiter.as_str())
    }
}
