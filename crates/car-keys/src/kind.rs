//! KeyKind - classification of a single key name
//!
//! Classification looks only at prefixes and suffixes of the key name.
//! Default and scale suffixes win over the plain figure classification, so a
//! key is never both a selectable figure key and a seed value.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Prefix shared by every figure related key
pub const FIGURE_PREFIX: &str = "figure";

/// Prefix of keys bound to exactly one image
pub const SINGLE_FIGURE_PREFIX: &str = "figure.";

/// Prefix of keys bound to an ordered list of images
pub const MULTI_FIGURE_PREFIX: &str = "figures.";

/// Prefix of comment keys
pub const COMMENT_PREFIX: &str = "comment.";

/// Prefix of paragraph text keys
pub const PARAGRAPH_PREFIX: &str = "paragraph.";

/// Prefix of single word text keys
pub const WORD_PREFIX: &str = "word.";

/// Suffix marking a seed value
pub const DEFAULT_SUFFIX: &str = ".default";

/// Suffix marking a scale factor
pub const SCALE_SUFFIX: &str = ".scale";

/// How many images a figure key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureArity {
    /// One image name, stored directly
    Single,
    /// A `;` separated list of image names
    Multi,
}

impl FigureArity {
    /// Arity implied by a figure key name
    ///
    /// `figures.` keys are multi valued, every other figure key holds one image.
    #[inline]
    #[must_use]
    pub fn of(figure_key: &str) -> Self {
        if figure_key.starts_with(MULTI_FIGURE_PREFIX) {
            Self::Multi
        } else {
            Self::Single
        }
    }

    /// True for [`FigureArity::Multi`]
    #[inline]
    #[must_use]
    pub fn is_multi(self) -> bool {
        matches!(self, Self::Multi)
    }
}

/// Semantic category of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// `figure.*` slot holding one image
    SingleFigure,
    /// `figures.*` slot holding a list of images
    MultiFigure,
    /// `figure*.default` seed value
    FigureDefault,
    /// `figure*.scale` scale factor
    FigureScale,
    /// `comment.*` text slot
    Comment,
    /// `paragraph.*` or `word.*` text slot
    Text,
    /// `paragraph.*.default` or `word.*.default` seed value
    TextDefault,
    /// Anything else
    Other,
}

impl KeyKind {
    /// Classify a key name
    #[must_use]
    pub fn of(key: &str) -> Self {
        if key.starts_with(FIGURE_PREFIX) {
            if key.ends_with(DEFAULT_SUFFIX) {
                Self::FigureDefault
            } else if key.ends_with(SCALE_SUFFIX) {
                Self::FigureScale
            } else {
                match FigureArity::of(key) {
                    FigureArity::Single => Self::SingleFigure,
                    FigureArity::Multi => Self::MultiFigure,
                }
            }
        } else if key.starts_with(COMMENT_PREFIX) {
            Self::Comment
        } else if key.starts_with(PARAGRAPH_PREFIX) || key.starts_with(WORD_PREFIX) {
            if key.ends_with(DEFAULT_SUFFIX) {
                Self::TextDefault
            } else {
                Self::Text
            }
        } else {
            Self::Other
        }
    }

    /// Figure arity, if this is a selectable figure key
    #[inline]
    #[must_use]
    pub fn arity(self) -> Option<FigureArity> {
        match self {
            Self::SingleFigure => Some(FigureArity::Single),
            Self::MultiFigure => Some(FigureArity::Multi),
            _ => None,
        }
    }

    /// True for keys offered in the figure key chooser
    #[inline]
    #[must_use]
    pub fn is_figure(self) -> bool {
        self.arity().is_some()
    }

    /// True for keys edited as free text
    #[inline]
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Comment | Self::Text)
    }

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleFigure => "single_figure",
            Self::MultiFigure => "multi_figure",
            Self::FigureDefault => "figure_default",
            Self::FigureScale => "figure_scale",
            Self::Comment => "comment",
            Self::Text => "text",
            Self::TextDefault => "text_default",
            Self::Other => "other",
        }
    }
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip a trailing `.default` from a key, if present
#[inline]
#[must_use]
pub fn strip_default_suffix(key: &str) -> &str {
    key.strip_suffix(DEFAULT_SUFFIX).unwrap_or(key)
}

/// Figure key a `.scale` key belongs to
///
/// `figure.a.scale` scales `figure.a`. Keys without the suffix are returned unchanged.
#[inline]
#[must_use]
pub fn scale_target(key: &str) -> &str {
    key.strip_suffix(SCALE_SUFFIX).unwrap_or(key)
}
