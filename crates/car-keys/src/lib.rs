//! CAR Key Catalog
//!
//! Classifies the keys a default table declares for a report template.
//!
//! # Overview
//!
//! Keys carry their meaning in their names, so adding a new placeholder to a
//! template never needs a schema change:
//! - `figure.<name>`: a slot bound to one image
//! - `figures.<name>`: a slot bound to an ordered list of images
//! - `<figure key>.default` / `<figure key>.scale`: seed values for a new session
//! - `comment.*`, `paragraph.*`, `word.*`: free text slots
//!
//! # Example
//!
//! ```rust
//! use car_keys::{KeyCatalog, KeyKind};
//!
//! let catalog: KeyCatalog = [
//!     ("figure.a", ""),
//!     ("figure.a.default", "X"),
//!     ("figures.b", ""),
//! ]
//! .into_iter()
//! .collect();
//!
//! assert_eq!(catalog.figure_keys(), vec!["figure.a", "figures.b"]);
//! assert_eq!(catalog.kind_of("figures.b"), Some(KeyKind::MultiFigure));
//! ```

pub mod catalog;
pub mod kind;

// Re-exports
pub use catalog::{KeyCatalog, KeyGroups, KeyMap};
pub use kind::{
    scale_target, strip_default_suffix, FigureArity, KeyKind, COMMENT_PREFIX, DEFAULT_SUFFIX,
    FIGURE_PREFIX, MULTI_FIGURE_PREFIX, PARAGRAPH_PREFIX, SCALE_SUFFIX, SINGLE_FIGURE_PREFIX,
    WORD_PREFIX,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for key classification
    pub use crate::{FigureArity, KeyCatalog, KeyKind, KeyMap};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
