//! CAR Session
//!
//! The in-progress set of key → value bindings for one report being assembled.
//!
//! # Overview
//!
//! - [`Session`]: flat string map with a dirty flag and typed accessors
//! - [`MultiFigureList`]: the `;` separated encoding of multi-figure values
//!
//! The flat map is also the wire contract: it is what gets saved, loaded and
//! rendered, so the session never stores anything but strings.
//!
//! # Example
//!
//! ```rust
//! use car_session::Session;
//!
//! let mut session = Session::new();
//! session.add_to_multi_figure("figures.sst", "anomaly.png");
//! session.add_to_multi_figure("figures.sst", " trend.png ");
//!
//! assert_eq!(session.property("figures.sst"), Some("anomaly.png;trend.png"));
//! assert!(session.is_changed());
//! ```

mod multi;
mod session;

// Re-exports
pub use multi::{MultiFigureList, MULTI_FIGURE_DELIMITER};
pub use session::{
    PropertyMap, Session, CARRIED_KEYS, DEFAULT_TABLE_PATH_KEY, FIGURES_DIRECTORY_KEY,
    FILENAME_KEY, SCALE_KEY_SUFFIX, TEMPLATE_PATH_KEY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
