//! CAR Core
//!
//! Session orchestration for the CAR report assembly tool.
//!
//! # Overview
//!
//! - [`SessionController`]: the application state; reacts to user actions,
//!   resets and seeds the session on table changes, applies backend responses
//! - [`Dispatcher`]: runs controller requests against a [`ReportBackend`]
//! - [`RequestSequencer`]: makes the last selection win when responses race
//!
//! # Example
//!
//! ```rust
//! use car_core::{CarConfig, Outcome, SessionController};
//! use car_keys::KeyMap;
//!
//! let mut controller = SessionController::new(CarConfig::default());
//! let request = controller.begin_table_change("sst.properties").unwrap();
//!
//! let mut keys = KeyMap::new();
//! keys.insert("figure.map".into(), String::new());
//! keys.insert("figure.map.default".into(), "global.png".into());
//!
//! assert_eq!(controller.complete_table_change(request, Ok(keys)), Outcome::Applied);
//! assert_eq!(controller.session().property("figure.map"), Some("global.png"));
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod sequence;
pub mod types;
pub mod wire;

// Re-exports
pub use backend::ReportBackend;
pub use config::CarConfig;
pub use controller::SessionController;
pub use dispatch::{Command, Dispatcher};
pub use error::{BackendError, CarError, ConfigError};
pub use request::{
    ImagesRequest, KeysRequest, RenderRequest, Request, SaveRequest, SessionLoadRequest,
    UploadRequest,
};
pub use sequence::{Channel, RequestSequencer, Ticket};
pub use types::{
    ImageInfo, Notice, NoticeLevel, Outcome, SelectionView, ToolbarState, UploadKind,
    UploadPayload,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for CAR Core
    pub use crate::{
        BackendError, CarConfig, CarError, Command, Dispatcher, Outcome, ReportBackend,
        SessionController,
    };
    pub use car_keys::prelude::*;
    pub use car_session::{PropertyMap, Session};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
