//! Session Controller
//!
//! The one application-state object of the editor. It owns the current
//! [`Session`] and [`KeyCatalog`] and reacts to:
//! - default table changes (reset and seeding)
//! - figure key selection and image check/uncheck
//! - template and figures directory selection
//! - save, save-as, load, render and upload
//!
//! Work that needs the server is split in two: a `begin_*`/`prepare_*` call
//! produces a request, the matching `complete_*` call applies the response.
//! Responses to superseded requests are ignored, and failed responses leave
//! session and catalog untouched.

use crate::config::CarConfig;
use crate::error::{BackendError, CarError};
use crate::request::{
    ImagesRequest, KeysRequest, RenderRequest, Request, SaveRequest, SessionLoadRequest,
    UploadRequest,
};
use crate::sequence::{Channel, RequestSequencer};
use crate::wire::decode_message;
use crate::types::{
    ImageInfo, Notice, Outcome, SelectionView, ToolbarState, UploadKind, UploadPayload,
};
use car_keys::{scale_target, strip_default_suffix, FigureArity, KeyCatalog, KeyMap};
use car_session::{PropertyMap, Session};
use std::collections::VecDeque;

/// Application state of one report editor
#[derive(Debug)]
pub struct SessionController {
    /// Configuration
    config: CarConfig,
    /// Session being edited
    session: Session,
    /// Keys of the default table the catalog was fetched for
    catalog: KeyCatalog,
    /// Table path `catalog` belongs to
    catalog_table: String,
    /// Images of the current figures directory
    images: Vec<ImageInfo>,
    /// Key chosen in the figure key chooser
    selected_figure_key: Option<String>,
    /// Request sequencing
    sequencer: RequestSequencer,
    /// Pending user notices
    notices: VecDeque<Notice>,
}

impl SessionController {
    /// Controller with an empty session
    #[must_use]
    pub fn new(config: CarConfig) -> Self {
        Self::with_session(config, Session::new())
    }

    /// Controller editing an existing session
    #[must_use]
    pub fn with_session(config: CarConfig, session: Session) -> Self {
        Self {
            config,
            session,
            catalog: KeyCatalog::default(),
            catalog_table: String::new(),
            images: Vec::new(),
            selected_figure_key: None,
            sequencer: RequestSequencer::new(),
            notices: VecDeque::new(),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CarConfig {
        &self.config
    }

    /// Session being edited
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current key catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// Table path the current catalog was fetched for
    #[inline]
    #[must_use]
    pub fn catalog_table(&self) -> &str {
        &self.catalog_table
    }

    /// Images of the current figures directory
    #[inline]
    #[must_use]
    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    /// Key chosen in the figure key chooser
    #[inline]
    #[must_use]
    pub fn selected_figure_key(&self) -> Option<&str> {
        self.selected_figure_key.as_deref()
    }

    // ------------------------------------------------------------------
    // Default table
    // ------------------------------------------------------------------

    /// The user picked a default table
    ///
    /// Supersedes any pending key fetch or session load. An empty path needs
    /// no fetch: an empty key set is applied right away and `None` returned.
    pub fn begin_table_change(&mut self, table_path: &str) -> Option<KeysRequest> {
        tracing::info!(table = table_path, "default table selected");
        self.sequencer.cancel(Channel::Session);
        let request = KeysRequest {
            ticket: self.sequencer.issue(Channel::Keys),
            table_path: table_path.to_string(),
        };

        if table_path.trim().is_empty() {
            self.complete_table_change(request, Ok(KeyMap::new()));
            return None;
        }
        Some(request)
    }

    /// Apply the keys fetched for a default table
    ///
    /// When the table differs from the session's, the session is reset to
    /// its carried fields and seeded with the table's figure defaults and
    /// scalings before the figure selection is cleared.
    pub fn complete_table_change(
        &mut self,
        request: KeysRequest,
        result: Result<KeyMap, BackendError>,
    ) -> Outcome {
        if !self.sequencer.is_current(&request.ticket) {
            tracing::debug!(
                ticket = %request.ticket,
                table = %request.table_path,
                "ignoring superseded key fetch"
            );
            return Outcome::Ignored;
        }

        match result {
            Ok(keys) => {
                self.apply_table_keys(request.table_path, keys);
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!(table = %request.table_path, error = %err, "key fetch failed");
                self.push_notice(Notice::error(format!("Error while requesting keys: {err}")));
                Outcome::Failed
            }
        }
    }

    fn apply_table_keys(&mut self, table_path: String, keys: KeyMap) {
        self.catalog = KeyCatalog::new(keys);
        tracing::debug!(table = %table_path, keys = self.catalog.len(), "key catalog replaced");

        if table_path != self.session.default_table_path() {
            self.session = Session::reset_from(&self.session);
            self.session.set_default_table_path(table_path.as_str());
            let seeded = self.seed_figure_defaults();
            if self.config.clear_selection_on_reset {
                self.selected_figure_key = None;
            }
            tracing::info!(table = %table_path, seeded, "session reset for new default table");
        }
        self.catalog_table = table_path;
    }

    fn seed_figure_defaults(&mut self) -> usize {
        let mut seeded = 0;
        for (default_key, value) in self.catalog.figure_defaults() {
            let figure_key = strip_default_suffix(&default_key).to_string();
            self.session.set_property(figure_key, value.as_str());
            self.session.set_property(default_key, value);
            seeded += 1;
        }
        for (scale_key, scale) in self.catalog.figure_scalings() {
            self.session.set_scale(scale_target(&scale_key), scale);
            seeded += 1;
        }
        seeded
    }

    // ------------------------------------------------------------------
    // Template and figures directory
    // ------------------------------------------------------------------

    /// The user picked a report template
    pub fn select_template(&mut self, template_path: &str) {
        tracing::info!(template = template_path, "template selected");
        self.session.set_template_doc_path(template_path);
    }

    /// The user picked a figures directory
    ///
    /// The image list is cleared until the listing arrives. An empty
    /// directory needs no listing and returns `None`.
    pub fn begin_figures_directory(&mut self, directory: &str) -> Option<ImagesRequest> {
        tracing::info!(directory, "figures directory selected");
        self.session.set_figures_directory(directory);
        self.images_request(directory)
    }

    fn images_request(&mut self, directory: &str) -> Option<ImagesRequest> {
        self.images.clear();
        let ticket = self.sequencer.issue(Channel::Images);
        if directory.trim().is_empty() {
            return None;
        }
        Some(ImagesRequest {
            ticket,
            directory: directory.to_string(),
        })
    }

    /// Apply a figures directory listing
    pub fn complete_images_fetch(
        &mut self,
        request: ImagesRequest,
        result: Result<Vec<ImageInfo>, BackendError>,
    ) -> Outcome {
        if !self.sequencer.is_current(&request.ticket) {
            tracing::debug!(ticket = %request.ticket, "ignoring superseded image listing");
            return Outcome::Ignored;
        }

        match result {
            Ok(images) => {
                tracing::debug!(directory = %request.directory, count = images.len(), "images listed");
                self.images = images;
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!(directory = %request.directory, error = %err, "image listing failed");
                self.push_notice(Notice::error(format!("Error while requesting images: {err}")));
                Outcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // Figure selection
    // ------------------------------------------------------------------

    /// Keys offered in the figure key chooser
    #[must_use]
    pub fn figure_key_options(&self) -> Vec<&str> {
        self.catalog.figure_keys()
    }

    /// The user picked a key in the figure key chooser
    ///
    /// A blank key clears the selection.
    pub fn select_figure_key(&mut self, figure_key: &str) -> SelectionView {
        let figure_key = figure_key.trim();
        self.selected_figure_key = (!figure_key.is_empty()).then(|| figure_key.to_string());
        self.selection_view()
    }

    /// True when `figure_key` is selected, or any key when `None`
    #[must_use]
    pub fn is_figure_key_selected(&self, figure_key: Option<&str>) -> bool {
        match (figure_key, self.selected_figure_key()) {
            (Some(wanted), Some(selected)) => wanted == selected,
            (None, selected) => selected.is_some(),
            (Some(_), None) => false,
        }
    }

    /// Checked images for the selected figure key, derived from the session
    #[must_use]
    pub fn selection_view(&self) -> SelectionView {
        let Some(figure_key) = self.selected_figure_key() else {
            return SelectionView::default();
        };

        let arity = FigureArity::of(figure_key);
        let checked = match arity {
            FigureArity::Single => self
                .session
                .property(figure_key)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| vec![name.to_string()])
                .unwrap_or_default(),
            FigureArity::Multi => self.session.multi_figure_names(figure_key),
        };

        SelectionView {
            figure_key: Some(figure_key.to_string()),
            arity: Some(arity),
            checked,
        }
    }

    /// The user checked or unchecked an image
    ///
    /// Single-figure keys hold at most one image: checking replaces it,
    /// unchecking the bound image removes the key. Multi-figure keys add or
    /// remove the name from their list. Returns the recomputed view, or
    /// `None` when no figure key is selected.
    pub fn toggle_figure(&mut self, image_name: &str, checked: bool) -> Option<SelectionView> {
        let Some(figure_key) = self.selected_figure_key.clone() else {
            tracing::debug!(image = image_name, "image toggled without a figure key");
            return None;
        };

        let name = image_name.trim();
        if name.is_empty() {
            return Some(self.selection_view());
        }

        match (FigureArity::of(&figure_key), checked) {
            (FigureArity::Single, true) => {
                self.session.set_property(figure_key.as_str(), name);
            }
            (FigureArity::Single, false) => {
                if self.session.property(&figure_key).map(str::trim) == Some(name) {
                    self.remove_property(&figure_key);
                }
            }
            (FigureArity::Multi, true) => {
                self.session.add_to_multi_figure(&figure_key, name);
            }
            (FigureArity::Multi, false) => {
                self.session.remove_from_multi_figure(&figure_key, name);
            }
        }

        tracing::debug!(figure_key = %figure_key, image = name, checked, "figure selection changed");
        Some(self.selection_view())
    }

    // ------------------------------------------------------------------
    // Direct edits
    // ------------------------------------------------------------------

    /// Store a text value
    pub fn set_text(&mut self, key: &str, value: &str) {
        self.session.set_property(key, value);
    }

    /// Store the text of the first comment key ending with `name_part`
    ///
    /// Returns the key written, or `None` when the catalog has no such key.
    pub fn set_comment(&mut self, name_part: &str, text: &str) -> Option<String> {
        let key = self.catalog.comment_key_for(name_part)?.to_string();
        self.session.set_property(key.as_str(), text);
        Some(key)
    }

    /// Store the scale of a figure key
    pub fn set_scale(&mut self, figure_key: &str, scale: &str) {
        self.session.set_scale(figure_key, scale);
    }

    /// Delete a key from the session
    ///
    /// With `legacy_remove_marks_changed`, removing an absent key still
    /// raises the dirty flag.
    pub fn remove_property(&mut self, key: &str) -> bool {
        let removed = self.session.remove_property(key);
        if !removed && self.config.legacy_remove_marks_changed {
            self.session.mark_changed();
        }
        removed
    }

    // ------------------------------------------------------------------
    // Save / load
    // ------------------------------------------------------------------

    /// Snapshot the session for saving under its current file name
    pub fn prepare_save(&self) -> Result<SaveRequest, CarError> {
        if self.session.default_table_path().trim().is_empty() {
            return Err(CarError::NoTableSelected);
        }
        if !self.session.has_file_name() {
            return Err(CarError::MissingFilename);
        }
        Ok(SaveRequest {
            properties: self.session.properties().clone(),
        })
    }

    /// Set the file name, then snapshot the session for saving
    pub fn prepare_save_as(&mut self, filename: &str) -> Result<SaveRequest, CarError> {
        if self.session.default_table_path().trim().is_empty() {
            return Err(CarError::NoTableSelected);
        }
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(CarError::MissingFilename);
        }
        self.session.set_filename(filename);
        self.prepare_save()
    }

    /// Apply the save acknowledgement
    ///
    /// The dirty flag is only cleared when the session still equals the
    /// saved snapshot.
    pub fn complete_save(
        &mut self,
        request: SaveRequest,
        result: Result<String, BackendError>,
    ) -> Outcome {
        match result {
            Ok(message) => {
                if self.session.properties() == &request.properties {
                    self.session.mark_saved();
                } else {
                    tracing::debug!("session edited while saving, keeping unsaved flag");
                }
                tracing::info!(filename = self.session.filename(), "session saved");
                self.push_notice(Notice::info(decode_message(&message)));
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!(error = %err, "session save failed");
                self.push_notice(Notice::error(format!("Saving the session failed: {err}")));
                Outcome::Failed
            }
        }
    }

    /// The user asked to load a saved session
    pub fn begin_session_load(&mut self, filename: &str) -> SessionLoadRequest {
        tracing::info!(filename, "session load requested");
        SessionLoadRequest {
            ticket: self.sequencer.issue(Channel::Session),
            filename: filename.to_string(),
        }
    }

    /// Replace the session with a loaded one
    ///
    /// Pending key and image requests are superseded. Returns follow-up
    /// requests for the loaded session's default table (when the catalog
    /// belongs to another table) and figures directory.
    pub fn complete_session_load(
        &mut self,
        request: SessionLoadRequest,
        result: Result<PropertyMap, BackendError>,
    ) -> (Outcome, Vec<Request>) {
        if !self.sequencer.is_current(&request.ticket) {
            tracing::debug!(ticket = %request.ticket, "ignoring superseded session load");
            return (Outcome::Ignored, Vec::new());
        }

        let properties = match result {
            Ok(properties) => properties,
            Err(err) => {
                tracing::warn!(filename = %request.filename, error = %err, "session load failed");
                self.push_notice(Notice::error(format!("Loading the session failed: {err}")));
                return (Outcome::Failed, Vec::new());
            }
        };

        self.session = Session::from_properties(properties);
        self.selected_figure_key = None;
        self.sequencer.cancel(Channel::Keys);
        tracing::info!(filename = %request.filename, keys = self.session.len(), "session loaded");

        let mut follow_ups = Vec::new();
        let table_path = self.session.default_table_path().to_string();
        if table_path.trim().is_empty() {
            self.catalog = KeyCatalog::default();
            self.catalog_table.clear();
        } else if table_path != self.catalog_table {
            follow_ups.push(Request::Keys(KeysRequest {
                ticket: self.sequencer.issue(Channel::Keys),
                table_path,
            }));
        }

        let directory = self.session.figures_directory().to_string();
        if let Some(images) = self.images_request(&directory) {
            follow_ups.push(Request::Images(images));
        }

        (Outcome::Applied, follow_ups)
    }

    // ------------------------------------------------------------------
    // Render / upload
    // ------------------------------------------------------------------

    /// Snapshot the session for rendering
    pub fn prepare_render(&self) -> Result<RenderRequest, CarError> {
        if self.session.template_doc_path().trim().is_empty() {
            return Err(CarError::NoTemplateSelected);
        }
        Ok(RenderRequest {
            properties: self.session.properties().clone(),
        })
    }

    /// Surface the render result
    pub fn complete_render(&mut self, result: Result<String, BackendError>) -> Outcome {
        self.surface_message("render", result)
    }

    /// Check an upload before handing it off
    pub fn prepare_upload(
        &self,
        kind: UploadKind,
        payload: UploadPayload,
    ) -> Result<UploadRequest, CarError> {
        if !kind.accepts(&payload.file_name) {
            return Err(CarError::WrongFileType {
                kind,
                expected: kind.extension(),
                file_name: payload.file_name,
            });
        }
        tracing::info!(route = kind.route(), file = %payload.file_name, "upload prepared");
        Ok(UploadRequest { kind, payload })
    }

    /// Surface the upload result
    pub fn complete_upload(
        &mut self,
        kind: UploadKind,
        result: Result<String, BackendError>,
    ) -> Outcome {
        self.surface_message(&format!("{kind} upload"), result)
    }

    fn surface_message(&mut self, action: &str, result: Result<String, BackendError>) -> Outcome {
        match result {
            Ok(message) => {
                self.push_notice(Notice::info(decode_message(&message)));
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!(action, error = %err, "request failed");
                self.push_notice(Notice::error(format!("The {action} request failed: {err}")));
                Outcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // UI state
    // ------------------------------------------------------------------

    /// Enabled state of save and save-as
    #[must_use]
    pub fn toolbar(&self) -> ToolbarState {
        let table_selected = !self.session.default_table_path().trim().is_empty();
        ToolbarState {
            save_enabled: table_selected && self.session.has_file_name(),
            save_as_enabled: table_selected,
            session_name: self.session.filename().to_string(),
        }
    }

    /// True when a destructive action should ask first
    #[inline]
    #[must_use]
    pub fn needs_discard_confirmation(&self) -> bool {
        self.session.is_changed()
    }

    /// Queue a notice, keeping at least the newest one
    fn push_notice(&mut self, notice: Notice) {
        let capacity = self.config.notice_capacity.max(1);
        while self.notices.len() >= capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Pending notices, oldest first
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Take all pending notices
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(CarConfig::default())
    }
}
