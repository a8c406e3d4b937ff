//! Dispatcher
//!
//! Drives a [`SessionController`] against a [`ReportBackend`]:
//! - turns user commands into backend requests
//! - runs requests concurrently, each under the configured timeout
//! - repeats reads that failed with a retryable error
//! - feeds completions back to the controller in arrival order
//!
//! Completions may arrive in any order; the controller's sequencing decides
//! which of them still apply.

use crate::backend::ReportBackend;
use crate::config::CarConfig;
use crate::controller::SessionController;
use crate::error::{BackendError, CarError};
use crate::request::{ImagesRequest, KeysRequest, Request, SaveRequest, SessionLoadRequest};
use crate::types::{ImageInfo, Outcome, UploadKind, UploadPayload};
use car_keys::KeyMap;
use car_session::PropertyMap;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// User actions that may need the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick a default table
    SelectDefaultTable(String),
    /// Pick a figures directory
    SelectFiguresDirectory(String),
    /// Load a saved session
    LoadSession(String),
    /// Save under the current file name
    Save,
    /// Save under a new file name
    SaveAs(String),
    /// Render the report
    Render,
    /// Upload a template or default table
    Upload(UploadKind, UploadPayload),
}

/// Backend response paired with the request it answers
enum Completion {
    Keys(KeysRequest, Result<KeyMap, BackendError>),
    Images(ImagesRequest, Result<Vec<ImageInfo>, BackendError>),
    LoadSession(SessionLoadRequest, Result<PropertyMap, BackendError>),
    Save(SaveRequest, Result<String, BackendError>),
    Render(Result<String, BackendError>),
    Upload(UploadKind, Result<String, BackendError>),
}

/// Runs controller requests against a backend
pub struct Dispatcher {
    backend: Arc<dyn ReportBackend>,
    timeout: Duration,
    read_retries: u32,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl Dispatcher {
    /// Create dispatcher
    pub fn new(backend: Arc<dyn ReportBackend>, config: &CarConfig) -> Self {
        Self {
            backend,
            timeout: config.request_timeout(),
            read_retries: config.read_retries,
            pending: FuturesUnordered::new(),
        }
    }

    /// Number of requests in flight
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// True when no request is in flight
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Apply a command to the controller and start the request it produces
    ///
    /// Precondition failures (no table, no file name, wrong file type) are
    /// returned without contacting the backend.
    pub fn dispatch(
        &mut self,
        controller: &mut SessionController,
        command: Command,
    ) -> Result<(), CarError> {
        let request = match command {
            Command::SelectDefaultTable(path) => {
                controller.begin_table_change(&path).map(Request::Keys)
            }
            Command::SelectFiguresDirectory(directory) => controller
                .begin_figures_directory(&directory)
                .map(Request::Images),
            Command::LoadSession(filename) => {
                Some(Request::LoadSession(controller.begin_session_load(&filename)))
            }
            Command::Save => Some(Request::Save(controller.prepare_save()?)),
            Command::SaveAs(filename) => Some(Request::Save(controller.prepare_save_as(&filename)?)),
            Command::Render => Some(Request::Render(controller.prepare_render()?)),
            Command::Upload(kind, payload) => {
                Some(Request::Upload(controller.prepare_upload(kind, payload)?))
            }
        };

        if let Some(request) = request {
            self.submit(request);
        }
        Ok(())
    }

    /// Start a request
    pub fn submit(&mut self, request: Request) {
        let backend = Arc::clone(&self.backend);
        let budget = self.timeout;
        let retries = self.read_retries;

        let task = match request {
            Request::Keys(request) => async move {
                let result = with_retries(budget, retries, || {
                    backend.fetch_document_keys(&request.table_path)
                })
                .await;
                Completion::Keys(request, result)
            }
            .boxed(),
            Request::Images(request) => async move {
                let result =
                    with_retries(budget, retries, || backend.fetch_images(&request.directory))
                        .await;
                Completion::Images(request, result)
            }
            .boxed(),
            Request::LoadSession(request) => async move {
                let result =
                    with_retries(budget, retries, || backend.load_session(&request.filename))
                        .await;
                Completion::LoadSession(request, result)
            }
            .boxed(),
            Request::Save(request) => async move {
                let result = bounded(budget, backend.save_session(&request.properties)).await;
                Completion::Save(request, result)
            }
            .boxed(),
            Request::Render(request) => async move {
                let result = bounded(budget, backend.render_document(&request.properties)).await;
                Completion::Render(result)
            }
            .boxed(),
            Request::Upload(request) => async move {
                let result =
                    bounded(budget, backend.upload_file(request.kind, &request.payload)).await;
                Completion::Upload(request.kind, result)
            }
            .boxed(),
        };

        self.pending.push(task);
        tracing::trace!(pending = self.pending.len(), "request submitted");
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self, controller: &mut SessionController) -> Option<Outcome> {
        let completion = self.pending.next().await?;
        Some(self.apply(controller, completion))
    }

    /// Apply completions until nothing is in flight, follow-ups included
    pub async fn run_until_idle(&mut self, controller: &mut SessionController) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_completion(controller).await {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn apply(&mut self, controller: &mut SessionController, completion: Completion) -> Outcome {
        match completion {
            Completion::Keys(request, result) => controller.complete_table_change(request, result),
            Completion::Images(request, result) => controller.complete_images_fetch(request, result),
            Completion::LoadSession(request, result) => {
                let (outcome, follow_ups) = controller.complete_session_load(request, result);
                for follow_up in follow_ups {
                    self.submit(follow_up);
                }
                outcome
            }
            Completion::Save(request, result) => controller.complete_save(request, result),
            Completion::Render(result) => controller.complete_render(result),
            Completion::Upload(kind, result) => controller.complete_upload(kind, result),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .field("read_retries", &self.read_retries)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Run an idempotent call, repeating it up to `retries` times while it fails
/// with a retryable error
async fn with_retries<T, F, Fut>(
    budget: Duration,
    retries: u32,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut remaining = retries;
    loop {
        match bounded(budget, call()).await {
            Err(err) if err.is_retryable() && remaining > 0 => {
                remaining -= 1;
                tracing::debug!(error = %err, remaining, "retrying read");
            }
            result => return result,
        }
    }
}

async fn bounded<T>(
    budget: Duration,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            secs: budget.as_secs(),
        }),
    }
}
