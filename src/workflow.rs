//! The workflow controller: upload → dashboard → chart.
//!
//! Backend calls run as tokio tasks. Their results come back over a channel and
//! are applied by [`WorkflowController::poll`] on the caller's thread, so every
//! state change happens in one place, in order, between frames.
//!
//! Two tokens guard against late results:
//! - the reset `epoch`, checked by upload and suggestion completions together
//!   with the phase they were issued from;
//! - the chart [`RequestId`], checked by [`ChartSession::resolve`].

use crate::{
    Backend, ChartConfig, ChartOutcome, ChartRequestState, ChartSession, ChartSpec,
    ColumnProfiles, DisplayRow, Element, Notifier, Presenter, ProfilerError, ProfilerResult,
    Region, RequestId, SuggestionItem, SuggestionRegistry, ToastKind, UploadResponse, present,
};

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

/// Shown in the suggestion list when the backend has nothing to propose.
pub const NO_SUGGESTIONS_HINT: &str = "No suggestions could be generated.";

/// Top-level view state. Decides which view is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Uploading,
    Dashboard,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Uploading => "uploading",
            WorkflowPhase::Dashboard => "dashboard",
        };
        f.write_str(name)
    }
}

/// The file the user picked, plus the optional date-format hint sent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    /// Trimmed; `None` when blank.
    pub date_format: Option<String>,
}

impl UploadCandidate {
    pub fn new(path: impl AsRef<Path>, date_format: Option<String>) -> Self {
        UploadCandidate {
            path: path.as_ref().to_path_buf(),
            date_format: date_format
                .map(|format| format.trim().to_string())
                .filter(|format| !format.is_empty()),
        }
    }

    /// File name sent to the backend and shown in the upload view.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Called by background tasks after delivering a result, to wake the UI.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// A finished backend call, waiting to be applied.
enum Completion {
    Upload {
        epoch: u64,
        result: ProfilerResult<UploadResponse>,
    },
    Suggest {
        epoch: u64,
        result: ProfilerResult<Vec<ChartConfig>>,
    },
    Chart {
        request: RequestId,
        result: ProfilerResult<ChartSpec>,
    },
}

/// Owns all mutable workflow state. One instance per application session.
pub struct WorkflowController<P: Presenter> {
    backend: Arc<dyn Backend>,
    runtime: Handle,
    presenter: P,
    notifier: Notifier,

    phase: WorkflowPhase,
    candidate: Option<UploadCandidate>,
    filename: Option<String>,
    columns: ColumnProfiles,
    suggestions: SuggestionRegistry,
    chart: ChartSession,
    epoch: u64,
    /// A suggestion fetch of the current epoch has not answered yet.
    suggest_pending: bool,

    sender: UnboundedSender<Completion>,
    receiver: UnboundedReceiver<Completion>,
    repaint: Option<RepaintHook>,
    /// Outstanding backend tasks, aborted when the controller is dropped.
    tasks: Vec<JoinHandle<()>>,
}

impl<P: Presenter> WorkflowController<P> {
    pub fn new(
        backend: Arc<dyn Backend>,
        runtime: Handle,
        presenter: P,
        notifier: Notifier,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        WorkflowController {
            backend,
            runtime,
            presenter,
            notifier,
            phase: WorkflowPhase::Idle,
            candidate: None,
            filename: None,
            columns: ColumnProfiles::new(),
            suggestions: SuggestionRegistry::default(),
            chart: ChartSession::default(),
            epoch: 0,
            suggest_pending: false,
            sender,
            receiver,
            repaint: None,
            tasks: Vec::new(),
        }
    }

    /// Installs a hook run by background tasks once their result is queued.
    pub fn with_repaint(mut self, repaint: RepaintHook) -> Self {
        self.repaint = Some(repaint);
        self
    }

    // --- Operations ---

    /// Replaces the upload candidate. No network effect.
    pub fn select_file(&mut self, path: impl AsRef<Path>, date_format: Option<String>) {
        let candidate = UploadCandidate::new(path, date_format);
        debug!("Selected {:?} (date format: {:?})", candidate.path, candidate.date_format);

        self.presenter
            .set_text(Region::SelectedFile, &candidate.file_name());
        self.presenter.set_visible(Region::SelectedFile, true);
        self.candidate = Some(candidate);
    }

    /// Sends the current candidate to the backend.
    ///
    /// Fails without any request when no file is selected or the workflow is not idle.
    pub fn submit_upload(&mut self) -> ProfilerResult<()> {
        if self.phase != WorkflowPhase::Idle {
            let err = ProfilerError::UploadRejected { phase: self.phase };
            warn!("{err}");
            return Err(err);
        }

        let Some(candidate) = self.candidate.clone() else {
            let err = ProfilerError::NoFileSelected;
            self.notifier.notify(err.to_string(), ToastKind::Error);
            return Err(err);
        };

        info!("Submitting {:?}", candidate.path);
        self.phase = WorkflowPhase::Uploading;
        self.set_uploading(true);

        let epoch = self.epoch;
        let future = self.backend.upload(&candidate);
        self.spawn(async move {
            Completion::Upload {
                epoch,
                result: future.await,
            }
        });
        Ok(())
    }

    /// Marks `config` as the active suggestion and requests its chart.
    ///
    /// Does nothing outside the dashboard.
    pub fn select_suggestion(&mut self, config: &ChartConfig) -> Option<RequestId> {
        if self.phase != WorkflowPhase::Dashboard {
            debug!("Ignoring suggestion '{}' in phase {}", config.title, self.phase);
            return None;
        }

        if self.suggestions.set_active(config).is_none() {
            debug!("Suggestion '{}' is not in the current list", config.title);
        }
        self.render_suggestions();
        Some(self.request_chart(config))
    }

    /// [`WorkflowController::select_suggestion`] for the entry at `index`.
    pub fn select_suggestion_at(&mut self, index: usize) -> Option<RequestId> {
        let config = self.suggestions.get(index)?.clone();
        self.select_suggestion(&config)
    }

    /// Returns to the initial state from any phase.
    ///
    /// Outstanding requests are not aborted; their results are ignored when they arrive.
    pub fn reset(&mut self) {
        info!("Resetting workflow (phase {})", self.phase);
        self.epoch += 1;
        self.suggest_pending = false;
        self.chart.cancel();

        self.phase = WorkflowPhase::Idle;
        self.candidate = None;
        self.filename = None;
        self.columns.clear();
        self.suggestions.clear();

        let view = &mut self.presenter;
        view.set_visible(Region::UploadView, true);
        view.set_visible(Region::DashboardView, false);
        view.set_visible(Region::ResetButton, false);
        view.set_text(Region::SelectedFile, "");
        view.set_visible(Region::SelectedFile, false);
        view.set_text(Region::FileNameHeader, "");
        view.clear_children(Region::ColumnList);
        view.clear_children(Region::SuggestionList);
        view.clear_children(Region::ChartDisplay);
        view.set_visible(Region::ChartPlaceholder, true);
        view.set_visible(Region::ChartLoader, false);
        self.set_uploading(false);
    }

    /// Applies every backend result received so far. Call once per frame.
    ///
    /// Returns `true` if anything was applied.
    pub fn poll(&mut self) -> bool {
        let mut applied = false;

        while let Ok(completion) = self.receiver.try_recv() {
            applied = true;
            match completion {
                Completion::Upload { epoch, result } => self.apply_upload(epoch, result),
                Completion::Suggest { epoch, result } => self.apply_suggestions(epoch, result),
                Completion::Chart { request, result } => self.apply_chart(request, result),
            }
        }

        self.tasks.retain(|task| !task.is_finished());
        applied
    }

    // --- Accessors ---

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn columns(&self) -> &ColumnProfiles {
        &self.columns
    }

    pub fn display_rows(&self) -> Vec<DisplayRow> {
        present(&self.columns)
    }

    pub fn suggestions(&self) -> &SuggestionRegistry {
        &self.suggestions
    }

    pub fn chart_state(&self) -> ChartRequestState {
        self.chart.state()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn view(&self) -> &P {
        &self.presenter
    }

    /// `true` while a backend call whose result would still be applied is outstanding,
    /// or a delivered result is waiting for [`WorkflowController::poll`].
    ///
    /// Requests made stale by a reset or a newer chart click do not count.
    pub fn is_busy(&self) -> bool {
        self.phase == WorkflowPhase::Uploading
            || self.suggest_pending
            || self.chart.is_pending()
            || !self.receiver.is_empty()
    }

    // --- Internals ---

    fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.tasks.retain(|task| !task.is_finished());

        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        let handle = self.runtime.spawn(async move {
            let completion = future.await;
            if sender.send(completion).is_err() {
                error!("Controller dropped before a backend result could be delivered.");
            }
            if let Some(repaint) = repaint {
                repaint();
            }
        });

        self.tasks.push(handle);
    }

    fn apply_upload(&mut self, epoch: u64, result: ProfilerResult<UploadResponse>) {
        if epoch != self.epoch || self.phase != WorkflowPhase::Uploading {
            debug!("Discarding upload result issued before a reset");
            return;
        }

        self.set_uploading(false);
        match result {
            Ok(response) => {
                info!(
                    "Analyzed {} ({} columns)",
                    response.filename,
                    response.columns.len()
                );
                self.notifier.notify(
                    format!("Successfully analyzed {}", response.filename),
                    ToastKind::Success,
                );
                self.show_dashboard(response);
                self.fetch_suggestions();
            }
            Err(err) => {
                let err = ProfilerError::UploadFailed(err.detail());
                error!("Upload failed: {err}");
                self.phase = WorkflowPhase::Idle;
                self.notifier.notify(err.to_string(), ToastKind::Error);
            }
        }
    }

    fn show_dashboard(&mut self, response: UploadResponse) {
        self.phase = WorkflowPhase::Dashboard;

        let view = &mut self.presenter;
        view.set_visible(Region::UploadView, false);
        view.set_visible(Region::DashboardView, true);
        view.set_visible(Region::ResetButton, true);
        view.set_text(Region::FileNameHeader, &response.filename);

        self.filename = Some(response.filename);
        self.columns = response.columns;

        self.presenter.clear_children(Region::ColumnList);
        for row in present(&self.columns) {
            self.presenter
                .append_child(Region::ColumnList, Element::Column(row));
        }
    }

    fn fetch_suggestions(&mut self) {
        self.suggestions.clear();
        self.presenter.clear_children(Region::SuggestionList);

        self.suggest_pending = true;
        let epoch = self.epoch;
        let future = self.backend.suggest();
        self.spawn(async move {
            Completion::Suggest {
                epoch,
                result: future.await,
            }
        });
    }

    fn apply_suggestions(&mut self, epoch: u64, result: ProfilerResult<Vec<ChartConfig>>) {
        if epoch != self.epoch || self.phase != WorkflowPhase::Dashboard {
            debug!("Discarding suggestions issued before a reset");
            return;
        }

        self.suggest_pending = false;

        match result {
            Ok(configs) => {
                info!("Received {} chart suggestions", configs.len());
                self.suggestions.load(configs);
                self.render_suggestions();
            }
            Err(err) => {
                error!("Suggestion fetch failed: {err}");
                self.notifier
                    .notify(ProfilerError::SuggestFetchFailed.to_string(), ToastKind::Error);
            }
        }
    }

    fn render_suggestions(&mut self) {
        self.presenter.clear_children(Region::SuggestionList);

        if self.suggestions.is_empty() {
            self.presenter.append_child(
                Region::SuggestionList,
                Element::Hint(NO_SUGGESTIONS_HINT.to_string()),
            );
            return;
        }

        for (index, config) in self.suggestions.items().iter().enumerate() {
            let item = SuggestionItem {
                title: config.title.clone(),
                chart_type: config.chart_type.clone(),
                active: self.suggestions.is_active(index),
            };
            self.presenter
                .append_child(Region::SuggestionList, Element::Suggestion(item));
        }
    }

    fn request_chart(&mut self, config: &ChartConfig) -> RequestId {
        let request = self.chart.begin();
        debug!("Chart request {request} for '{}'", config.title);

        self.presenter.set_visible(Region::ChartPlaceholder, false);
        self.presenter.clear_children(Region::ChartDisplay);
        self.presenter.set_visible(Region::ChartLoader, true);

        let future = self.backend.generate_chart(config);
        self.spawn(async move {
            Completion::Chart {
                request,
                result: future.await,
            }
        });
        request
    }

    fn apply_chart(&mut self, request: RequestId, result: ProfilerResult<ChartSpec>) {
        match self.chart.resolve(request, result) {
            ChartOutcome::Render(spec) => {
                self.presenter.set_visible(Region::ChartLoader, false);
                self.presenter.render_chart(Region::ChartDisplay, spec);
            }
            ChartOutcome::Failed(err) => {
                error!("Chart request {request} failed: {err}");
                self.presenter.set_visible(Region::ChartLoader, false);
                self.presenter.set_visible(Region::ChartPlaceholder, true);
                self.notifier.notify(err.to_string(), ToastKind::Error);
            }
            ChartOutcome::Superseded => {}
        }
    }

    fn set_uploading(&mut self, uploading: bool) {
        self.presenter.set_enabled(Region::UploadButton, !uploading);
        self.presenter.set_visible(Region::UploadSpinner, uploading);
    }
}

impl<P: Presenter> Drop for WorkflowController<P> {
    fn drop(&mut self) {
        let outstanding: Vec<_> = self
            .tasks
            .drain(..)
            .filter(|task| !task.is_finished())
            .collect();
        if !outstanding.is_empty() {
            debug!("Aborting {} outstanding backend tasks", outstanding.len());
        }
        for task in outstanding {
            task.abort();
        }
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
