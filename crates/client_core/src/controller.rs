use std::{sync::Arc, time::Duration};

use shared::{
    domain::{FieldId, FieldMarker, FileCandidate, ProgressState},
    messages,
};
use storage::SnapshotPersistence;
use tracing::{debug, error, info, warn};

use crate::{
    attachments::{AttachmentRejection, AttachmentStore},
    clock::{Clock, Deadlines, SystemClock, TimerEvent},
    config::FormSettings,
    host::HostBridge,
    progress::{recompute, CommentCounter},
    transport::{ReportPayload, ReportTransport, TransportError},
    validation::{advisory_for, dependents_of, normalize_currency_input, validate, FormState},
    view::{FormView, ToastKind, ViewUpdate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Submitted,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted,
    /// The form still has missing or invalid answers.
    Invalid,
    Failed(TransportError),
    /// A submission is in flight or already done.
    Ignored,
}

pub struct ReportFormController {
    form: FormState,
    attachments: AttachmentStore,
    progress: ProgressState,
    state: SubmissionState,
    persistence: SnapshotPersistence,
    transport: Arc<dyn ReportTransport>,
    view: Arc<dyn FormView>,
    host: HostBridge,
    clock: Arc<dyn Clock>,
    deadlines: Deadlines,
    autosave_interval: Duration,
    host_close_delay: Duration,
    submit_timeout: Duration,
    running: bool,
    restored: bool,
}

impl ReportFormController {
    pub fn new(
        settings: &FormSettings,
        persistence: SnapshotPersistence,
        transport: Arc<dyn ReportTransport>,
        view: Arc<dyn FormView>,
    ) -> Self {
        Self {
            form: FormState::default(),
            attachments: AttachmentStore::default(),
            progress: recompute(&FormState::default(), 0),
            state: SubmissionState::Idle,
            persistence,
            transport,
            view,
            host: HostBridge::detached(),
            clock: Arc::new(SystemClock),
            deadlines: Deadlines::default(),
            autosave_interval: settings.autosave_interval,
            host_close_delay: settings.host_close_delay,
            submit_timeout: settings.submit_timeout,
            running: false,
            restored: false,
        }
    }

    pub fn with_host(mut self, host: HostBridge) -> Self {
        self.host = host;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn progress(&self) -> ProgressState {
        self.progress
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub async fn start(&mut self) {
        if self.running {
            debug!("report form controller already running");
            return;
        }
        self.running = true;
        self.host.initialize();

        if !self.restored {
            self.restored = true;
            self.restore().await;
        }

        self.refresh_progress();
        self.refresh_submit_button();
        if self.state != SubmissionState::Submitted {
            self.deadlines
                .arm_autosave(self.clock.now(), self.autosave_interval);
        }
        info!(
            completed = self.progress.completed,
            total = self.progress.total,
            hosted = self.host.is_attached(),
            "report form controller started"
        );
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.deadlines.disarm_all();
        info!("report form controller stopped");
    }

    pub async fn handle_input(&mut self, field: FieldId, raw: &str) {
        if field.is_file() {
            warn!(%field, "file selections go through handle_files");
            return;
        }
        if self.state == SubmissionState::Submitted {
            debug!(%field, "input ignored after submission");
            return;
        }

        let value = if field == FieldId::DealAmount {
            normalize_currency_input(raw)
        } else {
            raw.to_string()
        };
        if value != raw {
            self.view.apply(ViewUpdate::FieldValue {
                field,
                value: value.clone(),
            });
        }
        self.form.set_value(field, value);

        self.validate_field(field);
        self.apply_cross_validation(field);
        if field == FieldId::Comments {
            self.render_comment_count();
        }
        self.refresh_progress();
        self.refresh_submit_button();
        self.persist().await;
    }

    pub fn handle_blur(&mut self, field: FieldId) {
        if self.state == SubmissionState::Submitted {
            return;
        }
        self.validate_field(field);
        self.refresh_progress();
        self.refresh_submit_button();
    }

    /// Replaces every current attachment.
    pub async fn handle_files(&mut self, candidates: Vec<FileCandidate>) {
        if self.state == SubmissionState::Submitted {
            debug!("file selection ignored after submission");
            return;
        }
        let batch = self.attachments.replace(candidates);
        info!(
            accepted = batch.accepted,
            rejected = batch.rejection.is_some(),
            "attachment selection processed"
        );
        self.render_attachments(batch.rejection);
        self.refresh_progress();
        self.refresh_submit_button();
        self.persist().await;
    }

    pub async fn remove_attachment(&mut self, index: usize) -> bool {
        if self.state == SubmissionState::Submitted {
            return false;
        }
        let Some(removed) = self.attachments.remove(index) else {
            warn!(index, "no attachment at index");
            return false;
        };
        info!(index, name = removed.name(), "attachment removed");
        self.render_attachments(None);
        self.refresh_progress();
        self.refresh_submit_button();
        self.persist().await;
        true
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        if matches!(
            self.state,
            SubmissionState::Submitting | SubmissionState::Submitted
        ) {
            debug!(state = ?self.state, "submit ignored");
            return SubmitOutcome::Ignored;
        }

        self.state = SubmissionState::Validating;
        if !self.validate_all() {
            self.state = SubmissionState::Idle;
            self.refresh_progress();
            self.refresh_submit_button();
            self.notify(ToastKind::Error, messages::FORM_INCOMPLETE);
            info!("report submission blocked by validation");
            return SubmitOutcome::Invalid;
        }

        self.state = SubmissionState::Submitting;
        self.view.apply(ViewUpdate::SubmitButton {
            enabled: false,
            loading: true,
        });
        self.host.disable_main_button();

        let payload = ReportPayload::assemble(&self.form, &self.attachments);
        info!(
            fields = payload.fields.len(),
            attachments = payload.attachments.len(),
            "submitting report"
        );
        let result =
            match tokio::time::timeout(self.submit_timeout, self.transport.submit(&payload)).await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.submit_timeout)),
            };

        match result {
            Ok(()) => {
                self.finish_submission().await;
                SubmitOutcome::Submitted
            }
            Err(err) => {
                error!(error = %err, "report submission failed");
                self.state = SubmissionState::Idle;
                self.notify(ToastKind::Error, messages::SUBMISSION_FAILED);
                self.refresh_submit_button();
                self.host.sync_main_button(self.progress.is_complete());
                SubmitOutcome::Failed(err)
            }
        }
    }

    pub async fn on_main_button(&mut self) -> SubmitOutcome {
        self.submit().await
    }

    /// Back/cancel from the host shell. Returns whether the shell was closed.
    pub async fn on_back_button(&mut self) -> bool {
        self.host.request_close(self.has_unsaved_changes()).await
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.form.has_any_value() || !self.attachments.is_empty()
    }

    /// Saves pending work; `true` when the user should be warned about leaving.
    pub async fn page_exit(&mut self) -> bool {
        if self.state == SubmissionState::Submitted || !self.has_unsaved_changes() {
            return false;
        }
        self.persist().await;
        true
    }

    pub async fn poll_timers(&mut self) {
        let now = self.clock.now();
        for event in self.deadlines.take_due(now) {
            match event {
                TimerEvent::Autosave => {
                    debug!("autosave tick");
                    self.persist().await;
                }
                TimerEvent::CloseHost => {
                    info!("closing host after successful submission");
                    self.host.close();
                }
            }
        }
    }

    async fn restore(&mut self) {
        let Some(snapshot) = self.persistence.load().await else {
            return;
        };

        let mut restored = Vec::new();
        for (field, value) in snapshot.known_fields() {
            self.form.set_value(field, value);
            self.view.apply(ViewUpdate::FieldValue {
                field,
                value: value.to_string(),
            });
            restored.push(field);
        }
        // Bounds compare against newLeads, so validate once every value is in.
        for field in &restored {
            self.validate_field(*field);
        }
        let restored_fields = restored.len();

        if !self.form.is_blank(FieldId::Comments) {
            self.render_comment_count();
        }
        if !snapshot.uploaded_file_names.is_empty() {
            self.view.apply(ViewUpdate::RestoredAttachmentNames(
                snapshot.uploaded_file_names.clone(),
            ));
        }
        info!(
            fields = restored_fields,
            previous_files = snapshot.uploaded_file_names.len(),
            "restored stored report snapshot"
        );
    }

    async fn finish_submission(&mut self) {
        self.state = SubmissionState::Submitted;
        self.deadlines.disarm_autosave();
        if let Err(err) = self.persistence.clear().await {
            warn!(error = %err, "failed to clear stored report snapshot");
        }

        self.view.apply(ViewUpdate::SubmitButton {
            enabled: false,
            loading: false,
        });
        self.view.apply(ViewUpdate::SuccessPanel);
        if !self.host.is_attached() {
            self.view.apply(ViewUpdate::Toast {
                kind: ToastKind::Success,
                message: messages::SUBMISSION_SUCCEEDED.to_string(),
            });
        }
        self.host.sync_main_button(false);

        if self.host.is_attached() {
            self.deadlines
                .schedule_close(self.clock.now() + self.host_close_delay);
        }
        info!("report submitted");
    }

    fn validate_field(&mut self, field: FieldId) -> bool {
        let result = validate(field, &self.form, self.attachments.len());
        let marker = if result.valid {
            FieldMarker::Valid
        } else {
            FieldMarker::Invalid
        };
        self.form.set_marker(field, marker);
        self.view.apply(ViewUpdate::FieldMarker { field, marker });
        self.view.apply(ViewUpdate::FieldMessage {
            field,
            message: result.message,
        });
        result.valid
    }

    fn apply_cross_validation(&mut self, changed: FieldId) {
        for dependent in dependents_of(changed) {
            self.validate_field(dependent);
        }
        if let Some((target, message)) = advisory_for(changed, &self.form) {
            debug!(%changed, %target, "advisory raised");
            self.view.apply(ViewUpdate::FieldMessage {
                field: target,
                message: Some(message.to_string()),
            });
        }
    }

    fn validate_all(&mut self) -> bool {
        for field in FieldId::ALL {
            self.validate_field(*field);
        }
        self.is_ready_to_submit()
    }

    fn is_ready_to_submit(&self) -> bool {
        let required_answered = FieldId::ALL
            .iter()
            .filter(|field| field.spec().required)
            .all(|field| {
                if field.is_file() {
                    !self.attachments.is_empty()
                } else {
                    !self.form.is_blank(*field)
                }
            });
        required_answered && !self.form.has_active_error()
    }

    fn render_attachments(&mut self, rejection: Option<AttachmentRejection>) {
        self.view
            .apply(ViewUpdate::Attachments(self.attachments.summaries()));

        match rejection {
            Some(reason) => {
                warn!(file = reason.file_name(), reason = %reason, "attachment rejected");
                let marker = if self.attachments.is_empty() {
                    FieldMarker::Invalid
                } else {
                    FieldMarker::Valid
                };
                self.form.set_marker(FieldId::Receipts, marker);
                self.view.apply(ViewUpdate::FieldMarker {
                    field: FieldId::Receipts,
                    marker,
                });
                self.view.apply(ViewUpdate::FieldMessage {
                    field: FieldId::Receipts,
                    message: Some(reason.to_string()),
                });
            }
            None => {
                self.validate_field(FieldId::Receipts);
            }
        }
    }

    fn render_comment_count(&self) {
        let counter = CommentCounter::for_form(&self.form);
        self.view.apply(ViewUpdate::CommentCount {
            count: counter.count,
            limit: counter.limit,
            over_limit: counter.over_limit(),
        });
    }

    fn refresh_progress(&mut self) {
        self.progress = recompute(&self.form, self.attachments.len());
        self.view.apply(ViewUpdate::Progress(self.progress));
        if self.state == SubmissionState::Idle {
            self.host.sync_main_button(self.progress.is_complete());
        }
    }

    fn refresh_submit_button(&self) {
        self.view.apply(ViewUpdate::SubmitButton {
            enabled: self.state == SubmissionState::Idle && self.is_ready_to_submit(),
            loading: self.state == SubmissionState::Submitting,
        });
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        if !self.host.alert(message) {
            self.view.apply(ViewUpdate::Toast {
                kind,
                message: message.to_string(),
            });
        }
    }

    async fn persist(&self) {
        if self.state == SubmissionState::Submitted {
            return;
        }
        let snapshot = self.form.to_snapshot(self.attachments.names());
        if let Err(err) = self.persistence.save(&snapshot).await {
            warn!(error = %err, "failed to persist report snapshot");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
