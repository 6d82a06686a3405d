//! Single-step issue and dispute reports.
//!
//! Both flows pick one reason from a fixed list, optionally add free-text
//! details and submit through the shared [`SubmissionController`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::errors::{FlowError, FlowResult};
use crate::messages;
use crate::schema::presets;
use crate::submission::{
    CloseHook, SubmissionController, SubmissionState, SubmitAttempt, SubmitOperation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Issue,
    Dispute,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Issue => "Sorun Bildir",
            ReportKind::Dispute => "İtiraz Et",
        }
    }

    /// Built-in reason list for the kind.
    pub fn default_reasons(self) -> Vec<ReportReason> {
        match self {
            ReportKind::Issue => presets::issue_reasons(),
            ReportKind::Dispute => presets::dispute_reasons(),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportKind::Issue => "issue",
            ReportKind::Dispute => "dispute",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportReason {
    pub id: String,
    pub label: String,
}

impl ReportReason {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Body sent to the remote service for a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub kind: ReportKind,
    pub subject_id: String,
    pub reason_id: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One open report or dispute dialog.
pub struct ReportFlow {
    id: Uuid,
    kind: ReportKind,
    subject_id: String,
    reasons: Vec<ReportReason>,
    selected: Option<usize>,
    details: String,
    reason_error: Option<&'static str>,
    submission: SubmissionController<ReportPayload>,
}

impl ReportFlow {
    /// Opens a flow about `subject_id` (the request or job being reported).
    pub fn new(
        kind: ReportKind,
        subject_id: impl Into<String>,
        submitter: Arc<dyn SubmitOperation<ReportPayload>>,
        config: &FlowConfig,
        on_close: CloseHook,
    ) -> Self {
        let flow_name = match kind {
            ReportKind::Issue => "issue_report",
            ReportKind::Dispute => "dispute_report",
        };
        let submission = SubmissionController::new(submitter, config.report_close_delay())
            .with_close_hook(on_close)
            .with_generic_error(config.generic_error_message.clone())
            .with_flow_name(flow_name);
        Self {
            id: Uuid::new_v4(),
            kind,
            subject_id: subject_id.into(),
            reasons: kind.default_reasons(),
            selected: None,
            details: String::new(),
            reason_error: None,
            submission,
        }
    }

    /// Replaces the built-in reason list.
    pub fn with_reasons(mut self, reasons: Vec<ReportReason>) -> Self {
        self.reasons = reasons;
        self.selected = None;
        self
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn reasons(&self) -> &[ReportReason] {
        &self.reasons
    }

    pub fn selected_reason(&self) -> Option<&ReportReason> {
        self.selected.and_then(|index| self.reasons.get(index))
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn reason_error(&self) -> Option<&'static str> {
        self.reason_error
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub fn submission_error(&self) -> Option<String> {
        self.submission.error_message()
    }

    pub fn controls_enabled(&self) -> bool {
        !self.submission.is_busy() && !self.submission.is_disposed()
    }

    pub fn is_closed(&self) -> bool {
        self.submission.is_closed()
    }

    /// Returns `Ok(false)` when controls are locked.
    pub fn select_reason(&mut self, reason_id: &str) -> FlowResult<bool> {
        let index = self
            .reasons
            .iter()
            .position(|reason| reason.id == reason_id)
            .ok_or_else(|| FlowError::UnknownReason(reason_id.to_string()))?;
        if !self.controls_enabled() {
            return Ok(false);
        }
        self.selected = Some(index);
        self.reason_error = None;
        Ok(true)
    }

    pub fn set_details(&mut self, details: impl Into<String>) -> bool {
        if !self.controls_enabled() {
            return false;
        }
        self.details = details.into();
        true
    }

    /// Validates the reason and dispatches the report. Must be called inside
    /// a tokio runtime; the submit call is spawned onto it.
    pub fn submit(&mut self) -> SubmitAttempt {
        if !self.controls_enabled() {
            return SubmitAttempt::Ignored;
        }
        let Some(reason) = self.selected_reason().cloned() else {
            self.reason_error = Some(messages::REPORT_REASON_REQUIRED);
            return SubmitAttempt::Invalid;
        };
        let details = self.details.trim();
        let payload = ReportPayload {
            kind: self.kind,
            subject_id: self.subject_id.clone(),
            reason_id: reason.id,
            reason: reason.label,
            details: (!details.is_empty()).then(|| details.to_string()),
            created_at: Utc::now(),
        };
        info!(report = %self.id, kind = %self.kind, subject = %self.subject_id, "submitting report");
        match self.submission.submit(payload) {
            Some(pending) => SubmitAttempt::Dispatched(pending),
            None => SubmitAttempt::Ignored,
        }
    }

    pub fn dispose(&mut self) {
        self.submission.dispose();
    }
}
