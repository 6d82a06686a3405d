use std::fmt;

use serde::Serialize;

/// Phase of one asynchronous submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionState {
    /// Only idle and failed submissions may (re)enter `Submitting`.
    pub fn accepts_submit(self) -> bool {
        matches!(self, SubmissionState::Idle | SubmissionState::Error)
    }

    /// While busy, every control except back/close is disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, SubmissionState::Submitting | SubmissionState::Success)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Success => "success",
            SubmissionState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Rejection reported by a remote submit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    reason: Option<String>,
}

impl SubmitFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Failure without a usable reason.
    pub fn unknown() -> Self {
        Self { reason: None }
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// User-visible message, `fallback` when the reason is missing or blank.
    pub fn message(&self, fallback: &str) -> String {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason.as_deref().unwrap_or("unknown failure"))
    }
}

impl From<&str> for SubmitFailure {
    fn from(reason: &str) -> Self {
        SubmitFailure::new(reason)
    }
}

impl From<String> for SubmitFailure {
    fn from(reason: String) -> Self {
        SubmitFailure::new(reason)
    }
}

/// The four-state machine without any I/O attached.
///
/// `idle -> submitting -> success | error`, `error -> submitting` on retry.
/// `success` is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionLifecycle {
    state: SubmissionState,
    error_message: Option<String>,
}

impl SubmissionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Enters `Submitting` and clears the previous error. Returns `false`
    /// (leaving everything untouched) when a submit is not allowed.
    pub fn begin(&mut self) -> bool {
        if !self.state.accepts_submit() {
            return false;
        }
        self.state = SubmissionState::Submitting;
        self.error_message = None;
        true
    }

    pub fn succeed(&mut self) -> bool {
        if self.state != SubmissionState::Submitting {
            return false;
        }
        self.state = SubmissionState::Success;
        true
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.state != SubmissionState::Submitting {
            return false;
        }
        self.state = SubmissionState::Error;
        self.error_message = Some(message.into());
        true
    }
}
