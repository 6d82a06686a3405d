//! Submission lifecycle shared by the quote wizard and the report flows.

pub mod controller;
pub mod lifecycle;

pub use controller::{
    noop_close_hook, CloseHook, PendingSubmission, SubmissionController, SubmitAttempt,
    SubmitOperation,
};
pub use lifecycle::{SubmissionLifecycle, SubmissionState, SubmitFailure};
