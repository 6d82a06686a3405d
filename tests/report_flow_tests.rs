mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{counting_close_hook, ScriptedSubmitter};
use quote_flow::config::FlowConfig;
use quote_flow::messages;
use quote_flow::report::{ReportFlow, ReportKind, ReportPayload, ReportReason};
use quote_flow::submission::{
    noop_close_hook, CloseHook, SubmissionState, SubmitAttempt, SubmitFailure, SubmitOperation,
};

fn open(
    kind: ReportKind,
    submitter: &Arc<ScriptedSubmitter<ReportPayload>>,
    on_close: CloseHook,
) -> ReportFlow {
    let operation: Arc<dyn SubmitOperation<ReportPayload>> = submitter.clone();
    ReportFlow::new(kind, "req-1001", operation, &FlowConfig::default(), on_close)
}

#[tokio::test(start_paused = true)]
async fn issue_report_submits_and_closes_after_reading_delay() {
    let submitter = ScriptedSubmitter::succeeding();
    let (on_close, closes) = counting_close_hook();
    let mut flow = open(ReportKind::Issue, &submitter, on_close);

    assert!(flow.select_reason("no_show").unwrap());
    assert!(flow.set_details("   "));
    let pending = flow.submit().into_pending().expect("dispatched");
    assert!(!flow.controls_enabled());
    assert_eq!(pending.settled().await.unwrap(), SubmissionState::Success);

    let payload = submitter.last().unwrap();
    assert_eq!(payload.kind, ReportKind::Issue);
    assert_eq!(payload.subject_id, "req-1001");
    assert_eq!(payload.reason, "Hizmet veren gelmedi");
    assert_eq!(payload.details, None);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert!(!flow.is_closed());
    tokio::time::sleep(Duration::from_millis(1_001)).await;
    assert!(flow.is_closed());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispute_failure_keeps_selection_for_retry() {
    let submitter = ScriptedSubmitter::new(vec![Err(SubmitFailure::new("Zaman aşımı"))]);
    let mut flow = open(ReportKind::Dispute, &submitter, noop_close_hook());

    flow.select_reason("price_mismatch").unwrap();
    flow.set_details("Teklif 500 TL idi, 800 TL istendi.");
    let state = flow.submit().into_pending().unwrap().settled().await.unwrap();
    assert_eq!(state, SubmissionState::Error);
    assert_eq!(flow.submission_error().as_deref(), Some("Zaman aşımı"));
    assert_eq!(flow.selected_reason().map(|r| r.id.as_str()), Some("price_mismatch"));

    let state = flow.submit().into_pending().unwrap().settled().await.unwrap();
    assert_eq!(state, SubmissionState::Success);
    assert_eq!(submitter.calls(), 2);
    assert_eq!(
        submitter.last().unwrap().details.as_deref(),
        Some("Teklif 500 TL idi, 800 TL istendi.")
    );
}

#[test]
fn missing_reason_surfaces_inline_message() {
    let submitter = ScriptedSubmitter::succeeding();
    let mut flow = open(ReportKind::Issue, &submitter, noop_close_hook());

    assert!(matches!(flow.submit(), SubmitAttempt::Invalid));
    assert_eq!(flow.reason_error(), Some(messages::REPORT_REASON_REQUIRED));
    assert_eq!(submitter.calls(), 0);
}

#[test]
fn custom_reasons_replace_defaults() {
    let submitter = ScriptedSubmitter::succeeding();
    let flow = open(ReportKind::Issue, &submitter, noop_close_hook())
        .with_reasons(vec![ReportReason::new("late", "Geç kaldı")]);

    assert_eq!(flow.reasons().len(), 1);
    assert!(flow.selected_reason().is_none());
}

#[test]
fn payload_serializes_camel_case() {
    let payload = ReportPayload {
        kind: ReportKind::Dispute,
        subject_id: "job-9".into(),
        reason_id: "damage".into(),
        reason: "Hasar oluştu".into(),
        details: None,
        created_at: chrono::Utc::now(),
    };
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["kind"], "dispute");
    assert_eq!(json["subjectId"], "job-9");
    assert!(json.get("details").is_none());
    assert!(json.get("createdAt").is_some());
}
