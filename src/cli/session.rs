//! Drives a wizard or report flow through a [`FlowInteraction`].
//!
//! The session loop owns navigation: it walks the visible fields of the
//! current step, advances with `next`, and retries the final confirmation
//! after a failed submission. All rules stay in the controllers; this module
//! only routes user responses to them.

use tracing::debug;

use crate::answers::AnswerValue;
use crate::cli::output;
use crate::errors::{FlowError, FlowResult};
use crate::geolocation::{GeolocationProvider, LocationStatus};
use crate::report::{ReportFlow, ReportReason};
use crate::schema::FieldSchema;
use crate::submission::{SubmissionState, SubmitAttempt};
use crate::wizard::{StepTransition, WizardController};

/// Everything a prompt needs to render one field.
pub struct FieldPrompt<'a> {
    pub step_title: &'a str,
    pub step_subtitle: Option<&'a str>,
    pub step_number: usize,
    pub step_count: usize,
    pub progress: f32,
    pub field: &'a FieldSchema,
    pub current: Option<&'a AnswerValue>,
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldResponse {
    Value(AnswerValue),
    /// Leave the current answer as it is.
    Keep,
    /// Ask the device for its position (location fields only).
    Locate,
    Back,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Confirm,
    Back,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormResult {
    Submitted,
    Cancelled,
}

/// User side of a session: terminal prompts in the binary, scripted
/// responses in tests.
pub trait FlowInteraction {
    fn prompt_field(&mut self, prompt: &FieldPrompt<'_>) -> FieldResponse;

    fn confirm(&mut self, title: &str, lines: &[String]) -> ConfirmationResponse;

    /// Returns the chosen reason id, or `None` to cancel.
    fn choose_reason(&mut self, reasons: &[ReportReason], error: Option<&str>) -> Option<String>;

    /// Returns the details text, or `None` to keep the current one.
    fn prompt_details(&mut self, current: &str) -> Option<String>;
}

/// Runs the quote wizard until it is submitted or cancelled.
pub async fn run_quote_session<I, G>(
    wizard: &mut WizardController,
    interaction: &mut I,
    geolocation: &G,
) -> FlowResult<FormResult>
where
    I: FlowInteraction + ?Sized,
    G: GeolocationProvider + ?Sized,
{
    loop {
        match fill_current_step(wizard, interaction, geolocation).await? {
            StepOutcome::Cancelled => {
                wizard.dispose();
                return Ok(FormResult::Cancelled);
            }
            StepOutcome::Back => match wizard.back() {
                StepTransition::CloseRequested => {
                    wizard.dispose();
                    return Ok(FormResult::Cancelled);
                }
                _ => continue,
            },
            StepOutcome::Filled => {}
        }

        if !wizard.is_last_step() {
            if wizard.next() == StepTransition::Invalid {
                report_step_errors(wizard);
            }
            continue;
        }

        if let Some(result) = confirm_quote(wizard, interaction).await? {
            return Ok(result);
        }
    }
}

enum StepOutcome {
    Filled,
    Back,
    Cancelled,
}

async fn fill_current_step<I, G>(
    wizard: &mut WizardController,
    interaction: &mut I,
    geolocation: &G,
) -> FlowResult<StepOutcome>
where
    I: FlowInteraction + ?Sized,
    G: GeolocationProvider + ?Sized,
{
    let fields: Vec<FieldSchema> = wizard.visible_fields().into_iter().cloned().collect();
    let mut index = 0;
    while index < fields.len() {
        let field = &fields[index];
        let response = {
            let step = wizard.current_step();
            let prompt = FieldPrompt {
                step_title: &step.title,
                step_subtitle: step.subtitle.as_deref(),
                step_number: wizard.step_index() + 1,
                step_count: wizard.step_count(),
                progress: wizard.progress(),
                field,
                current: wizard.answer(&field.id),
                error: wizard.field_message(&field.id),
            };
            interaction.prompt_field(&prompt)
        };

        match response {
            FieldResponse::Value(value) => match wizard.set_answer(&field.id, value) {
                Ok(_) => index += 1,
                Err(err @ (FlowError::KindMismatch { .. } | FlowError::InvalidOption { .. })) => {
                    output::warning(err);
                }
                Err(err) => return Err(err),
            },
            FieldResponse::Keep => index += 1,
            FieldResponse::Locate => match wizard.locate(&field.id, geolocation).await {
                Ok(LocationStatus::Located(coordinates)) => {
                    output::success(format!("Konum alındı: {}", coordinates.to_text()));
                }
                Ok(LocationStatus::Failed(kind)) => output::warning(kind.message()),
                Ok(_) => {}
                Err(FlowError::KindMismatch { .. }) => {
                    output::warning("Bu alan konum desteklemiyor.");
                }
                Err(err) => return Err(err),
            },
            FieldResponse::Back if index > 0 => index -= 1,
            FieldResponse::Back => return Ok(StepOutcome::Back),
            FieldResponse::Cancel => return Ok(StepOutcome::Cancelled),
        }
    }
    Ok(StepOutcome::Filled)
}

/// `None` sends the session back to editing the last step.
async fn confirm_quote<I>(
    wizard: &mut WizardController,
    interaction: &mut I,
) -> FlowResult<Option<FormResult>>
where
    I: FlowInteraction + ?Sized,
{
    loop {
        let lines = summary_lines(wizard);
        match interaction.confirm("Talebinizi onaylıyor musunuz?", &lines) {
            ConfirmationResponse::Back => return Ok(None),
            ConfirmationResponse::Cancel => {
                wizard.dispose();
                return Ok(Some(FormResult::Cancelled));
            }
            ConfirmationResponse::Confirm => match wizard.confirm() {
                SubmitAttempt::Dispatched(pending) => match pending.settled().await? {
                    SubmissionState::Success => return Ok(Some(FormResult::Submitted)),
                    SubmissionState::Error => {
                        if let Some(message) = wizard.submission_error() {
                            output::error(message);
                        }
                    }
                    state => {
                        debug!(%state, "quote submission settled without a result");
                        return Ok(Some(FormResult::Cancelled));
                    }
                },
                SubmitAttempt::Invalid => {
                    report_step_errors(wizard);
                    return Ok(None);
                }
                SubmitAttempt::NotOnLastStep | SubmitAttempt::Ignored => return Ok(None),
            },
        }
    }
}

/// `label: value` for every answered field the user can see.
pub fn summary_lines(wizard: &WizardController) -> Vec<String> {
    wizard
        .schema()
        .fields()
        .filter(|field| field.is_visible_to(wizard.is_privileged()))
        .filter_map(|field| {
            wizard
                .answer(&field.id)
                .map(|value| format!("{}: {}", field.label, value.display()))
        })
        .collect()
}

fn report_step_errors(wizard: &WizardController) {
    for (_, message) in wizard.errors().iter() {
        output::warning(message);
    }
}

/// Runs an issue or dispute report until it is submitted or cancelled.
pub async fn run_report_session<I>(
    flow: &mut ReportFlow,
    interaction: &mut I,
) -> FlowResult<FormResult>
where
    I: FlowInteraction + ?Sized,
{
    'reason: loop {
        let Some(reason_id) = interaction.choose_reason(flow.reasons(), flow.reason_error())
        else {
            flow.dispose();
            return Ok(FormResult::Cancelled);
        };
        if let Err(err) = flow.select_reason(&reason_id) {
            output::warning(err);
            continue;
        }
        if let Some(details) = interaction.prompt_details(flow.details()) {
            flow.set_details(details);
        }

        loop {
            let mut lines = Vec::new();
            if let Some(reason) = flow.selected_reason() {
                lines.push(format!("Neden: {}", reason.label));
            }
            if !flow.details().trim().is_empty() {
                lines.push(format!("Açıklama: {}", flow.details().trim()));
            }
            match interaction.confirm(flow.kind().title(), &lines) {
                ConfirmationResponse::Back => continue 'reason,
                ConfirmationResponse::Cancel => {
                    flow.dispose();
                    return Ok(FormResult::Cancelled);
                }
                ConfirmationResponse::Confirm => match flow.submit() {
                    SubmitAttempt::Dispatched(pending) => match pending.settled().await? {
                        SubmissionState::Success => return Ok(FormResult::Submitted),
                        SubmissionState::Error => {
                            if let Some(message) = flow.submission_error() {
                                output::error(message);
                            }
                        }
                        _ => return Ok(FormResult::Cancelled),
                    },
                    SubmitAttempt::Invalid => continue 'reason,
                    SubmitAttempt::NotOnLastStep | SubmitAttempt::Ignored => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::config::FlowConfig;
    use crate::geolocation::{Coordinates, FixedPosition, UnsupportedGeolocation};
    use crate::report::{ReportKind, ReportPayload};
    use crate::schema::presets;
    use crate::submission::{noop_close_hook, SubmitFailure, SubmitOperation};
    use crate::wizard::QuotePayload;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockInteraction {
        prompts: VecDeque<FieldResponse>,
        confirmations: VecDeque<ConfirmationResponse>,
        reasons: VecDeque<String>,
        details: VecDeque<String>,
        seen_errors: Vec<String>,
    }

    impl MockInteraction {
        fn new(prompts: Vec<FieldResponse>, confirmations: Vec<ConfirmationResponse>) -> Self {
            Self {
                prompts: prompts.into(),
                confirmations: confirmations.into(),
                ..Self::default()
            }
        }
    }

    impl FlowInteraction for MockInteraction {
        fn prompt_field(&mut self, prompt: &FieldPrompt<'_>) -> FieldResponse {
            if let Some(error) = prompt.error {
                self.seen_errors.push(error.to_string());
            }
            self.prompts.pop_front().unwrap_or(FieldResponse::Cancel)
        }

        fn confirm(&mut self, _title: &str, _lines: &[String]) -> ConfirmationResponse {
            self.confirmations
                .pop_front()
                .unwrap_or(ConfirmationResponse::Cancel)
        }

        fn choose_reason(
            &mut self,
            _reasons: &[ReportReason],
            error: Option<&str>,
        ) -> Option<String> {
            if let Some(error) = error {
                self.seen_errors.push(error.to_string());
            }
            self.reasons.pop_front()
        }

        fn prompt_details(&mut self, _current: &str) -> Option<String> {
            self.details.pop_front()
        }
    }

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky<P> {
        failures: AtomicUsize,
        received: Mutex<Vec<P>>,
    }

    impl<P> Flaky<P> {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: AtomicUsize::new(failures),
                received: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl<P: Send + 'static> SubmitOperation<P> for Flaky<P> {
        async fn submit(&self, payload: P) -> Result<(), SubmitFailure> {
            self.received.lock().unwrap().push(payload);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(SubmitFailure::new("Sunucu meşgul."));
            }
            Ok(())
        }
    }

    fn wizard(submitter: Arc<Flaky<QuotePayload>>) -> WizardController {
        let submitter: Arc<dyn SubmitOperation<QuotePayload>> = submitter;
        WizardController::builder(
            presets::quote_schema().unwrap(),
            Category::new("painting", "Boya Badana"),
        )
        .build(submitter)
    }

    fn filled_quote_prompts() -> Vec<FieldResponse> {
        vec![
            FieldResponse::Value(AnswerValue::text("Salon boyası")),
            FieldResponse::Keep,
            FieldResponse::Value(AnswerValue::quantity("3", "Oda")),
            FieldResponse::Value(AnswerValue::choice("this_week")),
            FieldResponse::Value(AnswerValue::location("Kadıköy, İstanbul")),
            FieldResponse::Value(AnswerValue::Switch(true)),
        ]
    }

    #[tokio::test]
    async fn quote_session_submits_after_filling_every_step() {
        let submitter = Flaky::new(0);
        let mut wizard = wizard(submitter.clone());
        let mut interaction =
            MockInteraction::new(filled_quote_prompts(), vec![ConfirmationResponse::Confirm]);

        let result = run_quote_session(&mut wizard, &mut interaction, &UnsupportedGeolocation)
            .await
            .unwrap();

        assert_eq!(result, FormResult::Submitted);
        let received = submitter.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].answers.choice("urgency"), Some("this_week"));
        assert!(!received[0].answers.contains("internal_note"));
    }

    #[tokio::test]
    async fn invalid_step_is_prompted_again_with_errors() {
        let submitter = Flaky::new(0);
        let mut wizard = wizard(submitter);
        let mut prompts = vec![
            FieldResponse::Keep,
            FieldResponse::Keep,
            FieldResponse::Keep,
        ];
        prompts.extend(filled_quote_prompts());
        let mut interaction = MockInteraction::new(prompts, vec![ConfirmationResponse::Confirm]);

        let result = run_quote_session(&mut wizard, &mut interaction, &UnsupportedGeolocation)
            .await
            .unwrap();

        assert_eq!(result, FormResult::Submitted);
        assert!(interaction
            .seen_errors
            .contains(&"Başlık alanı zorunludur.".to_string()));
    }

    #[tokio::test]
    async fn failed_submission_can_be_confirmed_again() {
        let submitter = Flaky::new(1);
        let mut wizard = wizard(submitter.clone());
        let mut interaction = MockInteraction::new(
            filled_quote_prompts(),
            vec![ConfirmationResponse::Confirm, ConfirmationResponse::Confirm],
        );

        let result = run_quote_session(&mut wizard, &mut interaction, &UnsupportedGeolocation)
            .await
            .unwrap();

        assert_eq!(result, FormResult::Submitted);
        assert_eq!(submitter.received.lock().unwrap().len(), 2);
        assert_eq!(wizard.submission_state(), SubmissionState::Success);
    }

    #[tokio::test]
    async fn back_on_first_field_cancels_the_wizard() {
        let mut wizard = wizard(Flaky::new(0));
        let mut interaction = MockInteraction::new(vec![FieldResponse::Back], vec![]);

        let result = run_quote_session(&mut wizard, &mut interaction, &UnsupportedGeolocation)
            .await
            .unwrap();

        assert_eq!(result, FormResult::Cancelled);
    }

    #[tokio::test]
    async fn locate_fills_blank_location_text() {
        let mut wizard = wizard(Flaky::new(0));
        let mut prompts = filled_quote_prompts();
        prompts[4] = FieldResponse::Locate;
        prompts.insert(5, FieldResponse::Keep);
        let mut interaction = MockInteraction::new(prompts, vec![ConfirmationResponse::Confirm]);
        let provider = FixedPosition(Coordinates::new(40.99, 29.02));

        let result = run_quote_session(&mut wizard, &mut interaction, &provider)
            .await
            .unwrap();

        assert_eq!(result, FormResult::Submitted);
        let location = wizard.answers().location("location").unwrap();
        assert_eq!(location.text, "40.990000, 29.020000");
    }

    #[tokio::test]
    async fn report_session_requires_reason_then_submits() {
        let submitter = Flaky::<ReportPayload>::new(0);
        let operation: Arc<dyn SubmitOperation<ReportPayload>> = submitter.clone();
        let mut flow = ReportFlow::new(
            ReportKind::Dispute,
            "job-7",
            operation,
            &FlowConfig::default(),
            noop_close_hook(),
        );
        let mut interaction = MockInteraction::new(vec![], vec![ConfirmationResponse::Confirm]);
        interaction.reasons.push_back("damage".into());
        interaction.details.push_back("  Kapı çizildi.  ".into());

        let result = run_report_session(&mut flow, &mut interaction).await.unwrap();

        assert_eq!(result, FormResult::Submitted);
        let received = submitter.received.lock().unwrap();
        assert_eq!(received[0].reason_id, "damage");
        assert_eq!(received[0].details.as_deref(), Some("Kapı çizildi."));
    }
}
