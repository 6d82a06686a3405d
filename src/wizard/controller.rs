use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::answers::{AnswerValue, Answers, LocationValue};
use crate::catalog::Category;
use crate::config::FlowConfig;
use crate::errors::{FlowError, FlowResult};
use crate::geolocation::{
    locate_with_timeout, Coordinates, GeoErrorKind, GeolocationProvider, LocationLookups,
    LocationStatus, LocationTicket,
};
use crate::schema::{FieldKind, FieldSchema, StepSchema, WizardSchema};
use crate::submission::{
    noop_close_hook, CloseHook, SubmissionController, SubmissionState, SubmitAttempt,
    SubmitOperation,
};
use crate::validation::{validate_step, ValidationErrors};
use crate::wizard::prefill::{project_initial_data, InitialData};

/// Body sent to the remote service when a quote is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePayload {
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub answers: Answers,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Moved(usize),
    /// Validation failed; errors are available through [`WizardController::errors`].
    Invalid,
    /// Already on the last step.
    Unchanged,
    /// Back was pressed on the first step; the host should close the flow.
    CloseRequested,
    /// Controls are disabled while a submission is running or has succeeded.
    Locked,
}

/// Schema-driven multi-step quote wizard.
///
/// Holds the step position, answers and validation errors, and owns the
/// submission controller used by the final step. The step position never
/// leaves `0..step_count`; leaving the first step backwards is reported as
/// [`StepTransition::CloseRequested`].
pub struct WizardController {
    id: Uuid,
    schema: WizardSchema,
    category: Category,
    privileged: bool,
    step_index: usize,
    answers: Answers,
    errors: ValidationErrors,
    locations: LocationLookups,
    geolocation_timeout: Duration,
    submission: SubmissionController<QuotePayload>,
}

/// Configures a [`WizardController`] before construction.
pub struct WizardBuilder {
    schema: WizardSchema,
    category: Category,
    privileged: bool,
    initial: Option<InitialData>,
    config: FlowConfig,
    on_close: CloseHook,
}

impl WizardBuilder {
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Draft record projected into the initial answers.
    pub fn initial_data(mut self, initial: InitialData) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn config(mut self, config: &FlowConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn on_close(mut self, on_close: CloseHook) -> Self {
        self.on_close = on_close;
        self
    }

    pub fn build(self, submitter: Arc<dyn SubmitOperation<QuotePayload>>) -> WizardController {
        let answers = self
            .initial
            .as_ref()
            .map(|initial| project_initial_data(&self.schema, initial, self.privileged))
            .unwrap_or_default();
        let submission = SubmissionController::new(submitter, self.config.quote_close_delay())
            .with_close_hook(self.on_close)
            .with_generic_error(self.config.generic_error_message.clone())
            .with_flow_name("quote");

        let id = Uuid::new_v4();
        debug!(
            wizard = %id,
            category = %self.category.id,
            prefilled = answers.len(),
            "quote wizard opened"
        );

        WizardController {
            id,
            schema: self.schema,
            category: self.category,
            privileged: self.privileged,
            step_index: 0,
            answers,
            errors: ValidationErrors::new(),
            locations: LocationLookups::default(),
            geolocation_timeout: self.config.geolocation_timeout(),
            submission,
        }
    }
}

impl WizardController {
    pub fn builder(schema: WizardSchema, category: Category) -> WizardBuilder {
        WizardBuilder {
            schema,
            category,
            privileged: false,
            initial: None,
            config: FlowConfig::default(),
            on_close: noop_close_hook(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &WizardSchema {
        &self.schema
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn step_count(&self) -> usize {
        self.schema.step_count()
    }

    pub fn current_step(&self) -> &StepSchema {
        &self.schema.steps()[self.step_index]
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 == self.step_count()
    }

    /// Fraction of the flow completed, counting the category choice that
    /// precedes the schema steps.
    pub fn progress(&self) -> f32 {
        (self.step_index + 2) as f32 / (self.step_count() + 1) as f32
    }

    /// Fields of the current step that exist for this user.
    pub fn visible_fields(&self) -> Vec<&FieldSchema> {
        self.current_step()
            .visible_fields(self.privileged)
            .collect()
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn answer(&self, field_id: &str) -> Option<&AnswerValue> {
        self.answers.get(field_id)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Validation error for the field, falling back to its location lookup
    /// failure.
    pub fn field_message(&self, field_id: &str) -> Option<&str> {
        self.errors
            .get(field_id)
            .or_else(|| self.location_error(field_id))
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub fn submission_error(&self) -> Option<String> {
        self.submission.error_message()
    }

    /// Whether anything other than back/close may be used.
    pub fn controls_enabled(&self) -> bool {
        !self.submission.is_busy() && !self.submission.is_disposed()
    }

    /// Records a value for `field_id` and clears that field's error.
    ///
    /// Returns `Ok(false)` when controls are locked and nothing changed.
    pub fn set_answer(&mut self, field_id: &str, value: AnswerValue) -> FlowResult<bool> {
        if !self.controls_enabled() {
            debug!(wizard = %self.id, field = field_id, "edit ignored while controls locked");
            return Ok(false);
        }
        let field = self.visible_field(field_id)?;
        if !field.kind.matches_shape(&value) {
            return Err(FlowError::KindMismatch {
                field: field_id.to_string(),
                expected: field.kind.value_shape(),
            });
        }
        if !field.kind.accepts(&value) {
            return Err(FlowError::InvalidOption {
                field: field_id.to_string(),
                value: value.display(),
            });
        }

        let is_location = matches!(field.kind, FieldKind::Location);
        self.answers.insert(field_id, value);
        self.errors.remove(field_id);
        if is_location {
            self.locations.clear_failure(field_id);
        }
        Ok(true)
    }

    /// Validates the current step and advances when it passes.
    pub fn next(&mut self) -> StepTransition {
        if !self.controls_enabled() {
            return StepTransition::Locked;
        }
        if !self.validate_current() {
            return StepTransition::Invalid;
        }
        if self.is_last_step() {
            return StepTransition::Unchanged;
        }
        self.abandon_step_lookups();
        self.step_index += 1;
        debug!(wizard = %self.id, step = self.step_index, "advanced");
        StepTransition::Moved(self.step_index)
    }

    /// Steps back, or asks the host to close when already on the first step.
    pub fn back(&mut self) -> StepTransition {
        self.errors.clear();
        if self.step_index == 0 {
            debug!(wizard = %self.id, "back on first step; closing");
            return StepTransition::CloseRequested;
        }
        self.abandon_step_lookups();
        self.step_index -= 1;
        debug!(wizard = %self.id, step = self.step_index, "went back");
        StepTransition::Moved(self.step_index)
    }

    /// Final confirmation: validates the last step once more and hands the
    /// assembled payload to the submission controller. A failed submission
    /// keeps the wizard on the last step so it can be confirmed again.
    ///
    /// Must be called inside a tokio runtime; the submit call is spawned onto
    /// it.
    pub fn confirm(&mut self) -> SubmitAttempt {
        if !self.is_last_step() {
            return SubmitAttempt::NotOnLastStep;
        }
        if !self.controls_enabled() {
            return SubmitAttempt::Ignored;
        }
        if !self.validate_current() {
            return SubmitAttempt::Invalid;
        }
        info!(wizard = %self.id, category = %self.category.id, "submitting quote request");
        match self.submission.submit(self.payload()) {
            Some(pending) => SubmitAttempt::Dispatched(pending),
            None => SubmitAttempt::Ignored,
        }
    }

    /// `{categoryId, createdAt, ...answers}` for the current answers.
    pub fn payload(&self) -> QuotePayload {
        QuotePayload {
            category_id: self.category.id.clone(),
            created_at: Utc::now(),
            answers: self.answers.clone(),
        }
    }

    pub fn location_status(&self, field_id: &str) -> LocationStatus {
        self.locations.status(field_id)
    }

    pub fn location_error(&self, field_id: &str) -> Option<&'static str> {
        self.locations.status(field_id).error_message()
    }

    /// Starts a position lookup for a location field.
    ///
    /// Returns `Ok(None)` while controls are locked or a lookup for the field
    /// is already pending.
    pub fn begin_location_lookup(&mut self, field_id: &str) -> FlowResult<Option<LocationTicket>> {
        if !self.controls_enabled() {
            debug!(
                wizard = %self.id,
                field = field_id,
                "location lookup refused while controls locked"
            );
            return Ok(None);
        }
        let field = self.visible_field(field_id)?;
        if !matches!(field.kind, FieldKind::Location) {
            return Err(FlowError::KindMismatch {
                field: field_id.to_string(),
                expected: FieldKind::Location.value_shape(),
            });
        }
        Ok(self.locations.begin(field_id))
    }

    /// Applies a lookup result. Returns `false` when the result was dropped:
    /// the ticket went stale (field abandoned or wizard disposed) or controls
    /// are locked by a submission.
    pub fn resolve_location(
        &mut self,
        ticket: LocationTicket,
        result: Result<Coordinates, GeoErrorKind>,
    ) -> bool {
        if !self.controls_enabled() {
            self.locations.discard(&ticket);
            debug!(
                wizard = %self.id,
                field = ticket.field_id(),
                "location result dropped while controls locked"
            );
            return false;
        }
        if !self.locations.settle(&ticket, result) {
            debug!(wizard = %self.id, field = ticket.field_id(), "stale location result dropped");
            return false;
        }
        let field_id = ticket.field_id();
        if let Ok(coordinates) = result {
            match self.answers.location_mut(field_id) {
                Some(location) => {
                    if location.text.trim().is_empty() {
                        location.text = coordinates.to_text();
                    }
                    location.latitude = Some(coordinates.latitude);
                    location.longitude = Some(coordinates.longitude);
                }
                None => self.answers.insert(
                    field_id,
                    AnswerValue::Location(
                        LocationValue::from_text(coordinates.to_text())
                            .with_coordinates(coordinates.latitude, coordinates.longitude),
                    ),
                ),
            }
            self.errors.remove(field_id);
        }
        true
    }

    /// Drops any pending lookup for the field.
    pub fn abandon_location(&mut self, field_id: &str) {
        self.locations.abandon(field_id);
    }

    /// Requests the device position and applies it to `field_id`, bounded by
    /// the configured geolocation timeout.
    pub async fn locate<G: GeolocationProvider + ?Sized>(
        &mut self,
        field_id: &str,
        provider: &G,
    ) -> FlowResult<LocationStatus> {
        let Some(ticket) = self.begin_location_lookup(field_id)? else {
            return Ok(self.location_status(field_id));
        };
        let result = locate_with_timeout(provider, self.geolocation_timeout).await;
        self.resolve_location(ticket, result);
        Ok(self.location_status(field_id))
    }

    /// Tears the wizard down; late submission and lookup results are dropped.
    pub fn dispose(&mut self) {
        self.locations.abandon_all();
        self.submission.dispose();
    }

    pub fn is_closed(&self) -> bool {
        self.submission.is_closed()
    }

    fn visible_field(&self, field_id: &str) -> FlowResult<&FieldSchema> {
        let field = self
            .schema
            .field(field_id)
            .ok_or_else(|| FlowError::UnknownField(field_id.to_string()))?;
        if !field.is_visible_to(self.privileged) {
            return Err(FlowError::FieldNotVisible(field_id.to_string()));
        }
        Ok(field)
    }

    fn validate_current(&mut self) -> bool {
        self.errors = validate_step(self.current_step(), &self.answers, self.privileged);
        if self.errors.is_empty() {
            true
        } else {
            debug!(
                wizard = %self.id,
                step = self.step_index,
                errors = self.errors.len(),
                "step validation failed"
            );
            false
        }
    }

    fn abandon_step_lookups(&mut self) {
        let location_fields: Vec<String> = self
            .current_step()
            .fields
            .iter()
            .filter(|field| matches!(field.kind, FieldKind::Location))
            .map(|field| field.id.clone())
            .collect();
        for field_id in location_fields {
            self.locations.abandon(&field_id);
        }
    }
}
