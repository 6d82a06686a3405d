//! Required-field validation for a single wizard step.
//!
//! The engine is a pure function of its inputs and is cheap enough to run on
//! every keystroke.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::answers::{AnswerValue, Answers};
use crate::messages;
use crate::schema::{FieldKind, FieldSchema, StepSchema};

/// Field id to human readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_id: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field_id.into(), message.into());
    }

    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.errors.contains_key(field_id)
    }

    pub fn remove(&mut self, field_id: &str) -> Option<String> {
        self.errors.remove(field_id)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

/// Kind-specific emptiness rule.
///
/// Text-like values are empty when they trim to nothing; switches and choice
/// cards only need to be present. A value of the wrong shape counts as empty.
pub fn is_unfilled(kind: &FieldKind, value: Option<&AnswerValue>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match kind {
        FieldKind::ShortText { .. } | FieldKind::LongText { .. } => match value {
            AnswerValue::Text(text) => text.trim().is_empty(),
            _ => true,
        },
        FieldKind::QuantityWithUnit { .. } => match value {
            AnswerValue::Quantity(quantity) => quantity.value.trim().is_empty(),
            _ => true,
        },
        FieldKind::Location => match value {
            AnswerValue::Location(location) => location.text.trim().is_empty(),
            _ => true,
        },
        FieldKind::SingleChoiceCard { .. } => !matches!(value, AnswerValue::Choice(_)),
        FieldKind::BooleanSwitch => !matches!(value, AnswerValue::Switch(_)),
    }
}

/// Message for `field` when it is required, visible and unfilled.
pub fn validate_field(field: &FieldSchema, answers: &Answers, privileged: bool) -> Option<String> {
    if !field.required || !field.is_visible_to(privileged) {
        return None;
    }
    if is_unfilled(&field.kind, answers.get(&field.id)) {
        Some(messages::required_field(&field.label))
    } else {
        None
    }
}

/// Evaluates every field of `step` against `answers`.
pub fn validate_step(step: &StepSchema, answers: &Answers, privileged: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in &step.fields {
        if let Some(message) = validate_field(field, answers, privileged) {
            errors.insert(field.id.clone(), message);
        }
    }
    errors
}
