use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{FlowError, FlowResult};
use crate::schema::field::{FieldKind, FieldSchema};

/// Ordered group of fields shown together as one wizard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSchema {
    /// Zero-based index, assigned by [`WizardSchema::new`] from declaration order.
    #[serde(default)]
    pub position: usize,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub fields: Vec<FieldSchema>,
}

impl StepSchema {
    pub fn new(title: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            position: 0,
            title: title.into(),
            subtitle: None,
            fields,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    /// Fields that exist for a user with the given privilege.
    pub fn visible_fields(&self, privileged: bool) -> impl Iterator<Item = &FieldSchema> {
        self.fields
            .iter()
            .filter(move |field| field.is_visible_to(privileged))
    }
}

#[derive(Deserialize)]
struct RawWizardSchema {
    steps: Vec<StepSchema>,
}

impl TryFrom<RawWizardSchema> for WizardSchema {
    type Error = FlowError;

    fn try_from(raw: RawWizardSchema) -> Result<Self, Self::Error> {
        WizardSchema::new(raw.steps)
    }
}

/// Full wizard description. Step order is fixed once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWizardSchema")]
pub struct WizardSchema {
    steps: Vec<StepSchema>,
}

impl WizardSchema {
    /// Validates and freezes the step list.
    ///
    /// Field ids must be unique across the whole wizard because answers are
    /// stored in a single flat map.
    pub fn new(mut steps: Vec<StepSchema>) -> FlowResult<Self> {
        if steps.is_empty() {
            return Err(FlowError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for (position, step) in steps.iter_mut().enumerate() {
            step.position = position;
            if step.fields.is_empty() {
                return Err(FlowError::EmptyStep(step.title.clone()));
            }
            for field in &step.fields {
                if !seen.insert(field.id.clone()) {
                    return Err(FlowError::DuplicateFieldId(field.id.clone()));
                }
                match &field.kind {
                    FieldKind::QuantityWithUnit { units } if units.is_empty() => {
                        return Err(FlowError::MissingUnits(field.id.clone()));
                    }
                    FieldKind::SingleChoiceCard { options } if options.is_empty() => {
                        return Err(FlowError::MissingOptions(field.id.clone()));
                    }
                    _ => {}
                }
            }
        }

        Ok(Self { steps })
    }

    pub fn from_json(data: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json_pretty(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn steps(&self) -> &[StepSchema] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepSchema> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldSchema> {
        self.steps.iter().find_map(|step| step.field(field_id))
    }

    /// Index of the step declaring `field_id`.
    pub fn step_of(&self, field_id: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.field(field_id).is_some())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }
}
