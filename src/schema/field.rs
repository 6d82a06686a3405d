use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;

/// One selectable card of a [`FieldKind::SingleChoiceCard`] field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ChoiceOption {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Supported input kinds together with their kind-specific constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    ShortText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    LongText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    QuantityWithUnit {
        units: Vec<String>,
    },
    SingleChoiceCard {
        options: Vec<ChoiceOption>,
    },
    Location,
    BooleanSwitch,
}

impl FieldKind {
    pub fn short_text() -> Self {
        FieldKind::ShortText { placeholder: None }
    }

    pub fn long_text() -> Self {
        FieldKind::LongText { placeholder: None }
    }

    pub fn quantity<S: Into<String>>(units: impl IntoIterator<Item = S>) -> Self {
        FieldKind::QuantityWithUnit {
            units: units.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choice(options: Vec<ChoiceOption>) -> Self {
        FieldKind::SingleChoiceCard { options }
    }

    /// Name of the value shape this kind stores, used in error messages.
    pub fn value_shape(&self) -> &'static str {
        match self {
            FieldKind::ShortText { .. } | FieldKind::LongText { .. } => "text",
            FieldKind::QuantityWithUnit { .. } => "quantity",
            FieldKind::SingleChoiceCard { .. } => "choice",
            FieldKind::Location => "location",
            FieldKind::BooleanSwitch => "boolean",
        }
    }

    /// Whether `value` has the shape this kind stores.
    pub fn matches_shape(&self, value: &AnswerValue) -> bool {
        matches!(
            (self, value),
            (
                FieldKind::ShortText { .. } | FieldKind::LongText { .. },
                AnswerValue::Text(_)
            ) | (FieldKind::QuantityWithUnit { .. }, AnswerValue::Quantity(_))
                | (FieldKind::SingleChoiceCard { .. }, AnswerValue::Choice(_))
                | (FieldKind::Location, AnswerValue::Location(_))
                | (FieldKind::BooleanSwitch, AnswerValue::Switch(_))
        )
    }

    /// Whether `value` has the right shape and satisfies the enumerated
    /// units or options.
    pub fn accepts(&self, value: &AnswerValue) -> bool {
        match (self, value) {
            (FieldKind::ShortText { .. } | FieldKind::LongText { .. }, AnswerValue::Text(_)) => {
                true
            }
            (FieldKind::QuantityWithUnit { units }, AnswerValue::Quantity(quantity)) => {
                units.iter().any(|unit| unit == &quantity.unit)
            }
            (FieldKind::SingleChoiceCard { options }, AnswerValue::Choice(id)) => {
                options.iter().any(|option| &option.id == id)
            }
            (FieldKind::Location, AnswerValue::Location(_)) => true,
            (FieldKind::BooleanSwitch, AnswerValue::Switch(_)) => true,
            _ => false,
        }
    }

    /// First declared unit; the default selection of a quantity field.
    pub fn default_unit(&self) -> Option<&str> {
        match self {
            FieldKind::QuantityWithUnit { units } => units.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match self {
            FieldKind::ShortText { placeholder } | FieldKind::LongText { placeholder } => {
                placeholder.as_deref()
            }
            _ => None,
        }
    }
}

/// Declarative description of a single wizard input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default = "required_by_default")]
    pub required: bool,
    #[serde(default)]
    pub restricted_to_privileged_user: bool,
}

fn required_by_default() -> bool {
    true
}

impl FieldSchema {
    /// Creates a required field visible to every user.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: true,
            restricted_to_privileged_user: false,
        }
    }

    pub fn with_optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_privileged_only(mut self) -> Self {
        self.restricted_to_privileged_user = true;
        self
    }

    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::ShortText { placeholder } | FieldKind::LongText { placeholder } => {
                *placeholder = Some(text.into());
            }
            _ => {}
        }
        self
    }

    /// Restricted fields do not exist for users without elevated privilege.
    pub fn is_visible_to(&self, privileged: bool) -> bool {
        privileged || !self.restricted_to_privileged_user
    }
}
