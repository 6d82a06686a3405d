//! Answer values collected by the wizard, keyed by field id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Amount plus the unit it is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityValue {
    pub value: String,
    pub unit: String,
}

impl QuantityValue {
    pub fn new(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: unit.into(),
        }
    }
}

/// Free-text address, optionally pinned to coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationValue {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl LocationValue {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Value recorded for one field. The variant must match the field's kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Short or long text.
    Text(String),
    Quantity(QuantityValue),
    /// Selected option id of a choice card field.
    Choice(String),
    Location(LocationValue),
    Switch(bool),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    pub fn choice(option_id: impl Into<String>) -> Self {
        AnswerValue::Choice(option_id.into())
    }

    pub fn quantity(value: impl Into<String>, unit: impl Into<String>) -> Self {
        AnswerValue::Quantity(QuantityValue::new(value, unit))
    }

    pub fn location(text: impl Into<String>) -> Self {
        AnswerValue::Location(LocationValue::from_text(text))
    }

    /// Human readable rendering used by summaries.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.clone(),
            AnswerValue::Quantity(quantity) => format!("{} {}", quantity.value, quantity.unit),
            AnswerValue::Location(location) => match (location.latitude, location.longitude) {
                (Some(lat), Some(lon)) => format!("{} ({lat:.6}, {lon:.6})", location.text),
                _ => location.text.clone(),
            },
            AnswerValue::Switch(true) => "Evet".into(),
            AnswerValue::Switch(false) => "Hayır".into(),
        }
    }
}

/// Flat mapping from field id to the field's current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Answers {
    values: BTreeMap<String, AnswerValue>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &str) -> Option<&AnswerValue> {
        self.values.get(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.values.contains_key(field_id)
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: AnswerValue) {
        self.values.insert(field_id.into(), value);
    }

    pub fn remove(&mut self, field_id: &str) -> Option<AnswerValue> {
        self.values.remove(field_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn text(&self, field_id: &str) -> Option<&str> {
        match self.get(field_id)? {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn quantity(&self, field_id: &str) -> Option<&QuantityValue> {
        match self.get(field_id)? {
            AnswerValue::Quantity(quantity) => Some(quantity),
            _ => None,
        }
    }

    pub fn choice(&self, field_id: &str) -> Option<&str> {
        match self.get(field_id)? {
            AnswerValue::Choice(option) => Some(option),
            _ => None,
        }
    }

    pub fn location(&self, field_id: &str) -> Option<&LocationValue> {
        match self.get(field_id)? {
            AnswerValue::Location(location) => Some(location),
            _ => None,
        }
    }

    pub(crate) fn location_mut(&mut self, field_id: &str) -> Option<&mut LocationValue> {
        match self.values.get_mut(field_id)? {
            AnswerValue::Location(location) => Some(location),
            _ => None,
        }
    }

    pub fn switch(&self, field_id: &str) -> Option<bool> {
        match self.get(field_id)? {
            AnswerValue::Switch(flag) => Some(*flag),
            _ => None,
        }
    }
}
