//! Projection of an externally supplied draft record into [`Answers`].
//!
//! Drafts arrive as flat JSON objects (for example extracted from a chat
//! conversation). Bare scalars are lifted into the compound answer shapes so
//! the wizard resumes exactly as if the user had typed them.

use serde_json::{Map, Value};
use tracing::debug;

use crate::answers::{AnswerValue, Answers, LocationValue, QuantityValue};
use crate::schema::{FieldKind, WizardSchema};

/// Flat key/value record used to pre-populate a wizard.
pub type InitialData = Map<String, Value>;

const CATEGORY_KEYS: [&str; 3] = ["categoryId", "category", "service"];

/// Category hint carried by a draft, if any.
pub fn category_hint(initial: &InitialData) -> Option<&str> {
    CATEGORY_KEYS
        .iter()
        .find_map(|key| initial.get(*key).and_then(Value::as_str))
}

/// Builds the initial answers for every schema field present in `initial`.
///
/// Keys without a matching field, values that cannot be projected and fields
/// the user may not see are skipped.
pub fn project_initial_data(
    schema: &WizardSchema,
    initial: &InitialData,
    privileged: bool,
) -> Answers {
    let mut answers = Answers::new();
    for field in schema.fields() {
        if !field.is_visible_to(privileged) {
            continue;
        }
        let Some(raw) = initial.get(&field.id) else {
            continue;
        };
        match project_value(&field.kind, raw) {
            Some(value) => answers.insert(field.id.clone(), value),
            None => debug!(field = %field.id, "draft value does not fit field; skipped"),
        }
    }
    answers
}

/// Lifts one raw draft value into the shape `kind` stores.
pub fn project_value(kind: &FieldKind, raw: &Value) -> Option<AnswerValue> {
    match kind {
        FieldKind::ShortText { .. } | FieldKind::LongText { .. } => {
            scalar_text(raw).map(AnswerValue::Text)
        }
        FieldKind::QuantityWithUnit { units } => {
            let default_unit = units.first()?;
            let (value, unit) = match raw {
                Value::Object(map) => {
                    let value = map.get("value").and_then(scalar_text)?;
                    let unit = map
                        .get("unit")
                        .and_then(Value::as_str)
                        .filter(|unit| units.iter().any(|known| known == unit))
                        .unwrap_or(default_unit);
                    (value, unit.to_string())
                }
                other => (scalar_text(other)?, default_unit.clone()),
            };
            Some(AnswerValue::Quantity(QuantityValue::new(value, unit)))
        }
        FieldKind::SingleChoiceCard { options } => {
            let wanted = scalar_text(raw)?;
            let needle = wanted.trim().to_lowercase();
            options
                .iter()
                .find(|option| option.id == wanted)
                .or_else(|| {
                    options
                        .iter()
                        .find(|option| option.title.trim().to_lowercase() == needle)
                })
                .map(|option| AnswerValue::Choice(option.id.clone()))
        }
        FieldKind::Location => match raw {
            Value::String(text) => Some(AnswerValue::location(text.clone())),
            Value::Object(map) => {
                let text = ["text", "address"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .unwrap_or_default();
                let latitude = ["latitude", "lat"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_f64));
                let longitude = ["longitude", "lng", "lon"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_f64));
                Some(AnswerValue::Location(LocationValue {
                    text: text.to_string(),
                    latitude,
                    longitude,
                }))
            }
            _ => None,
        },
        FieldKind::BooleanSwitch => match raw {
            Value::Bool(flag) => Some(AnswerValue::Switch(*flag)),
            Value::String(text) => match text.trim().to_lowercase().as_str() {
                "true" | "evet" => Some(AnswerValue::Switch(true)),
                "false" | "hayır" => Some(AnswerValue::Switch(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn scalar_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChoiceOption, FieldSchema, StepSchema};
    use serde_json::json;

    fn schema() -> WizardSchema {
        WizardSchema::new(vec![StepSchema::new(
            "Detay",
            vec![
                FieldSchema::new("title", "Başlık", FieldKind::short_text()),
                FieldSchema::new("amount", "Miktar", FieldKind::quantity(["Adet", "m²"])),
                FieldSchema::new(
                    "urgency",
                    "Aciliyet",
                    FieldKind::choice(vec![ChoiceOption::new("asap", "Acil", "")]),
                ),
                FieldSchema::new("address", "Adres", FieldKind::Location),
                FieldSchema::new("on_site", "Yerinde", FieldKind::BooleanSwitch),
                FieldSchema::new("internal", "İç Not", FieldKind::long_text())
                    .with_privileged_only(),
            ],
        )])
        .unwrap()
    }

    fn initial(value: Value) -> InitialData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn bare_number_becomes_quantity_with_first_unit() {
        let answers = project_initial_data(&schema(), &initial(json!({"amount": 120})), false);
        assert_eq!(answers.quantity("amount"), Some(&QuantityValue::new("120", "Adet")));
    }

    #[test]
    fn quantity_object_keeps_known_unit_only() {
        let answers = project_initial_data(
            &schema(),
            &initial(json!({"amount": {"value": "40", "unit": "m²"}})),
            false,
        );
        assert_eq!(answers.quantity("amount").unwrap().unit, "m²");

        let answers = project_initial_data(
            &schema(),
            &initial(json!({"amount": {"value": 40, "unit": "ton"}})),
            false,
        );
        assert_eq!(answers.quantity("amount"), Some(&QuantityValue::new("40", "Adet")));
    }

    #[test]
    fn bare_location_string_becomes_text() {
        let answers =
            project_initial_data(&schema(), &initial(json!({"address": "Moda, Kadıköy"})), false);
        assert_eq!(
            answers.location("address"),
            Some(&LocationValue::from_text("Moda, Kadıköy"))
        );
    }

    #[test]
    fn choice_matches_id_or_title_and_drops_unknowns() {
        let answers = project_initial_data(&schema(), &initial(json!({"urgency": "acil"})), false);
        assert_eq!(answers.choice("urgency"), Some("asap"));

        let answers = project_initial_data(&schema(), &initial(json!({"urgency": "later"})), false);
        assert!(!answers.contains("urgency"));
    }

    #[test]
    fn restricted_and_unknown_keys_are_skipped() {
        let data = initial(json!({"internal": "not", "budget": 5, "on_site": "evet"}));
        let answers = project_initial_data(&schema(), &data, false);
        assert!(!answers.contains("internal"));
        assert!(!answers.contains("budget"));
        assert_eq!(answers.switch("on_site"), Some(true));

        let answers = project_initial_data(&schema(), &data, true);
        assert_eq!(answers.text("internal"), Some("not"));
    }

    #[test]
    fn category_hint_reads_known_keys() {
        assert_eq!(category_hint(&initial(json!({"category": "Boya"}))), Some("Boya"));
        assert_eq!(category_hint(&initial(json!({"title": "x"}))), None);
    }
}
