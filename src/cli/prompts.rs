//! Terminal implementation of [`FlowInteraction`] built on dialoguer.
//!
//! Text prompts understand a few shortcuts: an empty line keeps the current
//! answer, `<` goes back, `!` cancels and `?` asks for the device position on
//! location fields.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::answers::AnswerValue;
use crate::cli::output;
use crate::cli::session::{ConfirmationResponse, FieldPrompt, FieldResponse, FlowInteraction};
use crate::report::ReportReason;
use crate::schema::{ChoiceOption, FieldKind};

const BACK: &str = "<";
const CANCEL: &str = "!";
const LOCATE: &str = "?";

pub struct TerminalInteraction {
    theme: ColorfulTheme,
}

impl TerminalInteraction {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn print_header(&self, prompt: &FieldPrompt<'_>) {
        output::section(format!(
            "{} ({}/{}, %{:.0})",
            prompt.step_title,
            prompt.step_number,
            prompt.step_count,
            prompt.progress * 100.0
        ));
        if let Some(subtitle) = prompt.step_subtitle {
            output::detail(subtitle);
        }
        if let Some(error) = prompt.error {
            output::warning(error);
        }
    }

    fn read_line(&self, label: &str, current: Option<String>) -> Option<String> {
        let label = match current {
            Some(current) if !current.is_empty() => format!("{label} [{current}]"),
            _ => label.to_string(),
        };
        Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .ok()
    }

    fn prompt_text(&self, prompt: &FieldPrompt<'_>) -> FieldResponse {
        let current = prompt.current.map(AnswerValue::display);
        let label = match prompt.field.kind.placeholder() {
            Some(hint) => format!("{} ({hint})", prompt.field.label),
            None => prompt.field.label.clone(),
        };
        match self.read_line(&label, current) {
            Some(line) => text_response(&line, prompt.current.is_some(), AnswerValue::text),
            None => FieldResponse::Cancel,
        }
    }

    fn prompt_location(&self, prompt: &FieldPrompt<'_>) -> FieldResponse {
        output::detail(format!("Konumunuzu kullanmak için `{LOCATE}` yazın."));
        let current = prompt.current.map(AnswerValue::display);
        match self.read_line(&prompt.field.label, current) {
            Some(line) if line.trim() == LOCATE => FieldResponse::Locate,
            Some(line) => text_response(&line, prompt.current.is_some(), AnswerValue::location),
            None => FieldResponse::Cancel,
        }
    }

    fn prompt_quantity(&self, prompt: &FieldPrompt<'_>, units: &[String]) -> FieldResponse {
        let current = match prompt.current {
            Some(AnswerValue::Quantity(quantity)) => Some(quantity.clone()),
            _ => None,
        };
        let Some(line) = self.read_line(
            &prompt.field.label,
            current.as_ref().map(|quantity| quantity.value.clone()),
        ) else {
            return FieldResponse::Cancel;
        };
        match line.trim() {
            BACK => return FieldResponse::Back,
            CANCEL => return FieldResponse::Cancel,
            "" if current.is_some() => return FieldResponse::Keep,
            _ => {}
        }

        let default_unit = current
            .as_ref()
            .and_then(|quantity| units.iter().position(|unit| *unit == quantity.unit))
            .unwrap_or(0);
        let unit = if units.len() == 1 {
            Some(0)
        } else {
            Select::with_theme(&self.theme)
                .with_prompt("Birim")
                .items(units)
                .default(default_unit)
                .interact_opt()
                .ok()
                .flatten()
        };
        match unit.and_then(|index| units.get(index)) {
            Some(unit) => FieldResponse::Value(AnswerValue::quantity(line.trim(), unit.clone())),
            None => FieldResponse::Cancel,
        }
    }

    fn prompt_choice(&self, prompt: &FieldPrompt<'_>, options: &[ChoiceOption]) -> FieldResponse {
        let mut items: Vec<String> = options
            .iter()
            .map(|option| {
                if option.description.is_empty() {
                    option.title.clone()
                } else {
                    format!("{} - {}", option.title, option.description)
                }
            })
            .collect();
        items.push("Geri".to_string());

        let current = match prompt.current {
            Some(AnswerValue::Choice(id)) => options.iter().position(|option| &option.id == id),
            _ => None,
        };
        let selection = Select::with_theme(&self.theme)
            .with_prompt(&prompt.field.label)
            .items(&items)
            .default(current.unwrap_or(0))
            .interact_opt();
        match selection {
            Ok(Some(index)) if index < options.len() => {
                FieldResponse::Value(AnswerValue::choice(options[index].id.clone()))
            }
            Ok(Some(_)) => FieldResponse::Back,
            Ok(None) | Err(_) => FieldResponse::Cancel,
        }
    }

    fn prompt_switch(&self, prompt: &FieldPrompt<'_>) -> FieldResponse {
        let current = matches!(prompt.current, Some(AnswerValue::Switch(true)));
        match Confirm::with_theme(&self.theme)
            .with_prompt(&prompt.field.label)
            .default(current)
            .interact_opt()
        {
            Ok(Some(value)) => FieldResponse::Value(AnswerValue::Switch(value)),
            Ok(None) | Err(_) => FieldResponse::Cancel,
        }
    }
}

impl Default for TerminalInteraction {
    fn default() -> Self {
        Self::new()
    }
}

fn text_response(
    line: &str,
    has_current: bool,
    make: impl FnOnce(String) -> AnswerValue,
) -> FieldResponse {
    match line.trim() {
        BACK => FieldResponse::Back,
        CANCEL => FieldResponse::Cancel,
        "" if has_current => FieldResponse::Keep,
        _ => FieldResponse::Value(make(line.to_string())),
    }
}

impl FlowInteraction for TerminalInteraction {
    fn prompt_field(&mut self, prompt: &FieldPrompt<'_>) -> FieldResponse {
        self.print_header(prompt);
        match &prompt.field.kind {
            FieldKind::ShortText { .. } | FieldKind::LongText { .. } => self.prompt_text(prompt),
            FieldKind::QuantityWithUnit { units } => self.prompt_quantity(prompt, units),
            FieldKind::SingleChoiceCard { options } => self.prompt_choice(prompt, options),
            FieldKind::Location => self.prompt_location(prompt),
            FieldKind::BooleanSwitch => self.prompt_switch(prompt),
        }
    }

    fn confirm(&mut self, title: &str, lines: &[String]) -> ConfirmationResponse {
        output::section("Özet");
        for line in lines {
            output::detail(line);
        }
        let items = ["Gönder", "Geri", "İptal"];
        match Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(&items)
            .default(0)
            .interact_opt()
        {
            Ok(Some(0)) => ConfirmationResponse::Confirm,
            Ok(Some(1)) => ConfirmationResponse::Back,
            _ => ConfirmationResponse::Cancel,
        }
    }

    fn choose_reason(&mut self, reasons: &[ReportReason], error: Option<&str>) -> Option<String> {
        if let Some(error) = error {
            output::warning(error);
        }
        let labels: Vec<&str> = reasons.iter().map(|reason| reason.label.as_str()).collect();
        Select::with_theme(&self.theme)
            .with_prompt("Neden")
            .items(&labels)
            .interact_opt()
            .ok()
            .flatten()
            .and_then(|index| reasons.get(index))
            .map(|reason| reason.id.clone())
    }

    fn prompt_details(&mut self, current: &str) -> Option<String> {
        let current = (!current.is_empty()).then(|| current.to_string());
        self.read_line("Açıklama (isteğe bağlı)", current)
    }
}
