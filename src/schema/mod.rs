//! Declarative description of the quote wizard: fields, steps and the
//! ordered schema that owns them.

pub mod field;
pub mod presets;
pub mod step;

pub use field::{ChoiceOption, FieldKind, FieldSchema};
pub use step::{StepSchema, WizardSchema};
