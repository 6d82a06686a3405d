//! Multi-step quote wizard: navigation, answers, draft prefill and the final
//! submission.

pub mod controller;
pub mod prefill;

pub use controller::{QuotePayload, StepTransition, WizardBuilder, WizardController};
pub use prefill::{category_hint, project_initial_data, project_value, InitialData};
