#![doc(test(attr(deny(warnings))))]

//! Quote Flow provides the schema-driven quote request wizard and the shared
//! submission lifecycle used by the quote, issue report and dispute flows.

pub mod answers;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod geolocation;
pub mod messages;
pub mod report;
pub mod schema;
pub mod submission;
pub mod utils;
pub mod validation;
pub mod wizard;

pub use errors::{FlowError, FlowResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Quote Flow tracing initialized.");
    });
}
