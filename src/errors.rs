use thiserror::Error;

/// Error type for host-side misuse of the flow engine and for configuration I/O.
///
/// User-facing failures (missing answers, rejected submissions, geolocation
/// failures) are not represented here; they surface as messages on the flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Wizard schema has no steps")]
    EmptySchema,
    #[error("Step `{0}` has no fields")]
    EmptyStep(String),
    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(String),
    #[error("Quantity field `{0}` declares no units")]
    MissingUnits(String),
    #[error("Choice field `{0}` declares no options")]
    MissingOptions(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Field `{field}` expects a {expected} value")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("`{value}` is not a valid choice for field `{field}`")]
    InvalidOption { field: String, value: String },
    #[error("Service catalog is empty")]
    EmptyCatalog,
    #[error("Unknown report reason: {0}")]
    UnknownReason(String),
    #[error("Field `{0}` is restricted to privileged users")]
    FieldNotVisible(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type FlowResult<T> = Result<T, FlowError>;
