use thiserror::Error;

/// Failures surfaced by the engine.
///
/// Only construction-time problems (bad descriptor tables, bad config JSON)
/// are returned to the caller. `MissingTarget` is produced while a session
/// runs and is logged and skipped by the scheduler.
#[derive(Debug, Error)]
pub enum PopupError {
    /// The content element backing a text popup was never registered.
    #[error("popup target `{0}` is not present in the document")]
    MissingTarget(String),

    /// A descriptor id was looked up but is not in the registry.
    #[error("unknown trigger descriptor `{0}`")]
    UnknownDescriptor(String),

    /// Two descriptors share the same id.
    #[error("duplicate trigger descriptor `{0}`")]
    DuplicateDescriptor(String),

    /// Config or descriptor JSON failed to parse.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
