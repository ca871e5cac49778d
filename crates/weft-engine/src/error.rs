/// Why a [`Range`](crate::tree::Range) was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeFault {
    #[error("boundary container is not attached to the working tree")]
    Detached,
    #[error("boundary offset {offset} exceeds container length {length}")]
    OffsetOutOfBounds { offset: usize, length: usize },
    #[error("range start lies after its end")]
    Reversed,
}

/// Errors reported by the editing operations.
///
/// Every operation validates before it mutates, so an error always means the
/// tree is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("invalid range: {0}")]
    InvalidRange(#[from] RangeFault),
    #[error("unsupported span: {0}")]
    UnsupportedSpan(String),
}

/// Why an [`Editor`](crate::editing::Editor) could not be built.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid editor config: {0}")]
    Config(#[from] weft_config::ConfigError),
    #[error("invalid markup: {0}")]
    Markup(#[from] crate::markup::MarkupError),
}
