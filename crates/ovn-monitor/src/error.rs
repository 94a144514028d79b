use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{name} takes {expected} label values, got {actual}")]
    LabelArity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("encode metric families: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
