#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed record: field `{field}` {reason}")]
    MalformedRecord { field: &'static str, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),
}

impl CoreError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field,
            reason: reason.into(),
        }
    }
}
