#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown alarm class code: {0}")]
    UnknownAlarmClass(u8),
}
