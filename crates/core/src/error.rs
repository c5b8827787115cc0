#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed {format} data: {message}")]
    Format {
        format: &'static str,
        message: String,
    },
}
