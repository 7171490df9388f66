use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid percent encoding in '{input}' at byte {index}")]
    InvalidPercentEncoding { input: String, index: usize },
    #[error("decoded value of '{input}' is not valid UTF-8")]
    InvalidUtf8 { input: String },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
