use thiserror::Error;

/// An error travelling through a dispatch chain. Handlers raise one either by
/// returning it from their invocation or by driving `Next::err`; both paths
/// feed the same propagation machinery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("failed to decode param '{raw}'")]
    MalformedParam { raw: String },
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Message(String),
}

impl HandlerError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        HandlerError::Message(message.into())
    }

    pub fn with_status<S: Into<String>>(status: u16, message: S) -> Self {
        HandlerError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status the transport should render for an unhandled error.
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::MalformedParam { .. } => 400,
            HandlerError::Status { status, .. } => *status,
            HandlerError::Message(_) => 500,
        }
    }
}

/// Setup-time failures. These are defects in application wiring and abort
/// registration instead of surfacing during request handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("invalid param() definition for '{name}': {reason}")]
    InvalidParamDefinition { name: String, reason: String },
}

pub type RegistrationResult<T> = Result<T, RegistrationError>;
