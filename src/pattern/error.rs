use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("parameter in path '{path}' is missing a name")]
    ParameterMissingName { path: String },
    #[error(
        "parameter name '{name}' in path '{path}' must start with an alphabetic character or underscore (found '{found}')"
    )]
    ParameterInvalidStart {
        path: String,
        name: String,
        found: char,
    },
    #[error("parameter name '{name}' in path '{path}' is followed by invalid character '{invalid}'")]
    ParameterInvalidCharacter {
        path: String,
        name: String,
        invalid: char,
    },
    #[error("parameter name '{name}' appears more than once in path '{path}'")]
    DuplicateParamName { path: String, name: String },
    #[error("path '{path}' mixes parameter and literal syntax at byte {index}")]
    MixedParameterLiteral { path: String, index: usize },
    #[error("group starting at byte {start} in path '{path}' is empty")]
    EmptyGroup { path: String, start: usize },
    #[error("group starting at byte {start} in path '{path}' is never closed")]
    UnterminatedGroup { path: String, start: usize },
}

pub type PatternResult<T> = Result<T, PatternError>;
