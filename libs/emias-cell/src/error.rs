use thiserror::Error;

use shared_models::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmiasError {
    /// Transport failure, timeout or a non-success HTTP status.
    #[error("EMIAS is temporarily unavailable: {0}")]
    Unavailable(String),

    /// Well-formed `error` payload; carries the upstream message verbatim.
    #[error("EMIAS rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed EMIAS data: {0}")]
    Malformed(String),
}

impl EmiasError {
    pub fn user_message(&self) -> String {
        match self {
            EmiasError::Unavailable(_) => "EMIAS is temporarily unavailable".to_string(),
            EmiasError::Rejected(message) => message.clone(),
            EmiasError::Malformed(_) => "EMIAS returned data that could not be read".to_string(),
        }
    }
}

impl From<EmiasError> for AppError {
    fn from(err: EmiasError) -> Self {
        match err {
            EmiasError::Rejected(_) => AppError::BadRequest(err.user_message()),
            EmiasError::Unavailable(_) | EmiasError::Malformed(_) => {
                AppError::ExternalService(err.user_message())
            }
        }
    }
}
