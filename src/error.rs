use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reporterstream::ValidationError;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Timeout,
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Timeout => {
                error!("Stream request exceeded its deadline");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Error: upstream feed did not respond in time".to_string(),
                )
            }
            AppError::Internal(err) => {
                error!("Internal error: {:#}", err);
                // 外側のコンテキストだけを返し、下層のエラー内容は出さない
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", err))
            }
        };

        (status, message).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
