use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::{CoreError, ErrorCode, ErrorResponse};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Candidate {0} not found")]
    CandidateNotFound(i64),
    #[error("Session expired or invalid. Please enter your details again.")]
    InvalidSession,
    #[error("Admin credentials required")]
    Unauthorized,
    #[error("{0}")]
    RateLimited(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Core(CoreError::Validation(_)) => Status::BadRequest,
            ApiError::Core(CoreError::AlreadyVoted(_)) => Status::Forbidden,
            ApiError::Core(CoreError::Persistence(_)) => Status::InternalServerError,
            ApiError::CandidateNotFound(_) => Status::NotFound,
            ApiError::InvalidSession | ApiError::Unauthorized => Status::Unauthorized,
            ApiError::RateLimited(_) => Status::TooManyRequests,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Core(e) => e.code(),
            ApiError::CandidateNotFound(_) => ErrorCode::NotFound,
            ApiError::InvalidSession | ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::RateLimited(_) => ErrorCode::RateLimited,
            ApiError::Internal(_) => ErrorCode::PersistenceFailed,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();

        // Storage details stay in the logs.
        let message = if status == Status::InternalServerError {
            error!("{} {} failed: {}", req.method(), req.uri(), self);
            "An internal server error occurred.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse { code: self.code(), error: message });
        rocket::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
