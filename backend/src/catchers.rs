use rocket::{Request, catch, serde::json::Json};
use shared::{ErrorCode, ErrorResponse};

fn message(code: ErrorCode, error: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse { code, error: error.into() })
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::ValidationFailed, "Invalid request parameters.")
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::Unauthorized, "Admin credentials required.")
}

#[catch(403)]
pub fn forbidden(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::Unauthorized, "Access forbidden.")
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::NotFound, "The requested resource was not found.")
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> Json<ErrorResponse> {
    let error = match req.uri().path().as_str() {
        "/api/ballot" => "Ballot must contain a session token and a list of candidate ids.",
        "/api/identity" => "Name and email are required.",
        _ => "Malformed request body.",
    };
    message(ErrorCode::ValidationFailed, error)
}

#[catch(429)]
pub fn too_many_requests(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::RateLimited, "Rate limit exceeded. Please wait before trying again.")
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorResponse> {
    message(ErrorCode::PersistenceFailed, "An internal server error occurred.")
}
