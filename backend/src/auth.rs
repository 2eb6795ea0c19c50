use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use ring::constant_time::verify_slices_are_equal;
use tracing::warn;

use crate::error::ApiError;
use crate::routes::AppState;

/// Request guard for candidate management. Expects
/// `Authorization: Bearer <ADMIN_TOKEN>`.
pub struct AdminToken;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(state) = req.rocket().state::<AppState>() else {
            return Outcome::Error((
                Status::InternalServerError,
                ApiError::Internal("application state missing".into()),
            ));
        };

        let Some(expected) = state.config.admin_token.as_deref() else {
            warn!("Admin request rejected - ADMIN_TOKEN not configured");
            return Outcome::Error((Status::Unauthorized, ApiError::Unauthorized));
        };

        let presented = req
            .headers()
            .get_one("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if verify_slices_are_equal(token.as_bytes(), expected.as_bytes()).is_ok() => {
                Outcome::Success(AdminToken)
            }
            _ => {
                warn!("Admin request rejected - invalid credentials");
                Outcome::Error((Status::Unauthorized, ApiError::Unauthorized))
            }
        }
    }
}
