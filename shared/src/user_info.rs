use serde::{Serialize, Deserialize};

/// Caller metadata taken from request headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for UserInfo {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let headers = req.headers();
            let ip = headers.get_one("X-Real-IP")
                .map(str::to_string)
                .or_else(|| headers.get_one("X-Forwarded-For")
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_string()))
                .or_else(|| req.client_ip().map(|ip| ip.to_string()))
                .unwrap_or_else(|| "0.0.0.0".to_string());

            Outcome::Success(UserInfo {
                ip,
                user_agent: headers.get_one("User-Agent").map(str::to_string),
            })
        }
    }
}
