use actix_web::{dev::Payload, error, http::StatusCode, FromRequest, HttpRequest, HttpResponse};
use std::fmt;
use std::future::{ready, Ready};

use crate::models::ErrorResponse;

/// Header carrying the user id, set by the upstream auth gateway
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The caller's identity, as vouched for by the auth gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

/// Missing or malformed identity header
#[derive(Debug)]
pub struct Unauthenticated;

impl fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("login required")
    }
}

impl error::ResponseError for Unauthenticated {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse {
            error: "unauthenticated".to_string(),
            message: self.to_string(),
            status_code: 401,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Unauthenticated;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok());

        ready(match user_id {
            Some(user_id) => Ok(AuthenticatedUser { user_id }),
            None => {
                tracing::debug!("Rejected request to {} without a user id", req.path());
                Err(Unauthenticated)
            }
        })
    }
}
