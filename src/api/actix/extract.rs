use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use futures::future::{Ready, ready};

use crate::api::{ErrorResponse, log_failure, status_code};
use crate::session::SessionScope;
use crate::{SessionContext, SessionError};

/// The request's session context, as a handler argument.
///
/// Derefs to [`SessionContext`]. Fails with a 500 when
/// [`SessionMiddleware`](super::SessionMiddleware) is not installed.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<SessionContext>);

impl SessionHandle {
    pub fn into_inner(self) -> Arc<SessionContext> {
        self.0
    }
}

impl Deref for SessionHandle {
    type Target = SessionContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl SessionScope for SessionHandle {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        Some(Arc::clone(&self.0))
    }
}

impl FromRequest for SessionHandle {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.session_context()
                .map(SessionHandle)
                .ok_or(AppError(SessionError::NoSessionInContext)),
        )
    }
}

/// converts `SessionError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub SessionError);

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(status_code(&self.0)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        log_failure(&self.0);
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self.0.clone()))
    }
}
