use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::AppError;
use crate::session::SessionScope;
use crate::{SessionContext, SessionError};

/// The request's session context, as a handler argument.
///
/// Derefs to [`SessionContext`], so `read` and `write` are available
/// directly. Rejects with a 500 when [`SessionLayer`](super::SessionLayer)
/// is not installed.
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

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .session_context()
            .map(SessionHandle)
            .ok_or(AppError(SessionError::NoSessionInContext))
    }
}
