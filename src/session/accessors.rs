//! Request-scoped session helpers.
//!
//! Each function finds the request's [`SessionContext`] through a
//! [`SessionScope`] and performs one guarded read or read-modify-write.
//! Calling them on a request the session middleware never saw is a wiring
//! bug and yields `SessionError::NoSessionInContext`.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{LogFields, Session, SessionContext};
use crate::SessionError;

/// Anything that carries the request's session context.
pub trait SessionScope {
    fn session_context(&self) -> Option<Arc<SessionContext>>;
}

impl SessionScope for http::Extensions {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        self.get::<Arc<SessionContext>>().cloned()
    }
}

impl SessionScope for http::request::Parts {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        self.extensions.session_context()
    }
}

impl<B> SessionScope for http::Request<B> {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        self.extensions().session_context()
    }
}

#[cfg(feature = "actix")]
impl SessionScope for actix_web::HttpRequest {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        use actix_web::HttpMessage;
        self.extensions().get::<Arc<SessionContext>>().cloned()
    }
}

impl SessionScope for Arc<SessionContext> {
    fn session_context(&self) -> Option<Arc<SessionContext>> {
        Some(Arc::clone(self))
    }
}

fn context<S: SessionScope + ?Sized>(scope: &S) -> Result<Arc<SessionContext>, SessionError> {
    scope.session_context().ok_or_else(|| {
        log::error!(
            target: "latchkey::session",
            "msg=\"session accessed outside session middleware\""
        );
        SessionError::NoSessionInContext
    })
}

/// See [`SessionContext::read`].
///
/// # Errors
///
/// `SessionError::NoSessionInContext` if no context is attached, otherwise
/// whatever the context returns.
pub fn read<S, R, E, F>(scope: &S, view: F) -> Result<R, E>
where
    S: SessionScope + ?Sized,
    F: FnOnce(&Session<'_>) -> Result<R, E>,
    E: From<SessionError>,
{
    context(scope)?.read(view)
}

/// See [`SessionContext::write`].
///
/// # Errors
///
/// `SessionError::NoSessionInContext` if no context is attached, otherwise
/// whatever the context returns.
pub fn write<S, R, E, F>(scope: &S, update: F) -> Result<R, E>
where
    S: SessionScope + ?Sized,
    F: FnOnce(&mut Session<'_>) -> Result<R, E>,
    E: From<SessionError>,
{
    context(scope)?.write(update)
}

pub fn value<S: SessionScope + ?Sized>(scope: &S, key: &str) -> Result<Option<Value>, SessionError> {
    read(scope, |s| Ok(s.get(key).cloned()))
}

/// Sets one value and commits the session.
pub fn set_value<S: SessionScope + ?Sized>(
    scope: &S,
    key: &str,
    value: impl Into<Value>,
) -> Result<(), SessionError> {
    write(scope, |s| {
        s.set(key, value);
        Ok(())
    })
}

pub fn id<S: SessionScope + ?Sized>(scope: &S) -> Result<String, SessionError> {
    read(scope, |s| Ok(s.id().to_owned()))
}

/// The request correlation ID. Does not load the session.
pub fn trace_id<S: SessionScope + ?Sized>(scope: &S) -> Result<String, SessionError> {
    Ok(context(scope)?.trace_id().to_owned())
}

pub fn role<S: SessionScope + ?Sized>(scope: &S) -> Result<String, SessionError> {
    read(scope, |s| Ok(s.role().to_owned()))
}

pub fn set_role<S: SessionScope + ?Sized>(
    scope: &S,
    role: impl Into<String>,
) -> Result<(), SessionError> {
    write(scope, |s| {
        s.set_role(role);
        Ok(())
    })
}

pub fn user_id<S: SessionScope + ?Sized>(scope: &S) -> Result<String, SessionError> {
    read(scope, |s| Ok(s.user_id().to_owned()))
}

pub fn set_user_id<S: SessionScope + ?Sized>(
    scope: &S,
    user_id: impl Into<String>,
) -> Result<(), SessionError> {
    write(scope, |s| {
        s.set_user_id(user_id);
        Ok(())
    })
}

pub fn expires<S: SessionScope + ?Sized>(scope: &S) -> Result<Option<DateTime<Utc>>, SessionError> {
    read(scope, |s| Ok(s.expires()))
}

/// Peer address of the request. Does not load the session.
pub fn address<S: SessionScope + ?Sized>(scope: &S) -> Result<Option<SocketAddr>, SessionError> {
    Ok(context(scope)?.address())
}

pub fn log_fields<S: SessionScope + ?Sized>(scope: &S) -> Result<LogFields, SessionError> {
    read(scope, |s| Ok(LogFields::from_session(s)))
}
