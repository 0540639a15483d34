//! The per-request session context.
//!
//! A context starts unloaded. The first `read` or `write` decodes the
//! request's session cookie, or fabricates a fresh session when the cookie
//! is missing, forged, stale or expired. The context mutex is held from
//! that decode through the callback to the final encode.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{CookieCodec, SessionFactory};
use crate::crypto::generate_id;
use crate::values::{ROLE_FIELD, USER_FIELD};
use crate::{Clock, Numeric, SessionError, SessionValues, Tokenizer};

/// Length of the process-local request correlation ID.
pub const TRACE_ID_LENGTH: usize = 8;

#[derive(Debug, Default)]
struct State {
    values: SessionValues,
    loaded: bool,
    is_new: bool,
    set_cookie: Option<String>,
}

pub struct SessionContext {
    tokenizer: Arc<dyn Tokenizer>,
    codec: Arc<CookieCodec>,
    factory: Arc<dyn SessionFactory>,
    clock: Arc<dyn Clock>,
    token: Option<String>,
    address: Option<SocketAddr>,
    trace_id: OnceLock<String>,
    state: Mutex<State>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("cookie", &self.codec.name())
            .field("has_token", &self.token.is_some())
            .field("address", &self.address)
            .field("trace_id", &self.trace_id.get())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub(crate) fn new(
        tokenizer: Arc<dyn Tokenizer>,
        codec: Arc<CookieCodec>,
        factory: Arc<dyn SessionFactory>,
        clock: Arc<dyn Clock>,
        token: Option<String>,
        address: Option<SocketAddr>,
    ) -> Self {
        Self {
            tokenizer,
            codec,
            factory,
            clock,
            token,
            address,
            trace_id: OnceLock::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Runs `view` against the session.
    ///
    /// A session fabricated by this call is committed once `view` succeeds,
    /// so a first visit gets its cookie even on a read-only request.
    ///
    /// # Errors
    ///
    /// Returns `view`'s error, or a `SessionError` from committing the
    /// fabricated session (`CookieTooLarge` among others).
    pub fn read<R, E, F>(&self, view: F) -> Result<R, E>
    where
        F: FnOnce(&Session<'_>) -> Result<R, E>,
        E: From<SessionError>,
    {
        let mut state = self.lock()?;
        let now = self.clock.now();
        let fabricated = self.load(&mut state, now);

        let result = view(&Session {
            context: self,
            state: &mut state,
            now,
        })?;

        if fabricated {
            self.commit(&mut state, now)?;
        }
        Ok(result)
    }

    /// Runs `update` against the session and always commits afterwards.
    ///
    /// # Errors
    ///
    /// Returns `update`'s error or a `SessionError` from encoding the
    /// updated session. Either way the values are rolled back to what they
    /// were before the call and nothing is committed.
    pub fn write<R, E, F>(&self, update: F) -> Result<R, E>
    where
        F: FnOnce(&mut Session<'_>) -> Result<R, E>,
        E: From<SessionError>,
    {
        let mut state = self.lock()?;
        let now = self.clock.now();
        self.load(&mut state, now);
        let (before, was_new) = (state.values.clone(), state.is_new);

        let updated = update(&mut Session {
            context: self,
            state: &mut state,
            now,
        });
        let outcome = match updated {
            Ok(result) => self
                .commit(&mut state, now)
                .map(|()| result)
                .map_err(E::from),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            state.values = before;
            state.is_new = was_new;
        }
        outcome
    }

    /// Removes the staged `Set-Cookie` header value, if any.
    ///
    /// Middleware calls this once the handler has finished.
    pub fn take_set_cookie(&self) -> Option<String> {
        self.state.lock().ok()?.set_cookie.take()
    }

    /// Request correlation ID, generated on first use and never persisted.
    pub fn trace_id(&self) -> &str {
        self.trace_id.get_or_init(|| generate_id(TRACE_ID_LENGTH))
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, SessionError> {
        self.state
            .lock()
            .map_err(|_| SessionError::Internal("session context lock poisoned".to_owned()))
    }

    /// Materializes the session once. Returns true if it was fabricated now.
    fn load(&self, state: &mut State, now: DateTime<Utc>) -> bool {
        if state.loaded {
            return false;
        }
        state.loaded = true;

        if let Some(values) = self.token.as_deref().and_then(|t| self.tokenizer.decode(t)) {
            if !values.is_expired(now) {
                state.values = values;
                return false;
            }
            log::debug!(
                target: "latchkey::session",
                "msg=\"discarding expired session\" session_id=\"{}\" trace_id=\"{}\"",
                values.id(),
                self.trace_id()
            );
        }

        state.values = self.factory.create(now);
        state.is_new = true;
        true
    }

    fn commit(&self, state: &mut State, now: DateTime<Utc>) -> Result<(), SessionError> {
        let token = self.tokenizer.encode(&state.values)?;
        let expires = state.values.expires().unwrap_or(now);
        state.set_cookie = Some(self.codec.encode(&token, expires)?);
        Ok(())
    }
}

/// Access to the session values while the context is held.
///
/// Handed to [`SessionContext::read`] and [`SessionContext::write`]
/// callbacks; mutators need the `&mut` view `write` provides.
pub struct Session<'a> {
    context: &'a SessionContext,
    state: &'a mut State,
    now: DateTime<Utc>,
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("is_new", &self.state.is_new)
            .field("expires", &self.expires())
            .finish_non_exhaustive()
    }
}

impl Session<'_> {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.values.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.values.remove(key)
    }

    pub fn values(&self) -> &SessionValues {
        &self.state.values
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.state.values.string(key)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.state.values.bool(key)
    }

    pub fn number<T: Numeric>(&self, key: &str) -> Option<T> {
        self.state.values.number(key)
    }

    pub fn id(&self) -> &str {
        self.state.values.id()
    }

    pub fn trace_id(&self) -> &str {
        self.context.trace_id()
    }

    /// Role name, empty when unset.
    pub fn role(&self) -> &str {
        self.string(ROLE_FIELD).unwrap_or_default()
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.set(ROLE_FIELD, role.into());
    }

    /// User identifier, empty when unset.
    pub fn user_id(&self) -> &str {
        self.string(USER_FIELD).unwrap_or_default()
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.set(USER_FIELD, user_id.into());
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.state.values.expires()
    }

    pub fn is_expired(&self) -> bool {
        self.state.values.is_expired(self.now)
    }

    /// True when the session was fabricated during this request.
    pub fn is_new(&self) -> bool {
        self.state.is_new
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.context.address
    }

    /// Replaces every value with a freshly fabricated session.
    pub fn reset(&mut self) {
        self.state.values = self.context.factory.create(self.now);
        self.state.is_new = true;
    }
}
