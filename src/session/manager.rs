use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use http::HeaderMap;

use super::{CookieCodec, RandomSessionFactory, SessionContext, SessionFactory};
use crate::config::{Config, TokenizerKind};
use crate::rotation::rotation_callback;
use crate::{
    Clock, HmacTokenizer, Rotation, RotationHandle, SessionError, Snapshot, SystemClock, Tokenizer,
};

/// Owns the tokenizer, the cookie codec and the key rotation for one
/// service, and hands out a [`SessionContext`] per request.
///
/// Cheap to clone. The rotation loop stops when the last clone is dropped
/// or on [`SessionManager::shutdown`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    tokenizer: Arc<dyn Tokenizer>,
    codec: Arc<CookieCodec>,
    factory: Arc<dyn SessionFactory>,
    clock: Arc<dyn Clock>,
    rotation: Arc<Rotation>,
    handle: Option<RotationHandle>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("tokenizer", &self.inner.tokenizer)
            .field("rotation", &self.inner.rotation)
            .field("scheduled", &self.inner.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn builder(config: Config) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            clock: None,
            factory: None,
            tokenizer: None,
        }
    }

    /// Builds a manager with default collaborators and starts rotation.
    ///
    /// # Errors
    ///
    /// See [`SessionManagerBuilder::start`].
    pub fn new(config: Config) -> Result<Self, SessionError> {
        Self::builder(config).start()
    }

    /// Creates the context for one request.
    pub fn context(&self, token: Option<String>, address: Option<SocketAddr>) -> SessionContext {
        SessionContext::new(
            Arc::clone(&self.inner.tokenizer),
            Arc::clone(&self.inner.codec),
            Arc::clone(&self.inner.factory),
            Arc::clone(&self.inner.clock),
            token,
            address,
        )
    }

    /// Creates the context for a request from its headers.
    pub fn context_for(&self, headers: &HeaderMap, address: Option<SocketAddr>) -> SessionContext {
        self.context(self.inner.codec.read_cookie(headers), address)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn codec(&self) -> &CookieCodec {
        &self.inner.codec
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.inner.tokenizer
    }

    pub fn rotation(&self) -> &Arc<Rotation> {
        &self.inner.rotation
    }

    /// Copy of the live secret window, for export.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Internal` on a poisoned lock.
    pub fn snapshot(&self) -> Result<Snapshot, SessionError> {
        self.inner.rotation.snapshot()
    }

    /// Stops scheduled rotations. Keys in effect stay valid.
    pub fn shutdown(&self) {
        if let Some(ref handle) = self.inner.handle {
            handle.stop();
        }
    }
}

pub struct SessionManagerBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    factory: Option<Arc<dyn SessionFactory>>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl fmt::Debug for SessionManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManagerBuilder")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("factory", &self.factory)
            .field("tokenizer", &self.tokenizer)
            .finish()
    }
}

impl SessionManagerBuilder {
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Uses `tokenizer` instead of the one `Config::tokenizer` selects.
    #[must_use]
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Validates the configuration, performs the first key rotation and
    /// spawns the rotation loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - `SessionError::Configuration` for invalid settings or when called
    ///   outside a tokio runtime
    /// - any error from the first rotation
    pub fn start(self) -> Result<SessionManager, SessionError> {
        self.assemble(true)
    }

    /// Like [`start`](Self::start) but without the rotation loop; rotate
    /// through [`SessionManager::rotation`] instead.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start), minus the runtime requirement.
    pub fn build(self) -> Result<SessionManager, SessionError> {
        self.assemble(false)
    }

    fn assemble(self, scheduled: bool) -> Result<SessionManager, SessionError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let tokenizer = match self.tokenizer {
            Some(tokenizer) => tokenizer,
            None => default_tokenizer(&self.config.tokenizer),
        };
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(RandomSessionFactory::new(self.config.session.expiry)));

        let rotation_config = self.config.rotation_config();
        let callback = rotation_callback(Arc::clone(&tokenizer));
        let (rotation, handle) = if scheduled {
            let (rotation, handle) = Rotation::start(rotation_config, Arc::clone(&clock), callback)?;
            (rotation, Some(handle))
        } else {
            let rotation = Rotation::new(rotation_config, Arc::clone(&clock), callback)?;
            (Arc::new(rotation), None)
        };

        log::info!(
            target: "latchkey::session",
            "msg=\"session manager ready\" cookie_name=\"{}\" scheduled=\"{}\"",
            self.config.session.cookie_name,
            scheduled
        );

        Ok(SessionManager {
            inner: Arc::new(Inner {
                codec: Arc::new(CookieCodec::new(&self.config.session)),
                config: self.config,
                tokenizer,
                factory,
                clock,
                rotation,
                handle,
            }),
        })
    }
}

fn default_tokenizer(kind: &TokenizerKind) -> Arc<dyn Tokenizer> {
    match kind {
        TokenizerKind::Hmac => Arc::new(HmacTokenizer::new()),
        #[cfg(feature = "jwt")]
        TokenizerKind::Jwt(options) => Arc::new(crate::jwt::JwtTokenizer::new(options.clone())),
    }
}
