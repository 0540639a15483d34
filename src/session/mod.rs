//! Cookie-carried sessions.
//!
//! [`SessionManager`] builds one [`SessionContext`] per request. Handlers
//! reach it through the [`accessors`] or the framework extractors in
//! [`crate::api`].

pub mod accessors;
mod config;
mod context;
mod cookie;
mod factory;
mod logging;
mod manager;

pub use accessors::SessionScope;
pub use config::{MAX_SESSION_EXPIRY_DAYS, SessionConfig};
pub use context::{Session, SessionContext, TRACE_ID_LENGTH};
pub use cookie::{CookieCodec, MAX_COOKIE_SIZE};
pub use factory::{RandomSessionFactory, SessionFactory};
pub use logging::{GUEST_ROLE, LogFields};
pub use manager::{SessionManager, SessionManagerBuilder};
