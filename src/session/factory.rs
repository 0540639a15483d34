use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::SessionValues;
use crate::crypto::{DEFAULT_SESSION_ID_LENGTH, generate_id};

/// Fabricates the values of a brand-new session.
///
/// The result should carry the reserved `id` and `expires` fields; a session
/// without a readable `expires` is treated as expired on its next request.
pub trait SessionFactory: Send + Sync + fmt::Debug {
    fn create(&self, now: DateTime<Utc>) -> SessionValues;
}

/// Random 32-character `id`, `expires` one session expiry from now.
///
/// `expires` is stored in whole seconds, so the instant is rounded up: a
/// sub-second expiry still yields a session that is live when created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSessionFactory {
    expiry: Duration,
}

impl RandomSessionFactory {
    pub fn new(expiry: Duration) -> Self {
        Self { expiry }
    }
}

impl SessionFactory for RandomSessionFactory {
    fn create(&self, now: DateTime<Utc>) -> SessionValues {
        SessionValues::fresh(
            generate_id(DEFAULT_SESSION_ID_LENGTH),
            ceil_to_second(now + self.expiry),
        )
    }
}

fn ceil_to_second(at: DateTime<Utc>) -> DateTime<Utc> {
    if at.timestamp_subsec_nanos() == 0 {
        return at;
    }
    DateTime::from_timestamp(at.timestamp() + 1, 0).unwrap_or(at)
}
