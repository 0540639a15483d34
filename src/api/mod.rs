//! Framework adaptors.
//!
//! Both adaptors do the same thing: attach a [`SessionContext`] built from
//! the request's cookie to the request, run the handler, then emit the
//! `Set-Cookie` header the context staged.
//!
//! [`SessionContext`]: crate::SessionContext

mod types;

pub use types::*;

#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "axum")]
pub mod axum;
