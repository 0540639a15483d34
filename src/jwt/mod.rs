//! JSON Web Token session tokens.
//!
//! An alternative to the compact [`HmacTokenizer`](crate::HmacTokenizer)
//! for services that want standard tokens. Enable with the `jwt` feature
//! flag.
//!
//! # Example
//!
//! ```ignore
//! use latchkey::jwt::{JwtOptions, JwtTokenizer};
//!
//! let tokenizer = Arc::new(JwtTokenizer::new(
//!     JwtOptions::new().with_issuer("my-app"),
//! ));
//!
//! let manager = SessionManager::builder(Config::default())
//!     .tokenizer(tokenizer)
//!     .start()?;
//! ```

mod claims;
mod config;
mod tokenizer;

pub use claims::{AUD_CLAIM, DATA_CLAIM, EXP_CLAIM, ISS_CLAIM};
pub use config::JwtOptions;
pub use tokenizer::JwtTokenizer;
