#![allow(
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown
)]

//! Axum Session Server Example
//!
//! Counts visits and remembers a signed-in user entirely in a signed cookie.
//! Signing keys rotate every hour in the background; cookies issued before a
//! rotation keep working for one more generation.
//!
//! Run with: `cargo run --example axum_session_server --features "axum jwt"`
//!
//! Set `LATCHKEY_TOKENS=jwt` to issue JWT cookies instead of the compact
//! HMAC format.
//!
//! Test endpoints:
//!   curl -c jar -b jar http://localhost:8080/
//!   curl -c jar -b jar -X POST http://localhost:8080/login/alice
//!   curl -c jar -b jar http://localhost:8080/me
//!   curl -c jar -b jar -X POST http://localhost:8080/logout

use std::net::SocketAddr;

use axum::Router;
use axum::extract::Path;
use axum::routing::{get, post};
use chrono::Duration;
use latchkey::api::axum::{AppError, SessionHandle, SessionLayer};
use latchkey::{Config, JwtOptions, RotationConfig, SessionError, SessionManager, TokenizerKind};
use tokio::net::TcpListener;

async fn index(session: SessionHandle) -> Result<String, AppError> {
    let visits = session.write(|s| {
        let visits = s.number::<u64>("visits").unwrap_or(0) + 1;
        s.set("visits", visits);
        Ok::<_, SessionError>(visits)
    })?;
    Ok(format!("visit #{visits} (trace {})\n", session.trace_id()))
}

async fn login(session: SessionHandle, Path(user): Path<String>) -> Result<String, AppError> {
    session.write(|s| {
        s.set_user_id(user.as_str());
        s.set_role("member");
        Ok::<_, SessionError>(())
    })?;
    Ok(format!("signed in as {user}\n"))
}

async fn me(session: SessionHandle) -> Result<String, AppError> {
    let fields = latchkey::session::accessors::log_fields(&session)?;
    Ok(format!("{fields}\n"))
}

async fn logout(session: SessionHandle) -> Result<&'static str, AppError> {
    session.write(|s| {
        s.reset();
        Ok::<_, SessionError>(())
    })?;
    Ok("signed out\n")
}

#[tokio::main]
async fn main() {
    let tokenizer = match std::env::var("LATCHKEY_TOKENS").as_deref() {
        Ok("jwt") => TokenizerKind::Jwt(JwtOptions::new().with_issuer("latchkey-demo")),
        _ => TokenizerKind::Hmac,
    };

    let mut config = Config::development();
    config.rotation = Some(
        RotationConfig::default()
            .with_expiry(Duration::hours(1))
            .with_window(Duration::minutes(10)),
    );
    config.tokenizer = tokenizer;

    let manager = SessionManager::new(config).expect("valid session configuration");

    let app = Router::new()
        .route("/", get(index))
        .route("/login/{user}", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .layer(SessionLayer::new(manager.clone()));

    let listener = TcpListener::bind("0.0.0.0:8080").await.unwrap();
    println!("Session server running on http://localhost:8080");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();

    manager.shutdown();
}
