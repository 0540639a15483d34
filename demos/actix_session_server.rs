#![allow(
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown
)]

//! Actix-web Session Server Example
//!
//! The same visit counter as the axum demo, wired through the actix
//! middleware and the request-scoped accessors.
//!
//! Run with: `cargo run --example actix_session_server --features actix`
//!
//! Test endpoints:
//!   curl -c jar -b jar http://localhost:8080/
//!   curl -c jar -b jar -X POST http://localhost:8080/role/admin
//!   curl -c jar -b jar http://localhost:8080/me

use actix_web::{App, HttpRequest, HttpServer, web};
use latchkey::api::actix::{AppError, SessionHandle, SessionMiddleware};
use latchkey::session::accessors;
use latchkey::{Config, SessionError, SessionManager};

async fn index(session: SessionHandle) -> Result<String, AppError> {
    let visits = session.write(|s| {
        let visits = s.number::<u64>("visits").unwrap_or(0) + 1;
        s.set("visits", visits);
        Ok::<_, SessionError>(visits)
    })?;
    Ok(format!("visit #{visits}\n"))
}

async fn set_role(req: HttpRequest, role: web::Path<String>) -> Result<String, AppError> {
    accessors::set_role(&req, role.as_str())?;
    Ok(format!("role is now {role}\n"))
}

async fn me(req: HttpRequest) -> Result<String, AppError> {
    Ok(format!("{}\n", accessors::log_fields(&req)?))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let manager = SessionManager::new(Config::development()).expect("valid session configuration");

    println!("Session server running on http://localhost:8080");

    let server_manager = manager.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(server_manager.clone()))
            .route("/", web::get().to(index))
            .route("/role/{role}", web::post().to(set_role))
            .route("/me", web::get().to(me))
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await?;

    manager.shutdown();
    Ok(())
}
