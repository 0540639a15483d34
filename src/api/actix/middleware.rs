use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::HttpMessage;
use futures::future::{LocalBoxFuture, Ready, ok};

use crate::SessionManager;

/// Session middleware for actix-web.
///
/// Attaches a session context to every request and emits the `Set-Cookie`
/// header it staged once the handler returns.
///
/// # Example
///
/// ```rust,ignore
/// let manager = SessionManager::new(Config::default())?;
///
/// App::new()
///     .wrap(SessionMiddleware::new(manager.clone()))
///     .route("/", web::get().to(handler))
/// ```
#[derive(Debug, Clone)]
pub struct SessionMiddleware {
    manager: SessionManager,
}

impl SessionMiddleware {
    #[must_use]
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service,
            manager: self.manager.clone(),
        })
    }
}

/// The actual middleware service.
pub struct SessionMiddlewareService<S> {
    service: S,
    manager: SessionManager,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = self.manager.codec().decode(
            req.headers()
                .get_all(header::COOKIE)
                .filter_map(|value| value.to_str().ok()),
        );
        let context = Arc::new(self.manager.context(token, req.peer_addr()));
        req.extensions_mut().insert(Arc::clone(&context));

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;

            if let Some(set_cookie) = context.take_set_cookie() {
                match header::HeaderValue::from_str(&set_cookie) {
                    Ok(value) => {
                        res.headers_mut().append(header::SET_COOKIE, value);
                    }
                    Err(e) => log::error!(
                        target: "latchkey::api",
                        "msg=\"failed to emit session cookie\" error=\"{e}\" trace_id=\"{}\"",
                        context.trace_id()
                    ),
                }
            }

            Ok(res)
        })
    }
}
