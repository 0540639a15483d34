use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use tower::{Layer, Service};

use crate::{CookieCodec, SessionManager};

/// Attaches a session context to every request.
///
/// # Example
///
/// ```rust,ignore
/// let manager = SessionManager::new(Config::default())?;
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(SessionLayer::new(manager));
/// ```
#[derive(Debug, Clone)]
pub struct SessionLayer {
    manager: SessionManager,
}

impl SessionLayer {
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            manager: self.manager.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionService<S> {
    inner: S,
    manager: SessionManager,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SessionService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let address = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let context = Arc::new(self.manager.context_for(req.headers(), address));
        req.extensions_mut().insert(Arc::clone(&context));

        // the ready service goes to the request, the fresh clone stays
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            if let Some(set_cookie) = context.take_set_cookie() {
                if let Err(e) = CookieCodec::write_cookie(response.headers_mut(), &set_cookie) {
                    log::error!(
                        target: "latchkey::api",
                        "msg=\"failed to emit session cookie\" error=\"{e}\" trace_id=\"{}\"",
                        context.trace_id()
                    );
                }
            }

            Ok(response)
        })
    }
}
