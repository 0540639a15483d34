mod extract;
mod middleware;

pub use extract::{AppError, SessionHandle};
pub use middleware::{SessionMiddleware, SessionMiddlewareService};
