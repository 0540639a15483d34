mod error;
mod extract;
mod layer;

pub use error::AppError;
pub use extract::SessionHandle;
pub use layer::{SessionLayer, SessionService};
