//! Muzhvay: a small embeddable HTTP/1.x server with cookie sessions.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod session;

pub use config::ServerConfig;
pub use http::{HttpError, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::RequestHandler;
pub use session::{Session, SessionStore};
