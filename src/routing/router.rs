//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store handlers keyed by path prefix
//! - Select the handler with the longest matching prefix
//! - Provide the built-in `/` handler
//!
//! # Design Decisions
//! - Registering a prefix twice replaces the earlier handler
//! - Immutable once the server starts (shared via Arc, no locks)
//! - O(n) prefix scan; route tables are small

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use crate::http::{HttpError, Request, Response};
use crate::routing::matcher::PathPrefixMatcher;
use crate::session::Session;

/// Body text served by the built-in root handler.
pub const ROOT_BODY: &str = "HTTPServer is working";

/// A request processor registered for a path prefix.
///
/// `body` is the connection's input positioned right after the request head.
pub trait RequestHandler: Send + Sync {
    fn handle(
        &self,
        request: &Request,
        session: &Arc<Session>,
        body: &mut dyn BufRead,
    ) -> Result<Response, HttpError>;
}

impl<F> RequestHandler for F
where
    F: Fn(&Request, &Arc<Session>, &mut dyn BufRead) -> Result<Response, HttpError> + Send + Sync,
{
    fn handle(
        &self,
        request: &Request,
        session: &Arc<Session>,
        body: &mut dyn BufRead,
    ) -> Result<Response, HttpError> {
        self(request, session, body)
    }
}

/// Answers exactly `/`; anything else that falls through to it is a 404.
#[derive(Debug, Default)]
pub struct RootHandler;

impl RequestHandler for RootHandler {
    fn handle(
        &self,
        request: &Request,
        session: &Arc<Session>,
        _body: &mut dyn BufRead,
    ) -> Result<Response, HttpError> {
        if request.path() != "/" {
            return Err(not_found(request.path()));
        }
        Ok(Response::html(ROOT_BODY).with_session(Arc::clone(session)))
    }
}

struct Route {
    matcher: PathPrefixMatcher,
    handler: Arc<dyn RequestHandler>,
}

/// Prefix router. Starts with [`RootHandler`] registered at `/`.
pub struct Router {
    routes: HashMap<String, Route>,
}

impl Router {
    pub fn new() -> Self {
        let mut router = Self {
            routes: HashMap::new(),
        };
        router.insert("/", Arc::new(RootHandler));
        router
    }

    /// Register a trait-object handler for `prefix`.
    pub fn insert(&mut self, prefix: impl Into<String>, handler: Arc<dyn RequestHandler>) {
        let prefix = prefix.into();
        let matcher = PathPrefixMatcher::new(prefix.clone());
        if self.routes.insert(prefix.clone(), Route { matcher, handler }).is_some() {
            tracing::debug!(prefix = %prefix, "Replaced request processor");
        }
    }

    /// Register a closure handler for `prefix`.
    pub fn register<F>(&mut self, prefix: impl Into<String>, handler: F)
    where
        F: Fn(&Request, &Arc<Session>, &mut dyn BufRead) -> Result<Response, HttpError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(prefix, Arc::new(handler));
    }

    /// Registered prefix most specific for `path`, with its handler.
    pub fn resolve(&self, path: &str) -> Result<(&str, Arc<dyn RequestHandler>), HttpError> {
        self.routes
            .values()
            .filter(|route| route.matcher.matches(path))
            .max_by_key(|route| route.matcher.specificity())
            .map(|route| (route.matcher.prefix(), Arc::clone(&route.handler)))
            .ok_or_else(|| not_found(path))
    }

    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        prefixes.sort_unstable();
        prefixes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &str) -> HttpError {
    HttpError::not_found(format!("Resource '{}' not found", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Version};
    use std::io::Cursor;

    fn request(path: &str) -> Request {
        Request::new(Method::Get, path, Version::Http11, HashMap::new())
    }

    fn tagged(tag: &'static str) -> impl Fn(&Request, &Arc<Session>, &mut dyn BufRead) -> Result<Response, HttpError> {
        move |_req: &Request, _session: &Arc<Session>, _body: &mut dyn BufRead| Ok(Response::text(200, tag))
    }

    fn dispatch(router: &Router, path: &str) -> Result<Response, HttpError> {
        let (_, handler) = router.resolve(path)?;
        let session = Arc::new(Session::generate());
        handler.handle(&request(path), &session, &mut Cursor::new(Vec::new()))
    }

    #[test]
    fn longest_prefix_wins() {
        let mut router = Router::new();
        router.register("/a", tagged("a"));
        router.register("/a/b", tagged("ab"));

        assert_eq!(router.resolve("/a/b/c").unwrap().0, "/a/b");
        assert_eq!(router.resolve("/a/x").unwrap().0, "/a");
        assert_eq!(router.resolve("/z").unwrap().0, "/");
        assert_eq!(dispatch(&router, "/a/b/c").unwrap().content_length(), 2);
    }

    #[test]
    fn root_answers_only_exact_path() {
        let router = Router::new();
        let response = dispatch(&router, "/").unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.content_length(), ROOT_BODY.len() as u64);
        assert!(response.session().is_some());

        let err = dispatch(&router, "/z").unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "Resource '/z' not found");
    }

    #[test]
    fn no_matching_prefix_is_404() {
        let router = Router::new();
        assert!(matches!(router.resolve("relative"), Err(e) if e.status() == 404));
    }

    #[test]
    fn re_registration_replaces_handler() {
        let mut router = Router::new();
        router.register("/x", tagged("first"));
        router.register("/x", tagged("second!"));
        assert_eq!(router.len(), 2);
        assert_eq!(dispatch(&router, "/x").unwrap().content_length(), 7);
    }

    #[test]
    fn root_can_be_overridden() {
        let mut router = Router::new();
        router.register("/", tagged("custom"));
        assert_eq!(dispatch(&router, "/anything").unwrap().status(), 200);
        assert_eq!(router.prefixes(), vec!["/"]);
    }
}
