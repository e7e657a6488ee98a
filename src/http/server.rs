//! Connection server.
//!
//! # Responsibilities
//! - Accept connections and hand each one to its own blocking worker
//! - Run one request/response exchange per connection, then close
//! - Resolve the session, dispatch to the router, attach the session cookie
//! - Turn every failure into an error response
//! - Run the session reaper alongside the accept loop
//!
//! # Design Decisions
//! - Workers come from tokio's blocking pool. It grows on demand up to the
//!   runtime's `max_blocking_threads` (512 by default); connections beyond
//!   that wait in the pool's queue until a worker frees up
//! - `run` validates the configuration first, so a bad reap interval or TTL
//!   is an error rather than a dead reaper
//! - A handler panic is caught and answered with a 500 like any other internal error
//! - The `Set-Cookie` decision lives here because it needs the cookie the
//!   request presented, which the response itself does not carry

use std::any::Any;
use std::io::{self, BufRead, BufReader, BufWriter, Read};
use std::net::{Shutdown as SocketShutdown, SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::http::{Cookie, HttpError, Request, Response, WireOptions};
use crate::net::{ConnectionGuard, ConnectionState, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{RequestHandler, Router};
use crate::session::{Session, SessionReaper, SessionStore};

/// How long shutdown waits for in-flight connections.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Bound on how long a closing connection drains unread input.
const LINGER_TIMEOUT: Duration = Duration::from_millis(100);
const LINGER_MAX_BYTES: u64 = 64 * 1024;

/// Error type for the server run loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Session reaper failed: {0}")]
    Reaper(#[from] tokio::task::JoinError),
}

/// State every worker reads; immutable once the server runs.
struct Shared {
    router: Router,
    sessions: SessionStore,
    wire: WireOptions,
}

/// Embeddable HTTP/1.x server with cookie sessions and prefix routing.
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    sessions: SessionStore,
}

impl HttpServer {
    /// Create a server with only the built-in `/` handler registered.
    pub fn new(config: ServerConfig) -> Self {
        let sessions = SessionStore::from_config(&config.session);
        Self {
            config,
            router: Router::new(),
            sessions,
        }
    }

    /// Register a closure for every path starting with `prefix`.
    pub fn set_request_processor<F>(&mut self, prefix: impl Into<String>, processor: F)
    where
        F: Fn(&Request, &Arc<Session>, &mut dyn BufRead) -> Result<Response, HttpError>
            + Send
            + Sync
            + 'static,
    {
        self.router.register(prefix, processor);
    }

    /// Register a handler object for every path starting with `prefix`.
    pub fn set_handler(&mut self, prefix: impl Into<String>, handler: Arc<dyn RequestHandler>) {
        self.router.insert(prefix, handler);
    }

    /// Install the callback run once for each killed or expired session.
    pub fn set_session_kill_listener<F>(&self, listener: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.sessions.set_kill_listener(listener);
    }

    /// Kill the session with `id`. Returns false if it does not exist.
    pub fn kill_session(&self, id: &str) -> bool {
        self.sessions.kill(id)
    }

    /// Session store handle. Clones stay valid after [`HttpServer::run`]
    /// consumes the server.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind a listener to the configured address.
    pub async fn bind(&self) -> Result<Listener, ListenerError> {
        Listener::bind(&self.config.listener, self.config.timeouts.clone()).await
    }

    /// Serve connections from `listener` until `shutdown` fires.
    ///
    /// On shutdown the accept loop stops, the reaper is joined and in-flight
    /// connections get a bounded grace period. Fails up front on an invalid
    /// configuration, and after the drain if the reaper task died.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = ?self.router.prefixes(),
            "HTTP server starting"
        );

        let reaper = SessionReaper::new(self.sessions.clone(), self.config.session.reap_interval());
        let reaper = tokio::spawn(reaper.run(shutdown.resubscribe()));

        let shared = Arc::new(Shared {
            router: self.router,
            sessions: self.sessions,
            wire: self.config.response.wire_options(),
        });
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let guard = tracker.track();
                        let shared = Arc::clone(&shared);
                        tokio::task::spawn_blocking(move || {
                            handle_connection(stream, peer, guard, &shared);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("HTTP server received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        drop(listener);
        let reaped = reaper.await;

        let remaining = tracker.wait_for_idle(DRAIN_TIMEOUT).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Shutdown with connections still in flight");
        }

        if let Err(e) = reaped {
            tracing::error!(error = %e, "Session reaper task failed");
            return Err(ServerError::Reaper(e));
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Result of one exchange, before serialization.
struct Exchange {
    request: Option<Request>,
    presented_session: Option<String>,
    response: Response,
    failed: bool,
}

fn handle_connection(stream: TcpStream, peer: SocketAddr, mut guard: ConnectionGuard, shared: &Shared) {
    let span = tracing::info_span!("connection", connection_id = %guard.id(), peer_addr = %peer);
    let _enter = span.enter();
    let start = Instant::now();

    if let Err(e) = serve(&stream, &mut guard, shared, start) {
        tracing::warn!(error = %e, "Failed to write response");
    }
    linger_close(&stream);
    guard.advance(ConnectionState::Closed);
}

fn serve(
    stream: &TcpStream,
    guard: &mut ConnectionGuard,
    shared: &Shared,
    start: Instant,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let exchange = exchange(&mut reader, guard, shared);

    let method = exchange
        .request
        .as_ref()
        .map(|r| r.method().as_str())
        .unwrap_or("-");
    let status = exchange.response.status();
    let response = with_session_cookie(
        exchange.response,
        exchange.request.is_some(),
        exchange.presented_session.as_deref(),
        &shared.sessions,
    );

    tracing::info!(
        status,
        content_type = response.content_type(),
        content_length = response.content_length(),
        cookies = response.cookies().len(),
        "Response"
    );

    let mut writer = BufWriter::new(stream);
    let result = response.write_to(&mut writer, &shared.wire);
    metrics::record_request(method, status, start);
    result?;

    guard.advance(if exchange.failed {
        ConnectionState::ErrorResponseSerialized
    } else {
        ConnectionState::ResponseSerialized
    });
    Ok(())
}

/// Parse, resolve the session, dispatch. Never fails: errors become responses.
fn exchange<R: BufRead>(reader: &mut R, guard: &mut ConnectionGuard, shared: &Shared) -> Exchange {
    let request = match Request::read_from(reader) {
        Ok(request) => request,
        Err(e) => return Exchange::failed(None, None, e),
    };
    guard.advance(ConnectionState::RequestRead);
    tracing::info!(method = %request.method(), path = %request.path(), "Request: {}", request);

    let presented = match shared.sessions.presented_id(&request) {
        Ok(presented) => presented,
        Err(e) => return Exchange::failed(Some(request), None, e),
    };

    match dispatch(&request, presented.as_deref(), reader, guard, shared) {
        Ok(response) => Exchange {
            request: Some(request),
            presented_session: presented,
            response,
            failed: false,
        },
        Err(e) => Exchange::failed(Some(request), presented, e),
    }
}

fn dispatch<R: BufRead>(
    request: &Request,
    presented: Option<&str>,
    reader: &mut R,
    guard: &mut ConnectionGuard,
    shared: &Shared,
) -> Result<Response, HttpError> {
    let session = shared.sessions.resolve(presented);
    let (prefix, handler) = shared.router.resolve(request.path())?;
    guard.advance(ConnectionState::Routed);
    tracing::debug!(prefix, session_id = %session.id(), "Dispatching");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        handler.handle(request, &session, reader)
    }));
    guard.advance(ConnectionState::HandlerInvoked);

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(HttpError::internal(panic_message(payload.as_ref()))),
    }
}

impl Exchange {
    fn failed(request: Option<Request>, presented_session: Option<String>, err: HttpError) -> Self {
        tracing::error!(status = err.status(), error = ?err, "Request failed: {}", err);
        Self {
            request,
            presented_session,
            response: Response::from_error(&err),
            failed: true,
        }
    }
}

/// Add the session cookie when the client did not already present this session.
fn with_session_cookie(
    mut response: Response,
    has_request: bool,
    presented: Option<&str>,
    sessions: &SessionStore,
) -> Response {
    if !has_request {
        return response;
    }
    let Some(session) = response.session().cloned() else {
        return response;
    };
    if presented != Some(session.id()) {
        let cookie = Cookie::new(sessions.cookie_name(), session.id(), sessions.ttl()).http_only();
        response.add_cookie(cookie);
    }
    response
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}

/// Half-close, then drain what the client already sent so the close does not
/// reset the connection before the response is read.
fn linger_close(stream: &TcpStream) {
    if stream.shutdown(SocketShutdown::Write).is_err() {
        return;
    }
    let _ = stream.set_read_timeout(Some(LINGER_TIMEOUT));
    let mut rest = stream.take(LINGER_MAX_BYTES);
    let _ = io::copy(&mut rest, &mut io::sink());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::http::UNKNOWN_FAILURE_MESSAGE;

    fn shared() -> Shared {
        Shared {
            router: Router::new(),
            sessions: SessionStore::new("MuSID", Duration::from_secs(1800)),
            wire: WireOptions::default(),
        }
    }

    /// Returns (failed, had a request, response with cookies applied).
    fn run(shared: &Shared, raw: &str) -> (bool, bool, Response) {
        let tracker = ConnectionTracker::new();
        let mut guard = tracker.track();
        let mut reader = Cursor::new(raw.as_bytes().to_vec());
        let ex = exchange(&mut reader, &mut guard, shared);
        let response = with_session_cookie(
            ex.response,
            ex.request.is_some(),
            ex.presented_session.as_deref(),
            &shared.sessions,
        );
        (ex.failed, ex.request.is_some(), response)
    }

    #[test]
    fn root_sets_cookie_for_new_session() {
        let shared = shared();
        let (failed, _, response) = run(&shared, "GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(!failed);
        assert_eq!(response.status(), 200);
        assert_eq!(response.cookies().len(), 1);

        let cookie = &response.cookies()[0];
        assert_eq!(cookie.name, "MuSID");
        assert!(cookie.http_only);
        assert_eq!(cookie.max_age, Duration::from_secs(1800));
        assert!(shared.sessions.get(&cookie.value).is_some());
    }

    #[test]
    fn presented_session_is_not_echoed() {
        let shared = shared();
        let session = shared.sessions.create();
        let raw = format!("GET / HTTP/1.1\r\nCookie: MuSID={}\r\n\r\n", session.id());
        let (_, _, response) = run(&shared, &raw);
        assert_eq!(response.status(), 200);
        assert!(response.cookies().is_empty());
        assert_eq!(response.session().unwrap().id(), session.id());
    }

    #[test]
    fn stray_quote_in_cookie_header_still_serves() {
        let shared = shared();
        let session = shared.sessions.create();
        let raw = format!(
            "GET / HTTP/1.1\r\nCookie: pref=\"dark; MuSID={}\r\n\r\n",
            session.id()
        );
        let (failed, _, response) = run(&shared, &raw);
        assert!(!failed);
        assert_eq!(response.status(), 200);
        assert_eq!(response.cookies().len(), 1);
        assert_ne!(response.cookies()[0].value, session.id());
    }

    #[test]
    fn unknown_path_is_not_found_without_cookie() {
        let shared = shared();
        let (failed, _, response) = run(&shared, "GET /z HTTP/1.1\r\n\r\n");
        assert!(failed);
        assert_eq!(response.status(), 404);
        assert!(response.cookies().is_empty());
    }

    #[test]
    fn malformed_request_line_has_no_request() {
        let shared = shared();
        let (_, had_request, response) = run(&shared, "GARBAGE\r\n\r\n");
        assert!(!had_request);
        assert_eq!(response.status(), 400);
    }

    #[test]
    fn unknown_version_is_505() {
        let shared = shared();
        let (_, _, response) = run(&shared, "GET / HTTP/2.0\r\n\r\n");
        assert_eq!(response.status(), 505);
    }

    #[test]
    fn longest_prefix_handler_runs() {
        let mut shared = shared();
        shared.router.register("/a", |_: &Request, _: &Arc<Session>, _: &mut dyn BufRead| {
            Ok(Response::text(200, "a"))
        });
        shared.router.register("/a/b", |_: &Request, s: &Arc<Session>, _: &mut dyn BufRead| {
            Ok(Response::text(200, "ab").with_session(Arc::clone(s)))
        });
        let (_, _, response) = run(&shared, "GET /a/b/c HTTP/1.1\r\n\r\n");
        assert_eq!(response.content_length(), 2);
        assert_eq!(response.cookies().len(), 1);
    }

    #[test]
    fn handler_error_becomes_response() {
        let mut shared = shared();
        shared.router.register("/teapot", |_: &Request, _: &Arc<Session>, _: &mut dyn BufRead| {
            Err(HttpError::protocol(418, "short and stout"))
        });
        let (failed, _, response) = run(&shared, "GET /teapot HTTP/1.1\r\n\r\n");
        assert!(failed);
        assert_eq!(response.status(), 418);
        assert_eq!(response.content_length(), "short and stout".len() as u64);
    }

    #[test]
    fn handler_panic_becomes_500() {
        let mut shared = shared();
        shared.router.register("/boom", |_: &Request, _: &Arc<Session>, _: &mut dyn BufRead| {
            panic!("kaboom")
        });
        shared.router.register("/silent", |_: &Request, _: &Arc<Session>, _: &mut dyn BufRead| {
            std::panic::panic_any(42u8)
        });

        let (_, _, response) = run(&shared, "GET /boom HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), 500);
        assert_eq!(response.content_length(), "kaboom".len() as u64);

        let (_, _, response) = run(&shared, "GET /silent HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), 500);
        assert_eq!(response.content_length(), UNKNOWN_FAILURE_MESSAGE.len() as u64);
    }

    #[test]
    fn handler_reads_body_after_head() {
        let mut shared = shared();
        shared.router.register("/echo", |_: &Request, _: &Arc<Session>, body: &mut dyn BufRead| {
            let mut line = String::new();
            body.read_line(&mut line)?;
            Ok(Response::text(200, line.trim_end().to_string()))
        });
        let (_, _, response) = run(&shared, "POST /echo HTTP/1.1\r\n\r\nhello\r\n");
        assert_eq!(response.content_length(), 5);
    }
}
