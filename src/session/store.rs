//! Concurrent session registry.
//!
//! # Responsibilities
//! - Resolve the session named by the request cookie, or mint a new one
//! - Remove sessions on explicit kill or expiry
//! - Notify the kill listener exactly once per removed session
//!
//! # Design Decisions
//! - `DashMap` gives per-entry atomic insert/remove; a session is visible to
//!   every lookup as soon as `insert` returns
//! - Only the caller whose `remove` actually took the entry notifies, so a
//!   reaper pass racing an explicit kill never notifies twice
//! - Listener calls never overlap across threads. The guard is reentrant,
//!   so a listener may itself kill sessions or replace the listener

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};

use crate::config::SessionConfig;
use crate::http::{HttpError, Request};
use crate::observability::metrics;
use crate::session::Session;

/// Callback invoked with each removed session.
pub type KillListener = Arc<dyn Fn(&Session) + Send + Sync>;

/// Why a session left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    Explicit,
    Expired,
}

impl KillReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            KillReason::Explicit => "explicit",
            KillReason::Expired => "expired",
        }
    }
}

/// Shared handle to the session map; clones refer to the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    kill_listener: Arc<Mutex<Option<KillListener>>>,
    notify_guard: Arc<ReentrantMutex<()>>,
    cookie_name: String,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            kill_listener: Arc::new(Mutex::new(None)),
            notify_guard: Arc::new(ReentrantMutex::new(())),
            cookie_name: cookie_name.into(),
            ttl,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.clone(), config.ttl())
    }

    /// Name of the cookie carrying the session id.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Install the kill listener, replacing any previous one.
    pub fn set_kill_listener<F>(&self, listener: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        *self.kill_listener.lock() = Some(Arc::new(listener));
    }

    /// Session id presented in the request's cookie, if any.
    pub fn presented_id(&self, request: &Request) -> Result<Option<String>, HttpError> {
        request.cookie(&self.cookie_name)
    }

    /// Return the live session named by the request cookie, or create one.
    pub fn find_or_create(&self, request: &Request) -> Result<Arc<Session>, HttpError> {
        let presented = self.presented_id(request)?;
        Ok(self.resolve(presented.as_deref()))
    }

    /// Return the live session with id `presented`, or create one.
    pub fn resolve(&self, presented: Option<&str>) -> Arc<Session> {
        if let Some(id) = presented {
            if let Some(session) = self.lookup_live(id, Instant::now()) {
                return session;
            }
        }
        self.create()
    }

    /// Mint and register a new session.
    pub fn create(&self) -> Arc<Session> {
        loop {
            let session = Arc::new(Session::generate());
            if let Entry::Vacant(slot) = self.sessions.entry(session.id().to_string()) {
                slot.insert(Arc::clone(&session));
                metrics::record_session_created(self.sessions.len());
                tracing::info!(session_id = %session.id(), "Created session");
                return session;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session and notify the listener. Returns false if absent.
    pub fn kill(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                self.notify_killed(&session, KillReason::Explicit);
                true
            }
            None => false,
        }
    }

    /// Remove every session older than the TTL at `now`; returns how many went.
    pub fn reap_expired(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired_at(self.ttl, now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in expired {
            if self.remove_expired(&id, now) {
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn lookup_live(&self, id: &str, now: Instant) -> Option<Arc<Session>> {
        let session = self.get(id)?;
        if session.is_expired_at(self.ttl, now) {
            // Not yet reaped; evict it here so the client gets a fresh session.
            self.remove_expired(id, now);
            return None;
        }
        Some(session)
    }

    fn remove_expired(&self, id: &str, now: Instant) -> bool {
        let ttl = self.ttl;
        match self
            .sessions
            .remove_if(id, |_, session| session.is_expired_at(ttl, now))
        {
            Some((_, session)) => {
                self.notify_killed(&session, KillReason::Expired);
                true
            }
            None => false,
        }
    }

    fn notify_killed(&self, session: &Session, reason: KillReason) {
        tracing::info!(
            session_id = %session.id(),
            reason = reason.as_str(),
            "Killed session"
        );
        metrics::record_session_killed(reason.as_str(), self.sessions.len());

        // Clone out of the slot so the listener runs without holding it.
        let listener = self.kill_listener.lock().clone();
        if let Some(listener) = listener {
            let _serial = self.notify_guard.lock();
            listener(session);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("cookie_name", &self.cookie_name)
            .field("ttl", &self.ttl)
            .finish()
    }
}
