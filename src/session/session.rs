//! Session identity.

use std::time::{Duration, Instant};

use rand::Rng;

/// Characters session ids are drawn from. The dashes are repeated on purpose
/// so that they occur more often than other symbols.
const ID_ALPHABET: &[u8] =
    b"----AaBbCcDdEeFfGgHhIiJjKkLlMmNnOoPpQqRrSsTtUuVvWwXxYyZz0123456789----";

/// Length of a generated session id.
pub const SESSION_ID_LEN: usize = 32;

/// A client session, identified by a random id carried in a cookie.
#[derive(Debug)]
pub struct Session {
    id: String,
    created: Instant,
}

impl Session {
    /// Mint a session with a fresh random id, created now.
    pub fn generate() -> Self {
        Self::with_id(generate_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    /// Time elapsed between creation and `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created)
    }

    /// Lifetime is absolute: measured from creation, not from last use.
    pub fn is_expired_at(&self, ttl: Duration, now: Instant) -> bool {
        self.age_at(now) > ttl
    }
}

fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
