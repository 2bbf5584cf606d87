use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;

use crate::error::{Error, Result};

/// Sliding session lifetime. Every successful authenticated request resets
/// the clock via `touch`.
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

const TOKEN_BYTES: usize = 16;
const ISSUE_ATTEMPTS: u32 = 100;

struct SessionEntry {
    user_id: i64,
    deadline: Instant,
}

impl SessionEntry {
    fn live(&self) -> bool {
        self.deadline > Instant::now()
    }
}

/// Maps opaque capability tokens to user ids with a sliding expiration.
///
/// Tokens are 32 lowercase hex characters (128 bits of entropy). Entries
/// past their deadline are treated as absent; they are overwritten on the
/// next colliding `issue` or dropped on `revoke`.
pub struct SessionStore {
    entries: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Issues a fresh token for the user. Retries a bounded number of times
    /// on collision with a live entry; running out of attempts means the
    /// token space or the store is misbehaving and is fatal to the request.
    pub fn issue(&self, user_id: i64) -> Result<String> {
        for _ in 0..ISSUE_ATTEMPTS {
            let token = generate_token();
            let entry = SessionEntry {
                user_id,
                deadline: Instant::now() + self.ttl,
            };

            match self.entries.entry(token.clone()) {
                Entry::Occupied(mut occupied) if !occupied.get().live() => {
                    occupied.insert(entry);
                    return Ok(token);
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(vacant) => {
                    vacant.insert(entry);
                    return Ok(token);
                }
            }
        }

        Err(Error::CapacityExhausted)
    }

    /// Pure lookup; never refreshes the deadline.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<i64> {
        self.entries
            .get(token)
            .and_then(|entry| entry.live().then_some(entry.user_id))
    }

    /// (Re)sets the mapping and resets the TTL. Concurrent touches race
    /// harmlessly: the principal never changes, only the deadline.
    pub fn touch(&self, token: &str, user_id: i64) {
        self.entries.insert(
            token.to_string(),
            SessionEntry {
                user_id,
                deadline: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops the mapping immediately. A revoked token never resolves again.
    pub fn revoke(&self, token: &str) {
        self.entries.remove(token);
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_issue_and_resolve() {
        let store = SessionStore::new();
        let token = store.issue(7).unwrap();
        assert_eq!(store.resolve(&token), Some(7));
    }

    #[test]
    fn test_revoke_is_terminal() {
        let store = SessionStore::new();
        let token = store.issue(7).unwrap();
        store.revoke(&token);
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn test_expiry_without_touch() {
        let store = SessionStore::with_ttl(Duration::from_millis(20));
        let token = store.issue(7).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn test_touch_slides_the_window() {
        let store = SessionStore::with_ttl(Duration::from_millis(60));
        let token = store.issue(7).unwrap();

        std::thread::sleep(Duration::from_millis(40));
        store.touch(&token, 7);
        std::thread::sleep(Duration::from_millis(40));

        // 80ms after issue, but only 40ms after the touch
        assert_eq!(store.resolve(&token), Some(7));
    }

    #[test]
    fn test_resolve_does_not_refresh() {
        let store = SessionStore::with_ttl(Duration::from_millis(50));
        let token = store.issue(7).unwrap();

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(store.resolve(&token), Some(7));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(store.resolve(&token), None);
    }
}
