use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::infrastructure::clock::Clock;
use crate::infrastructure::storage::StateStore;

/// Storage key for the serialized token record.
pub const CSRF_TOKEN_KEY: &str = "csrf_token";

/// Token lifetime, one hour.
pub const CSRF_TOKEN_TTL_MS: i64 = 3_600_000;

const TOKEN_HEX_LEN: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    token: String,
    expiry: i64,
}

/// Session-scoped CSRF token lifecycle: one active token at a time,
/// regenerated on first request, on expiry, or when the stored record is
/// malformed.
///
/// This prepares a token to send alongside a submission; it is advisory.
/// Genuine CSRF protection requires the server to verify the token, which is
/// outside this crate's scope.
pub struct CsrfProtection {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl CsrfProtection {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the active token, generating a fresh one if the stored record
    /// is absent, malformed or expired.
    pub fn get_token(&self) -> String {
        if let Some(raw) = self.store.get(CSRF_TOKEN_KEY) {
            if let Ok(record) = serde_json::from_str::<TokenRecord>(&raw) {
                if self.clock.now_millis() <= record.expiry && well_formed(&record.token) {
                    return record.token;
                }
            }
        }
        self.generate()
    }

    /// Compares a candidate against the active token. Plain equality: this is
    /// a client-side advisory check, not the trust boundary.
    pub fn validate_token(&self, candidate: &str) -> bool {
        self.get_token() == candidate
    }

    fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);

        let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let record = TokenRecord {
            token: token.clone(),
            expiry: self.clock.now_millis() + CSRF_TOKEN_TTL_MS,
        };

        match serde_json::to_string(&record) {
            Ok(serialized) => self.store.set(CSRF_TOKEN_KEY, &serialized),
            Err(err) => tracing::error!("failed to serialize CSRF token record: {err}"),
        }

        token
    }
}

fn well_formed(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::test_support::ManualClock;
    use crate::infrastructure::storage::MemoryStore;

    fn csrf() -> (CsrfProtection, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(MemoryStore::new());
        let csrf = CsrfProtection::new(store.clone(), clock.clone());
        (csrf, clock, store)
    }

    #[test]
    fn token_is_64_hex_chars() {
        let (csrf, _, _) = csrf();
        let token = csrf.get_token();
        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn token_is_stable_within_ttl() {
        let (csrf, clock, _) = csrf();

        let first = csrf.get_token();
        clock.advance(CSRF_TOKEN_TTL_MS / 2);
        assert_eq!(csrf.get_token(), first);
    }

    #[test]
    fn token_rotates_after_expiry() {
        let (csrf, clock, _) = csrf();

        let first = csrf.get_token();
        clock.advance(CSRF_TOKEN_TTL_MS + 1);
        let second = csrf.get_token();

        assert_ne!(first, second);
        // The fresh token is now the stable one again.
        assert_eq!(csrf.get_token(), second);
    }

    #[test]
    fn malformed_record_regenerates() {
        let (csrf, _, store) = csrf();

        store.set(CSRF_TOKEN_KEY, "{\"broken\":true}");
        let token = csrf.get_token();
        assert_eq!(token.len(), 64);
    }

    #[test]
    fn validate_matches_current_token() {
        let (csrf, _, _) = csrf();

        let token = csrf.get_token();
        assert!(csrf.validate_token(&token));
        assert!(!csrf.validate_token("somebody-else"));
    }
}
