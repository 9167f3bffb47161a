// File: src/services/identity_service.rs

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Namespace for v5 identity derivation. Fixed so the same origin and
/// signature always map to the same identity across restarts.
const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x8f1c_2a77_5d40_4b6e_9b3a_c0d1_e5f6_0712);

const CACHE_MAX_AGE_SECS: i64 = 24 * 3600;

#[derive(Debug, Clone)]
struct CachedIdentity {
    identity: Uuid,
    last_access: DateTime<Utc>,
}

/// Derives a stable pseudonymous identity from network origin plus client
/// signature, assigned once per session and reused thereafter so signature
/// drift mid-session cannot change the identity. Two clients presenting the
/// same origin and signature resolve to the same identity; that collision is
/// a known limitation, not disambiguated here.
pub struct IdentityService {
    cache: DashMap<String, CachedIdentity>,
}

impl IdentityService {
    pub fn new() -> Self {
        Self { cache: DashMap::new() }
    }

    /// Pure derivation, no caching.
    pub fn derive(remote_addr: &str, client_signature: &str) -> Uuid {
        let fingerprint = format!("{remote_addr}_{client_signature}");
        Uuid::new_v5(&IDENTITY_NAMESPACE, fingerprint.as_bytes())
    }

    /// Returns the session's identity, deriving and caching it on first use.
    pub fn resolve(&self, session_key: &str, remote_addr: &str, client_signature: &str) -> Uuid {
        if let Some(mut entry) = self.cache.get_mut(session_key) {
            entry.last_access = Utc::now();
            return entry.identity;
        }

        let identity = Self::derive(remote_addr, client_signature);
        self.cache.insert(
            session_key.to_string(),
            CachedIdentity { identity, last_access: Utc::now() },
        );
        identity
    }

    pub fn invalidate(&self, session_key: &str) {
        self.cache.remove(session_key);
    }

    /// Test helper
    pub fn force_last_access(&self, session_key: &str, hours_ago: i64) -> bool {
        if let Some(mut entry) = self.cache.get_mut(session_key) {
            entry.last_access = Utc::now() - chrono::Duration::hours(hours_ago);
            true
        } else {
            false
        }
    }

    /// Drop sessions idle past the max age.
    pub fn prune(&self) {
        let now = Utc::now();
        let mut to_remove = Vec::new();
        for entry in self.cache.iter() {
            let age = now.signed_duration_since(entry.value().last_access);
            if age.num_seconds() >= CACHE_MAX_AGE_SECS {
                to_remove.push(entry.key().clone());
            }
        }
        for key in to_remove {
            self.cache.remove(&key);
        }
    }
}

impl Default for IdentityService {
    fn default() -> Self {
        Self::new()
    }
}
