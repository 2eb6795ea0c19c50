use std::collections::HashMap;
use std::sync::Mutex;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct VoterSession {
    voter_id: i64,
    issued_at: OffsetDateTime,
}

/// Server-issued tokens binding a resolved voter to a later ballot
/// submission. The voting core itself keeps no state between calls.
pub struct SessionGuard {
    sessions: Mutex<HashMap<String, VoterSession>>,
    rng: SystemRandom,
    ttl: Duration,
}

impl SessionGuard {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rng: SystemRandom::new(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, VoterSession>>, ApiError> {
        self.sessions.lock().map_err(|e| {
            error!("Failed to acquire session lock: {}", e);
            ApiError::Internal("session store unavailable".into())
        })
    }

    pub fn issue(&self, voter_id: i64) -> Result<String, ApiError> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| ApiError::Internal("failed to generate session token".into()))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.lock()?.insert(token.clone(), VoterSession {
            voter_id,
            issued_at: OffsetDateTime::now_utc(),
        });
        debug!(voter_id, "Issued voter session");
        Ok(token)
    }

    pub fn voter_for(&self, token: &str) -> Result<i64, ApiError> {
        self.voter_at(token, OffsetDateTime::now_utc())
    }

    fn voter_at(&self, token: &str, now: OffsetDateTime) -> Result<i64, ApiError> {
        let mut sessions = self.lock()?;
        match sessions.get(token).copied() {
            Some(session) if now - session.issued_at <= self.ttl => Ok(session.voter_id),
            Some(_) => {
                sessions.remove(token);
                debug!("Voter session expired");
                Err(ApiError::InvalidSession)
            }
            None => Err(ApiError::InvalidSession),
        }
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(mut sessions) = self.lock() {
            sessions.remove(token);
        }
    }

    /// Drops expired sessions, returning how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        match self.lock() {
            Ok(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|_, s| now - s.issued_at <= self.ttl);
                before - sessions.len()
            }
            Err(_) => 0,
        }
    }
}
