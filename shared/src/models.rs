use serde::{Serialize, Deserialize};
use time::OffsetDateTime;

use crate::fingerprint::DeviceSignals;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    pub name: String,
    #[serde(default)]
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub fingerprint: String,
    pub has_voted: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub voted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BallotEntry {
    pub voter_id: i64,
    pub candidate_id: i64,
    pub rank: i32,
}

/// Validated input to identity resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    pub name: String,
    pub email: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIdentityRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceSignals>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub voter_id: i64,
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBallotRequest {
    pub session_token: String,
    pub candidate_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BallotReceipt {
    pub voter_id: i64,
    pub entries: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub voted_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct VotedVoter {
    pub voter_id: i64,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub voted_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    /// 1-based position in the standings.
    pub rank: usize,
    pub candidate: Candidate,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TallyResult {
    pub standings: Vec<CandidateTally>,
    pub total_voters_voted: i64,
    pub total_entries: i64,
}

impl Voter {
    pub fn new(id: i64, claim: &IdentityClaim) -> Self {
        Self {
            id,
            name: claim.name.trim().to_string(),
            email: claim.email.clone(),
            fingerprint: claim.fingerprint.clone(),
            has_voted: false,
            voted_at: None,
        }
    }

    pub fn mark_voted(&mut self, at: OffsetDateTime) {
        self.has_voted = true;
        self.voted_at = Some(at);
    }
}
