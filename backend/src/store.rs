use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::error;
use shared::{
    check_eligibility, count_entries, resolve_action, BallotEntry, BallotReceipt, Candidate,
    CoreError, IdentityAction, IdentityClaim, NewCandidate, TallySnapshot, ValidationError,
    VotedVoter, Voter, VoterState,
};

/// Persistence behind the voting core.
///
/// `resolve_identity` and `record_ballot` must each run as one atomic unit:
/// two concurrent calls for the same email or fingerprint can never both
/// succeed. Inputs are expected to be validated by the caller.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Candidates in id order.
    async fn list_candidates(&self) -> Result<Vec<Candidate>, CoreError>;

    async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, CoreError>;

    async fn update_candidate(&self, id: i64, candidate: &NewCandidate) -> Result<Option<Candidate>, CoreError>;

    /// Fails with `CandidateHasBallots` if entries reference the candidate.
    async fn delete_candidate(&self, id: i64) -> Result<bool, CoreError>;

    async fn find_voter(&self, id: i64) -> Result<Option<Voter>, CoreError>;

    /// Returns the id of the single not-yet-voted voter owning the email,
    /// creating it or refreshing its fingerprint.
    async fn resolve_identity(&self, claim: &IdentityClaim) -> Result<i64, CoreError>;

    /// Writes the whole ballot and flips the voter to voted, or nothing.
    async fn record_ballot(&self, voter_id: i64, candidate_ids: &[i64]) -> Result<BallotReceipt, CoreError>;

    async fn tally_snapshot(&self) -> Result<TallySnapshot, CoreError>;

    /// Newest vote first.
    async fn list_voted_voters(&self) -> Result<Vec<VotedVoter>, CoreError>;

    /// Deletes ballot entries, voters and candidates.
    async fn reset(&self) -> Result<(), CoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    candidates: Vec<Candidate>,
    voters: Vec<Voter>,
    entries: Vec<BallotEntry>,
    last_candidate_id: i64,
    last_voter_id: i64,
}

impl MemoryState {
    fn state_of(&self, voter: &Voter) -> VoterState {
        let has_ballots = self.entries.iter().any(|e| e.voter_id == voter.id);
        VoterState::of(voter, has_ballots)
    }

    fn voted_with_fingerprint(&self, fingerprint: &str) -> Option<VoterState> {
        self.voters
            .iter()
            .filter(|v| v.fingerprint == fingerprint)
            .map(|v| self.state_of(v))
            .find(VoterState::voted)
    }

    fn voter_mut(&mut self, id: i64) -> Option<&mut Voter> {
        self.voters.iter_mut().find(|v| v.id == id)
    }
}

/// Single-lock store for tests and local runs. Holding the lock across the
/// whole check-then-write gives the same atomicity the Postgres store gets
/// from transactions and unique indexes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state.lock().map_err(|e| {
            error!("Failed to acquire store lock: {}", e);
            CoreError::Persistence("store lock poisoned".into())
        })
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, CoreError> {
        Ok(self.lock()?.candidates.clone())
    }

    async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, CoreError> {
        let mut state = self.lock()?;
        state.last_candidate_id += 1;
        let created = Candidate {
            id: state.last_candidate_id,
            name: candidate.name.trim().to_string(),
            position: candidate.position.trim().to_string(),
        };
        state.candidates.push(created.clone());
        Ok(created)
    }

    async fn update_candidate(&self, id: i64, candidate: &NewCandidate) -> Result<Option<Candidate>, CoreError> {
        let mut state = self.lock()?;
        Ok(state.candidates.iter_mut().find(|c| c.id == id).map(|existing| {
            existing.name = candidate.name.trim().to_string();
            existing.position = candidate.position.trim().to_string();
            existing.clone()
        }))
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, CoreError> {
        let mut state = self.lock()?;
        if state.entries.iter().any(|e| e.candidate_id == id) {
            return Err(ValidationError::CandidateHasBallots(id).into());
        }
        let before = state.candidates.len();
        state.candidates.retain(|c| c.id != id);
        Ok(state.candidates.len() != before)
    }

    async fn find_voter(&self, id: i64) -> Result<Option<Voter>, CoreError> {
        Ok(self.lock()?.voters.iter().find(|v| v.id == id).cloned())
    }

    async fn resolve_identity(&self, claim: &IdentityClaim) -> Result<i64, CoreError> {
        let mut state = self.lock()?;
        let device = state.voted_with_fingerprint(&claim.fingerprint);
        let email = state
            .voters
            .iter()
            .find(|v| v.email == claim.email)
            .map(|v| state.state_of(v));

        match resolve_action(device.as_ref(), email.as_ref())? {
            IdentityAction::Refresh(id) => {
                let voter = state
                    .voter_mut(id)
                    .ok_or_else(|| CoreError::Persistence(format!("voter {id} vanished")))?;
                voter.fingerprint = claim.fingerprint.clone();
                Ok(id)
            }
            IdentityAction::Create => {
                state.last_voter_id += 1;
                let id = state.last_voter_id;
                state.voters.push(Voter::new(id, claim));
                Ok(id)
            }
        }
    }

    async fn record_ballot(&self, voter_id: i64, candidate_ids: &[i64]) -> Result<BallotReceipt, CoreError> {
        let mut state = self.lock()?;
        let voter = state
            .voters
            .iter()
            .find(|v| v.id == voter_id)
            .ok_or(ValidationError::UnknownVoter(voter_id))?;

        let own = state.state_of(voter);
        let device = state.voted_with_fingerprint(&voter.fingerprint);
        check_eligibility(device.as_ref(), Some(&own))?;

        if let Some(&missing) = candidate_ids
            .iter()
            .find(|&&id| !state.candidates.iter().any(|c| c.id == id))
        {
            return Err(ValidationError::UnknownCandidate(missing).into());
        }

        state.entries.extend(candidate_ids.iter().enumerate().map(|(i, &candidate_id)| BallotEntry {
            voter_id,
            candidate_id,
            rank: i as i32 + 1,
        }));

        let voted_at = OffsetDateTime::now_utc();
        if let Some(voter) = state.voter_mut(voter_id) {
            voter.mark_voted(voted_at);
        }

        Ok(BallotReceipt { voter_id, entries: candidate_ids.len(), voted_at })
    }

    async fn tally_snapshot(&self) -> Result<TallySnapshot, CoreError> {
        let state = self.lock()?;
        Ok(TallySnapshot {
            candidates: state.candidates.clone(),
            counts: count_entries(&state.entries),
            voters_voted: state.voters.iter().filter(|v| v.has_voted).count() as i64,
        })
    }

    async fn list_voted_voters(&self) -> Result<Vec<VotedVoter>, CoreError> {
        let state = self.lock()?;
        let mut voted: Vec<_> = state
            .voters
            .iter()
            .filter_map(|v| v.voted_at.filter(|_| v.has_voted).map(|voted_at| VotedVoter {
                voter_id: v.id,
                name: v.name.clone(),
                email: v.email.clone(),
                voted_at,
            }))
            .collect();
        voted.sort_by(|a, b| b.voted_at.cmp(&a.voted_at).then_with(|| b.voter_id.cmp(&a.voter_id)));
        Ok(voted)
    }

    async fn reset(&self) -> Result<(), CoreError> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.voters.clear();
        state.candidates.clear();
        Ok(())
    }
}
