use rustrict::CensorStr;
use tracing::{info, warn, instrument};
use shared::{
    tally, validate_candidate, validate_identity, validate_selection, BallotReceipt, Candidate,
    CoreError, IdentityClaim, NewCandidate, ResolveIdentityRequest, TallyResult,
    ValidationError, VotedVoter,
};
use crate::store::Store;
use crate::utils::mask_email;

/// The voting core: identity resolution, ballot recording and tallying on
/// top of a [`Store`].
pub struct BallotProcessor;

impl BallotProcessor {
    /// Uses the client-supplied fingerprint, or derives one from raw device
    /// signals when the client sent those instead.
    pub fn claim_from_request(request: ResolveIdentityRequest) -> IdentityClaim {
        let fingerprint = match (request.fingerprint, request.device) {
            (Some(fingerprint), _) if !fingerprint.is_empty() => fingerprint,
            (_, Some(device)) => device.fingerprint(),
            _ => String::new(),
        };

        IdentityClaim {
            name: request.name,
            email: request.email,
            fingerprint,
        }
    }

    #[instrument(skip_all, fields(email = %mask_email(&claim.email)))]
    pub async fn resolve_identity(store: &dyn Store, claim: IdentityClaim) -> Result<i64, CoreError> {
        validate_identity(&claim)?;

        let claim = IdentityClaim { name: claim.name.trim().to_string(), ..claim };
        match store.resolve_identity(&claim).await {
            Ok(voter_id) => {
                info!(voter_id, "Resolved voter identity");
                Ok(voter_id)
            }
            Err(e @ CoreError::AlreadyVoted(_)) => {
                warn!("Identity rejected: {}", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(store, candidate_ids), fields(selections = candidate_ids.len()))]
    pub async fn submit_ballot(
        store: &dyn Store,
        voter_id: i64,
        candidate_ids: &[i64],
    ) -> Result<BallotReceipt, CoreError> {
        validate_selection(candidate_ids)?;

        match store.record_ballot(voter_id, candidate_ids).await {
            Ok(receipt) => {
                info!(voter_id, entries = receipt.entries, "Ballot recorded");
                Ok(receipt)
            }
            Err(e @ CoreError::AlreadyVoted(_)) => {
                warn!(voter_id, "Ballot rejected: {}", e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_results(store: &dyn Store) -> Result<TallyResult, CoreError> {
        Ok(tally(store.tally_snapshot().await?))
    }

    pub async fn list_voted_voters(store: &dyn Store) -> Result<Vec<VotedVoter>, CoreError> {
        store.list_voted_voters().await
    }

    pub async fn list_candidates(store: &dyn Store) -> Result<Vec<Candidate>, CoreError> {
        store.list_candidates().await
    }

    fn screen_candidate(candidate: &NewCandidate) -> Result<(), CoreError> {
        validate_candidate(candidate)?;
        if candidate.name.is_inappropriate() || candidate.position.is_inappropriate() {
            return Err(ValidationError::InappropriateName(candidate.name.trim().to_string()).into());
        }
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn add_candidate(store: &dyn Store, candidate: NewCandidate) -> Result<Candidate, CoreError> {
        Self::screen_candidate(&candidate)?;
        let created = store.create_candidate(&candidate).await?;
        info!(candidate_id = created.id, "Candidate added");
        Ok(created)
    }

    #[instrument(skip(store, candidate))]
    pub async fn update_candidate(
        store: &dyn Store,
        id: i64,
        candidate: NewCandidate,
    ) -> Result<Option<Candidate>, CoreError> {
        Self::screen_candidate(&candidate)?;
        store.update_candidate(id, &candidate).await
    }

    #[instrument(skip(store))]
    pub async fn delete_candidate(store: &dyn Store, id: i64) -> Result<bool, CoreError> {
        let deleted = store.delete_candidate(id).await?;
        if deleted {
            info!("Candidate deleted");
        }
        Ok(deleted)
    }

    #[instrument(skip_all)]
    pub async fn reset_election(store: &dyn Store) -> Result<(), CoreError> {
        store.reset().await?;
        warn!("Election reset: all ballots, voters and candidates deleted");
        Ok(())
    }
}
