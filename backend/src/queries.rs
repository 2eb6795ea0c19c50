use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use shared::{
    check_eligibility, resolve_action, BallotReceipt, Candidate, CoreError, IdentityAction,
    IdentityClaim, NewCandidate, TallySnapshot, ValidationError, VoteChannel, VotedVoter, Voter,
    VoterState,
};
use crate::store::Store;
use crate::utils::{constraint_of, db_error, CANDIDATE_FKEY};

const VOTED_BY_FINGERPRINT: &str =
    "SELECT v.id, v.has_voted, EXISTS (SELECT 1 FROM ballot_entries b WHERE b.voter_id = v.id)
     FROM voters v
     WHERE v.fingerprint = $1
       AND (v.has_voted OR EXISTS (SELECT 1 FROM ballot_entries b WHERE b.voter_id = v.id))
     LIMIT 1";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn voted_with_fingerprint(
        tx: &mut Transaction<'_, Postgres>,
        fingerprint: &str,
    ) -> Result<Option<VoterState>, CoreError> {
        let row: Option<(i64, bool, bool)> = sqlx::query_as(VOTED_BY_FINGERPRINT)
            .bind(fingerprint)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?;

        Ok(row.map(|(id, has_voted, has_ballots)| VoterState { id, has_voted, has_ballots }))
    }
}

#[rocket::async_trait]
impl Store for PgStore {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, CoreError> {
        sqlx::query_as::<_, Candidate>("SELECT id, name, position FROM candidates ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, CoreError> {
        sqlx::query_as::<_, Candidate>(
            "INSERT INTO candidates (name, position) VALUES ($1, $2)
             RETURNING id, name, position",
        )
        .bind(candidate.name.trim())
        .bind(candidate.position.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn update_candidate(&self, id: i64, candidate: &NewCandidate) -> Result<Option<Candidate>, CoreError> {
        sqlx::query_as::<_, Candidate>(
            "UPDATE candidates SET name = $2, position = $3 WHERE id = $1
             RETURNING id, name, position",
        )
        .bind(id)
        .bind(candidate.name.trim())
        .bind(candidate.position.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match constraint_of(&e) {
                Some(CANDIDATE_FKEY) => ValidationError::CandidateHasBallots(id).into(),
                _ => db_error(e),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_voter(&self, id: i64) -> Result<Option<Voter>, CoreError> {
        sqlx::query_as::<_, Voter>(
            "SELECT id, name, email, fingerprint, has_voted, voted_at FROM voters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn resolve_identity(&self, claim: &IdentityClaim) -> Result<i64, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let device = Self::voted_with_fingerprint(&mut tx, &claim.fingerprint).await?;

        let email: Option<(i64, bool, bool)> = sqlx::query_as(
            "SELECT v.id, v.has_voted, EXISTS (SELECT 1 FROM ballot_entries b WHERE b.voter_id = v.id)
             FROM voters v WHERE v.email = $1
             FOR UPDATE OF v",
        )
        .bind(&claim.email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let email = email.map(|(id, has_voted, has_ballots)| VoterState { id, has_voted, has_ballots });

        let voter_id = match resolve_action(device.as_ref(), email.as_ref())? {
            IdentityAction::Refresh(id) => {
                sqlx::query("UPDATE voters SET fingerprint = $2 WHERE id = $1")
                    .bind(id)
                    .bind(&claim.fingerprint)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                id
            }
            IdentityAction::Create => {
                // A concurrent resolve may have inserted the email since the
                // read above; fall back to refreshing it unless it has voted.
                let inserted: Option<i64> = sqlx::query_scalar(
                    "INSERT INTO voters (name, email, fingerprint) VALUES ($1, $2, $3)
                     ON CONFLICT (email) DO UPDATE SET fingerprint = EXCLUDED.fingerprint
                     WHERE NOT voters.has_voted
                       AND NOT EXISTS (SELECT 1 FROM ballot_entries b WHERE b.voter_id = voters.id)
                     RETURNING id",
                )
                .bind(claim.name.trim())
                .bind(&claim.email)
                .bind(&claim.fingerprint)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

                inserted.ok_or(CoreError::AlreadyVoted(VoteChannel::Email))?
            }
        };

        tx.commit().await.map_err(db_error)?;
        Ok(voter_id)
    }

    async fn record_ballot(&self, voter_id: i64, candidate_ids: &[i64]) -> Result<BallotReceipt, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let voter = sqlx::query_as::<_, Voter>(
            "SELECT id, name, email, fingerprint, has_voted, voted_at
             FROM voters WHERE id = $1 FOR UPDATE",
        )
        .bind(voter_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or(ValidationError::UnknownVoter(voter_id))?;

        let has_ballots: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM ballot_entries WHERE voter_id = $1)",
        )
        .bind(voter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let device = Self::voted_with_fingerprint(&mut tx, &voter.fingerprint).await?;
        check_eligibility(device.as_ref(), Some(&VoterState::of(&voter, has_ballots)))?;

        let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM candidates WHERE id = ANY($1)")
            .bind(candidate_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;
        if let Some(&missing) = candidate_ids.iter().find(|id| !known.contains(*id)) {
            return Err(ValidationError::UnknownCandidate(missing).into());
        }

        let ranks: Vec<i32> = (1..=candidate_ids.len() as i32).collect();
        sqlx::query(
            "INSERT INTO ballot_entries (voter_id, candidate_id, rank)
             SELECT $1, t.candidate_id, t.rank
             FROM UNNEST($2::BIGINT[], $3::INT[]) AS t(candidate_id, rank)",
        )
        .bind(voter_id)
        .bind(candidate_ids)
        .bind(&ranks)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        // The voted-fingerprint index rejects this update if another voter on
        // the same device committed first; the entries roll back with it.
        let voted_at: OffsetDateTime = sqlx::query_scalar(
            "UPDATE voters SET has_voted = TRUE, voted_at = NOW() WHERE id = $1 RETURNING voted_at",
        )
        .bind(voter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(BallotReceipt { voter_id, entries: candidate_ids.len(), voted_at })
    }

    async fn tally_snapshot(&self) -> Result<TallySnapshot, CoreError> {
        let candidates = self.list_candidates().await?;

        let counts: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT candidate_id, COUNT(*) FROM ballot_entries GROUP BY candidate_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let voters_voted: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voters WHERE has_voted")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(TallySnapshot {
            candidates,
            counts: counts.into_iter().collect(),
            voters_voted,
        })
    }

    async fn list_voted_voters(&self) -> Result<Vec<VotedVoter>, CoreError> {
        sqlx::query_as::<_, VotedVoter>(
            "SELECT id AS voter_id, name, email, voted_at
             FROM voters WHERE has_voted AND voted_at IS NOT NULL
             ORDER BY voted_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn reset(&self) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for statement in [
            "DELETE FROM ballot_entries",
            "DELETE FROM voters",
            "DELETE FROM candidates",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)
    }
}
