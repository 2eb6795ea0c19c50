use shared::{CoreError, VoteChannel};

pub const VOTED_FINGERPRINT_KEY: &str = "voters_voted_fingerprint_key";
pub const EMAIL_KEY: &str = "voters_email_key";
pub const VOTER_RANK_KEY: &str = "ballot_entries_voter_rank_key";
pub const CANDIDATE_FKEY: &str = "ballot_entries_candidate_id_fkey";

/// Unique indexes are the last line against concurrent double votes, so
/// their violations surface as `AlreadyVoted` rather than storage failures.
pub fn db_error(e: sqlx::Error) -> CoreError {
    match constraint_of(&e) {
        Some(VOTED_FINGERPRINT_KEY) => CoreError::AlreadyVoted(VoteChannel::Device),
        Some(EMAIL_KEY) | Some(VOTER_RANK_KEY) => CoreError::AlreadyVoted(VoteChannel::Email),
        _ => CoreError::persistence(e),
    }
}

pub fn constraint_of(e: &sqlx::Error) -> Option<&str> {
    e.as_database_error().and_then(|db| db.constraint())
}

/// Keeps the first character of the local part for log lines.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        }
        None => "***".into(),
    }
}
