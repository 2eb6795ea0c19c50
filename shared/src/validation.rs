use crate::models::{IdentityClaim, NewCandidate};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_CANDIDATE_NAME_LENGTH: usize = 100;
pub const MAX_POSITION_LENGTH: usize = 100;
pub const MAX_BALLOT_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid email address (e.g., name@example.com)")]
    InvalidEmail,
    #[error("Email exceeds maximum length of {MAX_EMAIL_LENGTH}")]
    EmailTooLong,
    #[error("Unable to verify device. Please refresh and try again.")]
    MissingFingerprint,
    #[error("Name is required")]
    EmptyName,
    #[error("Name exceeds maximum length of {MAX_NAME_LENGTH}")]
    NameTooLong,
    #[error("Possible profanity detected in name: {0}")]
    InappropriateName(String),
    #[error("Please select at least one candidate")]
    EmptyBallot,
    #[error("Too many selections (maximum {MAX_BALLOT_SIZE})")]
    BallotTooLarge,
    #[error("Unknown voter: {0}")]
    UnknownVoter(i64),
    #[error("Unknown candidate: {0}")]
    UnknownCandidate(i64),
    #[error("Candidate name is required")]
    EmptyCandidateName,
    #[error("Candidate name exceeds maximum length of {MAX_CANDIDATE_NAME_LENGTH}")]
    CandidateNameTooLong,
    #[error("Position exceeds maximum length of {MAX_POSITION_LENGTH}")]
    PositionTooLong,
    #[error("Candidate {0} already has recorded ballots")]
    CandidateHasBallots(i64),
}

/// Structural check equivalent to `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Needs a dot with at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH { return Err(ValidationError::EmailTooLong); }
    if !is_valid_email(email) { return Err(ValidationError::InvalidEmail); }
    Ok(())
}

/// Only presence is checked. The 64-character cut belongs to
/// [`crate::DeviceSignals::fingerprint`], not to callers.
pub fn validate_fingerprint(fingerprint: &str) -> Result<(), ValidationError> {
    if fingerprint.is_empty() { return Err(ValidationError::MissingFingerprint); }
    Ok(())
}

pub fn validate_identity(claim: &IdentityClaim) -> Result<(), ValidationError> {
    validate_email(&claim.email)?;
    validate_fingerprint(&claim.fingerprint)?;

    let name = claim.name.trim();
    if name.is_empty() { return Err(ValidationError::EmptyName); }
    if name.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    Ok(())
}

/// Duplicates are deliberately not rejected here; they are recorded as submitted.
pub fn validate_selection(candidate_ids: &[i64]) -> Result<(), ValidationError> {
    if candidate_ids.is_empty() { return Err(ValidationError::EmptyBallot); }
    if candidate_ids.len() > MAX_BALLOT_SIZE { return Err(ValidationError::BallotTooLarge); }
    Ok(())
}

pub fn validate_candidate(candidate: &NewCandidate) -> Result<(), ValidationError> {
    let name = candidate.name.trim();
    if name.is_empty() { return Err(ValidationError::EmptyCandidateName); }
    if name.chars().count() > MAX_CANDIDATE_NAME_LENGTH { return Err(ValidationError::CandidateNameTooLong); }
    if candidate.position.chars().count() > MAX_POSITION_LENGTH { return Err(ValidationError::PositionTooLong); }
    Ok(())
}
