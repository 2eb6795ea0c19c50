//! The integrity-critical decision of whether an identity may still vote.
//!
//! Storage backends gather the relevant voter rows inside their own
//! transaction or lock and hand them to these functions, so every backend
//! makes the same decision while holding its atomicity guarantee.

use crate::error::{CoreError, VoteChannel};
use crate::models::Voter;

/// What a backend knows about one voter row at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoterState {
    pub id: i64,
    pub has_voted: bool,
    /// Whether any ballot entries reference this voter.
    pub has_ballots: bool,
}

impl VoterState {
    pub fn of(voter: &Voter, has_ballots: bool) -> Self {
        Self { id: voter.id, has_voted: voter.has_voted, has_ballots }
    }

    /// A voter with recorded entries counts as voted even if the flag was
    /// never set.
    pub fn voted(&self) -> bool {
        self.has_voted || self.has_ballots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityAction {
    /// Existing voter; attach the current fingerprint.
    Refresh(i64),
    Create,
}

/// Device is checked before email. `device_match` is any voter sharing the
/// fingerprint, `email_match` the voter owning the email.
pub fn check_eligibility(
    device_match: Option<&VoterState>,
    email_match: Option<&VoterState>,
) -> Result<(), CoreError> {
    if device_match.is_some_and(VoterState::voted) {
        return Err(CoreError::AlreadyVoted(VoteChannel::Device));
    }
    if email_match.is_some_and(VoterState::voted) {
        return Err(CoreError::AlreadyVoted(VoteChannel::Email));
    }
    Ok(())
}

pub fn resolve_action(
    device_match: Option<&VoterState>,
    email_match: Option<&VoterState>,
) -> Result<IdentityAction, CoreError> {
    check_eligibility(device_match, email_match)?;
    Ok(match email_match {
        Some(voter) => IdentityAction::Refresh(voter.id),
        None => IdentityAction::Create,
    })
}
