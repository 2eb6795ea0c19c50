use std::collections::HashMap;

use crate::models::{BallotEntry, Candidate, CandidateTally, TallyResult};

/// Raw material for a tally, as read from storage without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    /// Candidates in id (insertion) order.
    pub candidates: Vec<Candidate>,
    /// Ballot entries per candidate id.
    pub counts: HashMap<i64, i64>,
    pub voters_voted: i64,
}

pub fn count_entries<'a>(entries: impl IntoIterator<Item = &'a BallotEntry>) -> HashMap<i64, i64> {
    entries.into_iter().fold(HashMap::new(), |mut counts, entry| {
        *counts.entry(entry.candidate_id).or_insert(0) += 1;
        counts
    })
}

/// Every entry counts as one vote whatever its rank. Candidates are ordered
/// by descending count; equal counts keep the snapshot's candidate order.
pub fn tally(snapshot: TallySnapshot) -> TallyResult {
    let TallySnapshot { candidates, counts, voters_voted } = snapshot;

    let mut standings: Vec<_> = candidates
        .into_iter()
        .map(|candidate| {
            let votes = counts.get(&candidate.id).copied().unwrap_or(0);
            CandidateTally { rank: 0, candidate, votes }
        })
        .collect();

    // `sort_by` is stable, which is what preserves insertion order on ties.
    standings.sort_by(|a, b| b.votes.cmp(&a.votes));
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = i + 1;
    }

    TallyResult {
        total_entries: standings.iter().map(|s| s.votes).sum(),
        standings,
        total_voters_voted: voters_voted,
    }
}
