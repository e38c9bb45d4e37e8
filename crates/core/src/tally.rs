//! Tally computation.

use crate::{Proposal, ProposalId, SENTINEL_PROPOSAL_ID};

/// Outcome of scanning the proposal registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally {
    pub winning_proposal_id: ProposalId,
    pub vote_count: u64,
    /// Other proposals that reached the same count (higher ids).
    pub tied_with: Vec<ProposalId>,
}

/// Select the proposal with the greatest vote count.
///
/// Proposals are scanned in ascending id order and only a strictly greater
/// count replaces the current leader, so on a tie the lowest id wins. With no
/// votes at all the sentinel wins.
pub fn compute<'a>(proposals: impl IntoIterator<Item = (ProposalId, &'a Proposal)>) -> Tally {
    let mut tally = Tally {
        winning_proposal_id: SENTINEL_PROPOSAL_ID,
        vote_count: 0,
        tied_with: Vec::new(),
    };
    let mut first = true;

    for (id, proposal) in proposals {
        if first || proposal.vote_count > tally.vote_count {
            tally.winning_proposal_id = id;
            tally.vote_count = proposal.vote_count;
            tally.tied_with.clear();
            first = false;
        } else if proposal.vote_count == tally.vote_count {
            tally.tied_with.push(id);
        }
    }

    tally
}
