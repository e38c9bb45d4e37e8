//! Engine snapshots.
//!
//! A [`Snapshot`] is everything the boundary layer must persist to rebuild an
//! engine after a restart. Maps are ordered, so two engines in the same state
//! encode to the same bytes and the same [`Digest`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::{
    Digest, Phase, Principal, Proposal, ProposalId, SENTINEL_PROPOSAL_ID, Voter, tally,
};

/// Complete, restorable engine state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub administrator: Principal,
    pub voters: BTreeMap<Principal, Voter>,
    pub proposals: BTreeMap<ProposalId, Proposal>,
    pub next_proposal_id: ProposalId,
    pub winning_proposal_id: Option<ProposalId>,
}

impl Snapshot {
    /// Encode as CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)?;
        Ok(buf)
    }

    /// Decode from CBOR. Does not validate; see [`Snapshot::validate`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(ciborium::from_reader(bytes)?)
    }

    /// Pretty JSON, for inspection.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Content digest of the CBOR encoding.
    pub fn digest(&self) -> Result<Digest> {
        Digest::of_value(self)
    }

    /// Check every cross-entity invariant the engine maintains.
    pub fn validate(&self) -> Result<()> {
        if !self.proposals.contains_key(&SENTINEL_PROPOSAL_ID) {
            return Err(invalid("sentinel proposal is missing"));
        }
        if !self.proposals.keys().copied().eq(0..self.next_proposal_id) {
            return Err(invalid(format!(
                "proposal ids must be exactly 0..{}",
                self.next_proposal_id
            )));
        }
        if let Some((id, _)) = self
            .proposals
            .iter()
            .find(|(id, p)| **id != SENTINEL_PROPOSAL_ID && p.description.trim().is_empty())
        {
            return Err(invalid(format!("proposal {id} has an empty description")));
        }
        if self.next_proposal_id > 1 && self.phase < Phase::ProposalsRegistrationStarted {
            return Err(invalid(format!(
                "proposals exist during phase {}",
                self.phase
            )));
        }

        let mut ballots: HashMap<ProposalId, u64> = HashMap::new();
        for (principal, voter) in &self.voters {
            if !voter.is_registered {
                return Err(invalid(format!("voter {principal} is not registered")));
            }
            if voter.has_voted {
                if !self.proposals.contains_key(&voter.voted_proposal_id) {
                    return Err(invalid(format!(
                        "voter {principal} voted for unknown proposal {}",
                        voter.voted_proposal_id
                    )));
                }
                *ballots.entry(voter.voted_proposal_id).or_default() += 1;
            } else if voter.voted_proposal_id != SENTINEL_PROPOSAL_ID {
                return Err(invalid(format!(
                    "voter {principal} has a proposal id but has not voted"
                )));
            }
        }
        if !ballots.is_empty() && self.phase < Phase::VotingSessionStarted {
            return Err(invalid(format!("votes exist during phase {}", self.phase)));
        }
        for (id, proposal) in &self.proposals {
            let cast = ballots.get(id).copied().unwrap_or(0);
            if proposal.vote_count != cast {
                return Err(invalid(format!(
                    "proposal {id} counts {} votes but {cast} voters chose it",
                    proposal.vote_count
                )));
            }
        }

        match (self.phase, self.winning_proposal_id) {
            (Phase::VotesTallied, Some(winner)) => {
                let expected = tally::compute(self.proposals.iter().map(|(id, p)| (*id, p)));
                if winner != expected.winning_proposal_id {
                    return Err(invalid(format!(
                        "winning proposal {winner} disagrees with tally {}",
                        expected.winning_proposal_id
                    )));
                }
            }
            (Phase::VotesTallied, None) => {
                return Err(invalid("votes tallied without a winning proposal"));
            }
            (phase, Some(_)) => {
                return Err(invalid(format!("winning proposal set during phase {phase}")));
            }
            (_, None) => {}
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::Snapshot(reason.into())
}
