//! Voter and proposal registries.
//!
//! Both registries are append-only: records are never removed, and the only
//! mutation after creation is the single vote a voter casts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Missing, Result};

/// An opaque, authenticated caller identity supplied by the boundary layer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Proposal identifier. Ids are assigned sequentially from 1.
pub type ProposalId = u64;

/// Id of the reserved "no choice" proposal.
pub const SENTINEL_PROPOSAL_ID: ProposalId = 0;

/// A voter record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub is_registered: bool,
    pub has_voted: bool,
    /// 0 until the voter has voted.
    pub voted_proposal_id: ProposalId,
}

impl Voter {
    fn registered() -> Self {
        Self {
            is_registered: true,
            ..Self::default()
        }
    }
}

/// A proposal record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub vote_count: u64,
}

impl Proposal {
    fn new(description: String) -> Self {
        Self {
            description,
            vote_count: 0,
        }
    }

    /// The sentinel: empty description, no votes.
    fn sentinel() -> Self {
        Self::default()
    }
}

/// Principal -> voter record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoterRegistry {
    voters: BTreeMap<Principal, Voter>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(voters: BTreeMap<Principal, Voter>) -> Self {
        Self { voters }
    }

    pub fn get(&self, principal: &Principal) -> Option<&Voter> {
        self.voters.get(principal)
    }

    /// Whether `principal` holds the registered-voter role.
    pub fn is_registered(&self, principal: &Principal) -> bool {
        self.voters.get(principal).is_some_and(|v| v.is_registered)
    }

    /// Enroll a principal. Fails if already present.
    pub(crate) fn register(&mut self, principal: Principal) -> Result<()> {
        if self.voters.contains_key(&principal) {
            return Err(Error::Duplicate(principal));
        }
        self.voters.insert(principal, Voter::registered());
        Ok(())
    }

    /// Record the vote on the voter side. Caller has already checked that the
    /// voter exists and has not voted.
    pub(crate) fn record_vote(&mut self, principal: &Principal, proposal_id: ProposalId) {
        if let Some(voter) = self.voters.get_mut(principal) {
            voter.has_voted = true;
            voter.voted_proposal_id = proposal_id;
        }
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Number of voters with `has_voted` set.
    pub fn voted_count(&self) -> u64 {
        self.voters.values().filter(|v| v.has_voted).count() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Principal, &Voter)> {
        self.voters.iter()
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<Principal, Voter> {
        &self.voters
    }
}

/// Proposal id -> proposal record, plus the id counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalRegistry {
    proposals: BTreeMap<ProposalId, Proposal>,
    next_id: ProposalId,
}

impl Default for ProposalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalRegistry {
    /// A registry holding only the sentinel.
    pub fn new() -> Self {
        let mut proposals = BTreeMap::new();
        proposals.insert(SENTINEL_PROPOSAL_ID, Proposal::sentinel());
        Self {
            proposals,
            next_id: SENTINEL_PROPOSAL_ID + 1,
        }
    }

    pub(crate) fn from_parts(proposals: BTreeMap<ProposalId, Proposal>, next_id: ProposalId) -> Self {
        Self { proposals, next_id }
    }

    /// Insert the sentinel if it is missing. Returns true if it was inserted.
    pub(crate) fn ensure_sentinel(&mut self) -> bool {
        if self.proposals.contains_key(&SENTINEL_PROPOSAL_ID) {
            return false;
        }
        self.proposals.insert(SENTINEL_PROPOSAL_ID, Proposal::sentinel());
        true
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Look up a proposal, failing with `NotFound`.
    pub fn require(&self, id: ProposalId) -> Result<&Proposal> {
        self.get(id).ok_or(Error::NotFound(Missing::Proposal(id)))
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        self.proposals.contains_key(&id)
    }

    /// Store a new proposal under the next id and return that id.
    pub(crate) fn push(&mut self, description: String) -> ProposalId {
        let id = self.next_id;
        self.proposals.insert(id, Proposal::new(description));
        self.next_id += 1;
        id
    }

    pub(crate) fn increment(&mut self, id: ProposalId) {
        if let Some(proposal) = self.proposals.get_mut(&id) {
            proposal.vote_count += 1;
        }
    }

    /// The id the next proposal will receive.
    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    /// Number of records, sentinel included.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Number of proposals submitted by voters (sentinel excluded).
    pub fn submitted_count(&self) -> usize {
        self.proposals
            .keys()
            .filter(|id| **id != SENTINEL_PROPOSAL_ID)
            .count()
    }

    /// Sum of all vote counts.
    pub fn total_votes(&self) -> u64 {
        self.proposals.values().map(|p| p.vote_count).sum()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProposalId, &Proposal)> {
        self.proposals.iter().map(|(id, p)| (*id, p))
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<ProposalId, Proposal> {
        &self.proposals
    }
}
