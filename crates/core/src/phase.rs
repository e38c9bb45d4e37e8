//! The workflow phase sequence.
//!
//! ```text
//! RegisteringVoters
//!   -> ProposalsRegistrationStarted
//!   -> ProposalsRegistrationEnded
//!   -> VotingSessionStarted
//!   -> VotingSessionEnded
//!   -> VotesTallied
//! ```
//!
//! The sequence is strictly linear: one step forward at a time, no skipping,
//! no going back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step in the six-stage workflow.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Phase {
    #[default]
    RegisteringVoters,
    ProposalsRegistrationStarted,
    ProposalsRegistrationEnded,
    VotingSessionStarted,
    VotingSessionEnded,
    VotesTallied,
}

impl Phase {
    /// Every phase, in workflow order.
    pub const ALL: [Phase; 6] = [
        Phase::RegisteringVoters,
        Phase::ProposalsRegistrationStarted,
        Phase::ProposalsRegistrationEnded,
        Phase::VotingSessionStarted,
        Phase::VotingSessionEnded,
        Phase::VotesTallied,
    ];

    /// Position in the sequence, starting at 0.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Phase::index`].
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Whether the workflow is over.
    pub fn is_final(self) -> bool {
        self == Phase::VotesTallied
    }

    /// Why an operation gated on this phase is refused while the workflow is
    /// elsewhere.
    pub fn not_open_reason(&self) -> &'static str {
        match self {
            Phase::RegisteringVoters => "Voters registration is not open yet",
            Phase::ProposalsRegistrationStarted => "Proposals are not allowed yet",
            Phase::ProposalsRegistrationEnded => "Registering proposals phase is not finished",
            Phase::VotingSessionStarted => "Voting session hasn't started yet",
            Phase::VotingSessionEnded => "Current status is not voting session ended",
            Phase::VotesTallied => "Votes have not been tallied yet",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Phase::RegisteringVoters => "registering voters",
            Phase::ProposalsRegistrationStarted => "proposals registration started",
            Phase::ProposalsRegistrationEnded => "proposals registration ended",
            Phase::VotingSessionStarted => "voting session started",
            Phase::VotingSessionEnded => "voting session ended",
            Phase::VotesTallied => "votes tallied",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
