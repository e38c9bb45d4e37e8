//! Commands and receipts.
//!
//! A [`Command`] is the serializable form of a mutating operation, so the
//! boundary layer can queue, log or replay them. Executing a command yields a
//! [`Receipt`] describing what changed.

use serde::{Deserialize, Serialize};

use crate::{Phase, Principal, ProposalId};

/// A request to mutate the engine. The caller travels alongside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    RegisterVoter { voter: Principal },
    SubmitProposal { description: String },
    CastVote { proposal_id: ProposalId },
    StartProposalsRegistering,
    EndProposalsRegistering,
    StartVotingSession,
    EndVotingSession,
    TallyVotes,
}

impl Command {
    /// Operation name, as used in logs. Matches the serialized `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterVoter { .. } => "register_voter",
            Command::SubmitProposal { .. } => "submit_proposal",
            Command::CastVote { .. } => "cast_vote",
            Command::StartProposalsRegistering => "start_proposals_registering",
            Command::EndProposalsRegistering => "end_proposals_registering",
            Command::StartVotingSession => "start_voting_session",
            Command::EndVotingSession => "end_voting_session",
            Command::TallyVotes => "tally_votes",
        }
    }

    /// For phase transitions, the phase the command requires.
    pub fn required_phase(&self) -> Option<Phase> {
        match self {
            Command::StartProposalsRegistering => Some(Phase::RegisteringVoters),
            Command::EndProposalsRegistering => Some(Phase::ProposalsRegistrationStarted),
            Command::StartVotingSession => Some(Phase::ProposalsRegistrationEnded),
            Command::EndVotingSession => Some(Phase::VotingSessionStarted),
            Command::TallyVotes => Some(Phase::VotingSessionEnded),
            _ => None,
        }
    }

    /// Whether only the administrator may issue this command.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Command::RegisterVoter { .. }) || self.required_phase().is_some()
    }
}

/// The effect of a successful command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Receipt {
    PhaseChanged {
        previous: Phase,
        new: Phase,
    },
    VoterRegistered {
        voter: Principal,
    },
    ProposalRegistered {
        proposal_id: ProposalId,
    },
    Voted {
        voter: Principal,
        proposal_id: ProposalId,
    },
    Tallied {
        winning_proposal_id: ProposalId,
        vote_count: u64,
    },
}
