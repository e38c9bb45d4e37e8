//! Error types for ezpoll-core.

use std::fmt;

use thiserror::Error;

use crate::{Phase, Principal, ProposalId};

/// Core errors.
///
/// Every operation is all-or-nothing: when one of these is returned the
/// engine state is exactly what it was before the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller lacks the role the operation requires.
    #[error("{} ({caller})", Role::denial(.role))]
    Unauthorized { caller: Principal, role: Role },

    /// Operation invoked outside its phase.
    #[error("{} (current phase: {actual})", Phase::not_open_reason(.expected))]
    Phase { expected: Phase, actual: Phase },

    /// Principal is already in the voter registry.
    #[error("Already registered ({0})")]
    Duplicate(Principal),

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Voter has already cast their vote.
    #[error("You have already voted ({0})")]
    AlreadyVoted(Principal),

    /// Referenced record does not exist.
    #[error("{0}")]
    NotFound(Missing),

    /// Snapshot violates an engine invariant.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The role an operation is guarded by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Voter,
}

impl Role {
    /// Refusal shown to a caller without this role.
    pub fn denial(&self) -> &'static str {
        match self {
            Role::Administrator => "You're not the administrator",
            Role::Voter => "You're not a voter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => f.write_str("administrator"),
            Role::Voter => f.write_str("voter"),
        }
    }
}

/// What a [`Error::NotFound`] refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Missing {
    Proposal(ProposalId),
    Voter(Principal),
    WinningProposal,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Proposal(id) => write!(f, "Proposal not found (id {id})"),
            Missing::Voter(voter) => write!(f, "Voter not found ({voter})"),
            Missing::WinningProposal => f.write_str("Winning proposal not found"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<ciborium::ser::Error<std::io::Error>> for Error {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<confique::Error> for Error {
    fn from(e: confique::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_refusal_reason() {
        let err = Error::Unauthorized {
            caller: Principal::from("mallory"),
            role: Role::Voter,
        };
        assert_eq!(err.to_string(), "You're not a voter (mallory)");

        let err = Error::Unauthorized {
            caller: Principal::from("mallory"),
            role: Role::Administrator,
        };
        assert_eq!(err.to_string(), "You're not the administrator (mallory)");

        let err = Error::Phase {
            expected: Phase::VotingSessionStarted,
            actual: Phase::RegisteringVoters,
        };
        assert_eq!(
            err.to_string(),
            "Voting session hasn't started yet (current phase: registering voters)"
        );

        let err = Error::Phase {
            expected: Phase::ProposalsRegistrationStarted,
            actual: Phase::VotesTallied,
        };
        assert!(err.to_string().starts_with("Proposals are not allowed yet"));

        assert_eq!(
            Error::Duplicate(Principal::from("alice")).to_string(),
            "Already registered (alice)"
        );
        assert_eq!(
            Error::AlreadyVoted(Principal::from("alice")).to_string(),
            "You have already voted (alice)"
        );
        assert_eq!(
            Error::NotFound(Missing::Proposal(99)).to_string(),
            "Proposal not found (id 99)"
        );
    }
}
