//! The ezpoll engine: enforces the workflow and owns all voting state.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Missing, Result, Role};
use crate::{
    Command, EngineConfig, Event, EventSink, Phase, Principal, Proposal, ProposalId,
    ProposalRegistry, Receipt, Snapshot, Voter, VoterRegistry, tally,
};

/// The workflow engine.
///
/// Every operation takes the calling principal explicitly and either applies
/// completely or returns an error with the state untouched.
pub struct Engine {
    /// Set at construction, never changes.
    administrator: Principal,

    phase: Phase,

    voters: VoterRegistry,

    /// Always holds the sentinel.
    proposals: ProposalRegistry,

    /// Set by the tally, and only then.
    winning_proposal_id: Option<ProposalId>,

    config: EngineConfig,

    /// Notified in order after each successful mutation.
    sinks: Vec<Box<dyn EventSink>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("administrator", &self.administrator)
            .field("phase", &self.phase)
            .field("voters", &self.voters.len())
            .field("proposals", &self.proposals.len())
            .field("winning_proposal_id", &self.winning_proposal_id)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Engine {
    /// Create an engine administered by `administrator`, with default limits.
    pub fn new(administrator: impl Into<Principal>) -> Self {
        Self::with_config(administrator, EngineConfig::default())
    }

    /// Create an engine administered by `administrator`.
    pub fn with_config(administrator: impl Into<Principal>, config: EngineConfig) -> Self {
        let administrator = administrator.into();
        info!(%administrator, "voting engine created");
        Self {
            administrator,
            phase: Phase::RegisteringVoters,
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            winning_proposal_id: None,
            config,
            sinks: Vec::new(),
        }
    }

    /// Rebuild an engine from a snapshot, rejecting inconsistent ones.
    pub fn restore(snapshot: Snapshot, config: EngineConfig) -> Result<Self> {
        snapshot
            .validate()
            .inspect_err(|e| warn!(error = %e, "snapshot rejected"))?;

        info!(
            administrator = %snapshot.administrator,
            phase = %snapshot.phase,
            voters = snapshot.voters.len(),
            proposals = snapshot.proposals.len(),
            "voting engine restored"
        );

        Ok(Self {
            administrator: snapshot.administrator,
            phase: snapshot.phase,
            voters: VoterRegistry::from_map(snapshot.voters),
            proposals: ProposalRegistry::from_parts(snapshot.proposals, snapshot.next_proposal_id),
            winning_proposal_id: snapshot.winning_proposal_id,
            config,
            sinks: Vec::new(),
        })
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            administrator: self.administrator.clone(),
            voters: self.voters.as_map().clone(),
            proposals: self.proposals.as_map().clone(),
            next_proposal_id: self.proposals.next_id(),
            winning_proposal_id: self.winning_proposal_id,
        }
    }

    /// Add a notification subscriber.
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Execute a command on behalf of `caller`.
    pub fn execute(&mut self, caller: &Principal, command: Command) -> Result<Receipt> {
        debug!(operation = command.name(), %caller, "executing command");
        let previous = self.phase;
        match command {
            Command::RegisterVoter { voter } => {
                self.register_voter(caller, voter.clone())?;
                Ok(Receipt::VoterRegistered { voter })
            }
            Command::SubmitProposal { description } => {
                let proposal_id = self.submit_proposal(caller, &description)?;
                Ok(Receipt::ProposalRegistered { proposal_id })
            }
            Command::CastVote { proposal_id } => {
                self.cast_vote(caller, proposal_id)?;
                Ok(Receipt::Voted {
                    voter: caller.clone(),
                    proposal_id,
                })
            }
            Command::StartProposalsRegistering => {
                let new = self.start_proposals_registering(caller)?;
                Ok(Receipt::PhaseChanged { previous, new })
            }
            Command::EndProposalsRegistering => {
                let new = self.end_proposals_registering(caller)?;
                Ok(Receipt::PhaseChanged { previous, new })
            }
            Command::StartVotingSession => {
                let new = self.start_voting_session(caller)?;
                Ok(Receipt::PhaseChanged { previous, new })
            }
            Command::EndVotingSession => {
                let new = self.end_voting_session(caller)?;
                Ok(Receipt::PhaseChanged { previous, new })
            }
            Command::TallyVotes => {
                let winning_proposal_id = self.tally_votes(caller)?;
                let vote_count = self
                    .proposals
                    .get(winning_proposal_id)
                    .map_or(0, |p| p.vote_count);
                Ok(Receipt::Tallied {
                    winning_proposal_id,
                    vote_count,
                })
            }
        }
    }

    // =========================================================================
    // Phase transitions
    // =========================================================================

    /// RegisteringVoters -> ProposalsRegistrationStarted.
    pub fn start_proposals_registering(&mut self, caller: &Principal) -> Result<Phase> {
        self.guard_transition(caller, Phase::RegisteringVoters)
            .inspect_err(|e| rejected("start_proposals_registering", caller, e))?;

        if self.proposals.ensure_sentinel() {
            warn!("sentinel proposal was missing and has been recreated");
        }
        Ok(self.advance())
    }

    /// ProposalsRegistrationStarted -> ProposalsRegistrationEnded.
    pub fn end_proposals_registering(&mut self, caller: &Principal) -> Result<Phase> {
        self.guard_transition(caller, Phase::ProposalsRegistrationStarted)
            .inspect_err(|e| rejected("end_proposals_registering", caller, e))?;
        Ok(self.advance())
    }

    /// ProposalsRegistrationEnded -> VotingSessionStarted.
    pub fn start_voting_session(&mut self, caller: &Principal) -> Result<Phase> {
        self.guard_transition(caller, Phase::ProposalsRegistrationEnded)
            .inspect_err(|e| rejected("start_voting_session", caller, e))?;
        Ok(self.advance())
    }

    /// VotingSessionStarted -> VotingSessionEnded.
    pub fn end_voting_session(&mut self, caller: &Principal) -> Result<Phase> {
        self.guard_transition(caller, Phase::VotingSessionStarted)
            .inspect_err(|e| rejected("end_voting_session", caller, e))?;
        Ok(self.advance())
    }

    /// VotingSessionEnded -> VotesTallied, recording the winning proposal.
    pub fn tally_votes(&mut self, caller: &Principal) -> Result<ProposalId> {
        self.guard_transition(caller, Phase::VotingSessionEnded)
            .inspect_err(|e| rejected("tally_votes", caller, e))?;

        let result = tally::compute(self.proposals.iter());
        if !result.tied_with.is_empty() {
            info!(
                winner = result.winning_proposal_id,
                tied_with = ?result.tied_with,
                "tie broken in favour of the lowest proposal id"
            );
        }
        info!(
            winner = result.winning_proposal_id,
            votes = result.vote_count,
            total = self.proposals.total_votes(),
            "votes tallied"
        );

        self.winning_proposal_id = Some(result.winning_proposal_id);
        self.advance();
        Ok(result.winning_proposal_id)
    }

    fn guard_transition(&self, caller: &Principal, expected: Phase) -> Result<()> {
        self.require_administrator(caller)?;
        self.require_phase(expected)
    }

    /// Move one step forward. Only called after the phase guard passed, so the
    /// current phase is never final here.
    fn advance(&mut self) -> Phase {
        let previous = self.phase;
        let Some(new) = previous.next() else {
            return previous;
        };
        self.phase = new;
        info!(%previous, %new, "phase changed");
        self.emit(Event::PhaseChanged { previous, new });
        new
    }

    // =========================================================================
    // Registration, proposals, votes
    // =========================================================================

    /// Enroll `voter`. Administrator only, during RegisteringVoters.
    pub fn register_voter(&mut self, caller: &Principal, voter: Principal) -> Result<()> {
        self.require_administrator(caller)
            .and_then(|()| self.require_phase(Phase::RegisteringVoters))
            .and_then(|()| self.voters.register(voter.clone()))
            .inspect_err(|e| rejected("register_voter", caller, e))?;

        info!(%voter, "voter registered");
        self.emit(Event::VoterRegistered { voter });
        Ok(())
    }

    /// Submit a proposal. Registered voters only, during
    /// ProposalsRegistrationStarted. Returns the new proposal id.
    pub fn submit_proposal(&mut self, caller: &Principal, description: &str) -> Result<ProposalId> {
        self.require_voter(caller)
            .and_then(|()| self.require_phase(Phase::ProposalsRegistrationStarted))
            .and_then(|()| self.validate_description(description))
            .inspect_err(|e| rejected("submit_proposal", caller, e))?;

        let proposal_id = self.proposals.push(description.to_string());
        info!(%caller, proposal_id, "proposal registered");
        self.emit(Event::ProposalRegistered { proposal_id });
        Ok(proposal_id)
    }

    /// Checks run on the trimmed text; the caller stores the original.
    fn validate_description(&self, description: &str) -> Result<()> {
        let limits = &self.config.limits;
        let trimmed = description.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation("Proposal cannot be empty".into()));
        }
        if let Some(max_len) = limits.max_description_len {
            let len = trimmed.chars().count();
            if len > max_len {
                return Err(Error::Validation(format!(
                    "Proposal is {len} characters, the limit is {max_len}"
                )));
            }
        }
        if let Some(max) = limits.max_proposals {
            if self.proposals.submitted_count() >= max {
                return Err(Error::Validation(format!(
                    "Proposal limit of {max} reached"
                )));
            }
        }

        Ok(())
    }

    /// Cast `caller`'s single vote. Registered voters only, during
    /// VotingSessionStarted. The sentinel (id 0) is a valid target.
    pub fn cast_vote(&mut self, caller: &Principal, proposal_id: ProposalId) -> Result<()> {
        self.require_voter(caller)
            .and_then(|()| self.require_phase(Phase::VotingSessionStarted))
            .and_then(|()| self.require_not_voted(caller))
            .and_then(|()| self.proposals.require(proposal_id).map(|_| ()))
            .inspect_err(|e| rejected("cast_vote", caller, e))?;

        // Both sides of the vote, with nothing fallible in between.
        self.voters.record_vote(caller, proposal_id);
        self.proposals.increment(proposal_id);

        info!(voter = %caller, proposal_id, "vote cast");
        self.emit(Event::Voted {
            voter: caller.clone(),
            proposal_id,
        });
        Ok(())
    }

    fn require_not_voted(&self, caller: &Principal) -> Result<()> {
        match self.voters.get(caller) {
            Some(voter) if voter.has_voted => Err(Error::AlreadyVoted(caller.clone())),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Read any voter's record. Registered voters only.
    pub fn get_voter(&self, caller: &Principal, principal: &Principal) -> Result<&Voter> {
        self.require_voter(caller)?;
        self.voters
            .get(principal)
            .ok_or_else(|| Error::NotFound(Missing::Voter(principal.clone())))
    }

    /// Read any proposal. Registered voters only.
    pub fn get_proposal(&self, caller: &Principal, id: ProposalId) -> Result<&Proposal> {
        self.require_voter(caller)?;
        self.proposals.require(id)
    }

    /// The winning proposal record. Registered voters only, after the tally.
    pub fn winning_proposal(&self, caller: &Principal) -> Result<(ProposalId, &Proposal)> {
        self.require_voter(caller)?;
        let id = self
            .winning_proposal_id
            .ok_or(Error::NotFound(Missing::WinningProposal))?;
        Ok((id, self.proposals.require(id)?))
    }

    /// Current phase. Unrestricted.
    pub fn get_phase(&self) -> Phase {
        self.phase
    }

    pub fn administrator(&self) -> &Principal {
        &self.administrator
    }

    /// `None` until votes are tallied.
    pub fn winning_proposal_id(&self) -> Option<ProposalId> {
        self.winning_proposal_id
    }

    /// Number of proposal records, sentinel included.
    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Read-only view of the voter registry.
    pub fn voters(&self) -> &VoterRegistry {
        &self.voters
    }

    /// Read-only view of the proposal registry.
    pub fn proposals(&self) -> &ProposalRegistry {
        &self.proposals
    }

    // =========================================================================
    // Guards
    // =========================================================================

    fn require_administrator(&self, caller: &Principal) -> Result<()> {
        if *caller != self.administrator {
            return Err(Error::Unauthorized {
                caller: caller.clone(),
                role: Role::Administrator,
            });
        }
        Ok(())
    }

    fn require_voter(&self, caller: &Principal) -> Result<()> {
        if !self.voters.is_registered(caller) {
            return Err(Error::Unauthorized {
                caller: caller.clone(),
                role: Role::Voter,
            });
        }
        Ok(())
    }

    fn require_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::Phase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.notify(&event);
        }
    }
}

fn rejected(operation: &'static str, caller: &Principal, error: &Error) {
    debug!(operation, %caller, %error, "operation rejected");
}
