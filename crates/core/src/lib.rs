//! ezpoll-core: a phase-gated, single-administrator voting engine.
//!
//! The workflow moves through six phases in a fixed order. The administrator
//! registers voters and drives the phases; registered voters submit proposals
//! and then cast exactly one vote each; the tally picks the proposal with the
//! most votes (lowest id on a tie).
//!
//! - `Engine`: owns the phase, the registries and the tally result
//! - `Command` / `Receipt`: serializable operations and their effects
//! - `Event` / `EventSink`: ordered notifications for the boundary layer
//! - `Snapshot`: restorable state with a content digest
//! - `SharedEngine`: one lock around one engine for multi-threaded hosts

mod error;
mod phase;
mod registry;
mod event;
mod command;
mod engine;
pub mod tally;
mod snapshot;
mod digest;
pub mod config;
mod shared;

pub use error::{Error, Missing, Result, Role};
pub use phase::Phase;
pub use registry::{
    Principal, Proposal, ProposalId, ProposalRegistry, SENTINEL_PROPOSAL_ID, Voter, VoterRegistry,
};
pub use event::{Event, EventBuffer, EventSink};
pub use command::{Command, Receipt};
pub use engine::Engine;
pub use tally::Tally;
pub use snapshot::Snapshot;
pub use digest::Digest;
pub use config::{EngineConfig, LimitsConfig};
pub use shared::SharedEngine;
