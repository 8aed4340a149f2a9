//! Proposals: priced offers of a product to a client.

pub mod proposal;

pub use proposal::{NewProposal, Proposal, ProposalFilter, ProposalPatch, ProposalStatus, ProposalSummary};
