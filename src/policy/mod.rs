//! Capability policy: patterns, constraint sets, and the two resolvers that
//! combine them.
//!
//! - [`pattern`] parses and matches `namespace.action` patterns
//! - [`constraints`] composes allow/deny sets
//! - [`collection`] applies a collection's shared policy to a member agent
//! - [`delegation`] bounds what a subagent may do for a delegator

pub mod collection;
pub mod constraints;
pub mod delegation;
pub mod pattern;

pub use collection::{
    AgentPolicy, CollectionPolicy, CollectionResolution, ConflictPolicy, OptOut,
    opt_out_justification, resolve_collection, resolve_network,
};
pub use constraints::{ConstraintSet, intersect, union_denied};
pub use delegation::{
    AuditLevel, DelegationMode, DelegationOutcome, DelegationSecurityConfig,
    DelegationSecurityDoc, Elevation, ElevationDoc, resolve_delegation,
};
pub use pattern::{CapabilityPattern, WILDCARD, matches, subsumes};
