//! Specialist lookup and the layout it depends on.

pub mod layout;
pub mod specialist;

pub use layout::{AGENT_DEFINITION, COLLECTION_MANIFEST, discover_context};
pub use specialist::{
    DEFAULT_SUGGESTION_THRESHOLD, RegistryEntry, ResolutionContext, ResolvedSpecialist,
    SiblingDir, resolve_specialist, suggest,
};
