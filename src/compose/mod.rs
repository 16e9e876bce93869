//! Merging resources contributed by referenced modules.

pub mod collision;
pub mod steering;

pub use collision::{
    MergedName, MergedResources, MergedSection, ModuleContribution, ModuleReference,
    resolve_collisions,
};
pub use steering::{SteeringSection, split_sections};
