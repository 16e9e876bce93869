//! Collision detection across merged module resources.
//!
//! Tool and server names fail fast: once every reference has applied its own
//! exclusions and aliases, no two references may contribute the same final
//! name. Steering sections never fail; the last reference to provide a heading
//! wins and the discarded origins are reported.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::steering::SteeringSection;
use crate::error::PolicyError;
use crate::report::{CollisionKind, CollisionRecord, CollisionReport, CollisionResolution};

/// Servers can only be aliased.
const NO_EXCLUSIONS: &[String] = &[];

/// A declared dependency on a bundle, directory, or agent.
///
/// Authored either as a bare path string or as a mapping with override
/// directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReferenceForm")]
pub struct ModuleReference {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub exclude_tools: Vec<String>,
    #[serde(default)]
    pub tool_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub server_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub exclude_steering_sections: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceForm {
    Path(String),
    Full {
        path: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        exclude_tools: Vec<String>,
        #[serde(default)]
        tool_aliases: BTreeMap<String, String>,
        #[serde(default)]
        server_aliases: BTreeMap<String, String>,
        #[serde(default)]
        exclude_steering_sections: Vec<String>,
    },
}

impl From<ReferenceForm> for ModuleReference {
    fn from(form: ReferenceForm) -> Self {
        match form {
            ReferenceForm::Path(path) => Self::new(path),
            ReferenceForm::Full {
                path,
                name,
                exclude_tools,
                tool_aliases,
                server_aliases,
                exclude_steering_sections,
            } => Self {
                path,
                name,
                exclude_tools,
                tool_aliases,
                server_aliases,
                exclude_steering_sections,
            },
        }
    }
}

impl ModuleReference {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn exclude_tool(mut self, tool: impl Into<String>) -> Self {
        self.exclude_tools.push(tool.into());
        self
    }

    #[must_use]
    pub fn alias_tool(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.tool_aliases.insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn alias_server(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.server_aliases.insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn exclude_section(mut self, heading: impl Into<String>) -> Self {
        self.exclude_steering_sections.push(heading.into());
        self
    }

    /// Label used in collision records and errors: the name, else the path.
    #[must_use]
    pub fn origin(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}

/// What one reference brings into the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleContribution {
    pub reference: ModuleReference,
    pub tools: Vec<String>,
    pub servers: Vec<String>,
    pub steering: Vec<SteeringSection>,
}

/// A merged tool or server name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedName {
    pub name: String,
    pub origin: String,
    /// Name as declared by the module, when aliased
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliased_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSection {
    pub heading: String,
    pub content: String,
    pub origin: String,
}

/// Result of merging every contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedResources {
    pub tools: Vec<MergedName>,
    pub servers: Vec<MergedName>,
    pub steering: Vec<MergedSection>,
    pub collisions: CollisionReport,
}

/// Outcome of applying one reference's directives to one declared name.
#[derive(Debug, Clone)]
enum Placement {
    Excluded,
    Kept { final_name: String, aliased: bool },
}

#[derive(Debug, Clone)]
struct Occurrence {
    origin_idx: usize,
    placement: Placement,
}

/// Merge tools, servers and steering in declaration order.
pub fn resolve_collisions(
    contributions: &[ModuleContribution],
) -> Result<MergedResources, Vec<PolicyError>> {
    let origins: Vec<&str> = contributions.iter().map(|c| c.reference.origin()).collect();
    let mut report = CollisionReport::default();
    let mut errors = Vec::new();

    let tools = merge_names(
        CollisionKind::Tool,
        &origins,
        contributions.iter().map(|c| {
            (
                c.tools.as_slice(),
                c.reference.exclude_tools.as_slice(),
                &c.reference.tool_aliases,
            )
        }),
        &mut report,
        &mut errors,
    );
    let servers = merge_names(
        CollisionKind::Server,
        &origins,
        contributions
            .iter()
            .map(|c| (c.servers.as_slice(), NO_EXCLUSIONS, &c.reference.server_aliases)),
        &mut report,
        &mut errors,
    );
    let steering = merge_steering(contributions, &origins, &mut report);

    if !errors.is_empty() {
        return Err(errors);
    }

    debug!(
        modules = contributions.len(),
        tools = tools.len(),
        servers = servers.len(),
        sections = steering.len(),
        collisions = report.len(),
        "merged module resources"
    );

    Ok(MergedResources {
        tools,
        servers,
        steering,
        collisions: report,
    })
}

fn merge_names<'a>(
    kind: CollisionKind,
    origins: &[&str],
    declared: impl Iterator<Item = (&'a [String], &'a [String], &'a BTreeMap<String, String>)>,
    report: &mut CollisionReport,
    errors: &mut Vec<PolicyError>,
) -> Vec<MergedName> {
    // Raw name -> occurrences, in first-seen order.
    let mut raw_order: Vec<String> = Vec::new();
    let mut by_raw: HashMap<String, Vec<Occurrence>> = HashMap::new();

    for (origin_idx, (names, excluded, aliases)) in declared.enumerate() {
        for raw in names {
            let seen = by_raw.entry(raw.clone()).or_insert_with(|| {
                raw_order.push(raw.clone());
                Vec::new()
            });
            if seen.iter().any(|o| o.origin_idx == origin_idx) {
                continue;
            }
            let placement = if excluded.contains(raw) {
                Placement::Excluded
            } else {
                match aliases.get(raw) {
                    Some(alias) => Placement::Kept {
                        final_name: alias.clone(),
                        aliased: true,
                    },
                    None => Placement::Kept {
                        final_name: raw.clone(),
                        aliased: false,
                    },
                }
            };
            seen.push(Occurrence {
                origin_idx,
                placement,
            });
        }
    }

    // Final name -> contributing origins, and the merged list in order.
    let mut merged: Vec<MergedName> = Vec::new();
    let mut owners: HashMap<String, Vec<usize>> = HashMap::new();
    let mut origin_order: Vec<(usize, &String, &Occurrence)> = raw_order
        .iter()
        .flat_map(|raw| by_raw[raw].iter().map(move |o| (o.origin_idx, raw, o)))
        .collect();
    origin_order.sort_by_key(|(origin_idx, _, _)| *origin_idx);

    for (origin_idx, raw, occurrence) in origin_order {
        let Placement::Kept {
            final_name,
            aliased,
        } = &occurrence.placement
        else {
            continue;
        };
        let holders = owners.entry(final_name.clone()).or_default();
        if holders.contains(&origin_idx) {
            continue;
        }
        if let Some(&first) = holders.first() {
            errors.push(PolicyError::UnresolvedCollision {
                kind,
                name: final_name.clone(),
                first: origins[first].to_string(),
                second: origins[origin_idx].to_string(),
                suggestion: suggestion(kind, final_name, origins[origin_idx]),
            });
        } else {
            merged.push(MergedName {
                name: final_name.clone(),
                origin: origins[origin_idx].to_string(),
                aliased_from: aliased.then(|| raw.clone()),
            });
        }
        holders.push(origin_idx);
    }

    // Raw clashes the directives resolved.
    for raw in &raw_order {
        let occurrences = &by_raw[raw];
        if occurrences.len() < 2 {
            continue;
        }
        let still_clashing = occurrences.iter().any(|o| match &o.placement {
            Placement::Kept { final_name, .. } => {
                owners.get(final_name).is_some_and(|h| h.len() > 1)
            }
            Placement::Excluded => false,
        });
        if still_clashing {
            continue;
        }

        let resolution = if occurrences
            .iter()
            .any(|o| matches!(o.placement, Placement::Excluded))
        {
            CollisionResolution::Excluded
        } else {
            CollisionResolution::Aliased
        };
        let final_state = occurrences
            .iter()
            .map(|o| {
                let origin = origins[o.origin_idx];
                match &o.placement {
                    Placement::Excluded => format!("{raw} excluded ({origin})"),
                    Placement::Kept {
                        final_name,
                        aliased: true,
                    } => format!("{raw} -> {final_name} ({origin})"),
                    Placement::Kept { .. } => format!("{raw} ({origin})"),
                }
            })
            .collect::<Vec<_>>()
            .join("; ");

        debug!(kind = %kind, name = %raw, ?resolution, "collision resolved by directive");
        report.push(
            kind,
            CollisionRecord {
                name: raw.clone(),
                origins: occurrences
                    .iter()
                    .map(|o| origins[o.origin_idx].to_string())
                    .collect(),
                resolution,
                final_state,
                warning: None,
            },
        );
    }

    merged
}

fn suggestion(kind: CollisionKind, name: &str, origin: &str) -> String {
    match kind {
        CollisionKind::Tool => format!(
            "add `exclude_tools: [{name}]` or `tool_aliases: {{{name}: <new-name>}}` to the reference for '{origin}'"
        ),
        CollisionKind::Server | CollisionKind::Steering => format!(
            "add `server_aliases: {{{name}: <new-name>}}` to the reference for '{origin}'"
        ),
    }
}

fn merge_steering(
    contributions: &[ModuleContribution],
    origins: &[&str],
    report: &mut CollisionReport,
) -> Vec<MergedSection> {
    struct Slot {
        section: MergedSection,
        providers: Vec<usize>,
        excluders: Vec<usize>,
    }

    let mut slots: Vec<Slot> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (origin_idx, contribution) in contributions.iter().enumerate() {
        let excluded = &contribution.reference.exclude_steering_sections;
        for section in &contribution.steering {
            let slot_idx = *index.entry(section.heading.clone()).or_insert_with(|| {
                slots.push(Slot {
                    section: MergedSection {
                        heading: section.heading.clone(),
                        content: String::new(),
                        origin: String::new(),
                    },
                    providers: Vec::new(),
                    excluders: Vec::new(),
                });
                slots.len() - 1
            });
            let slot = &mut slots[slot_idx];

            if excluded.iter().any(|h| h.trim() == section.heading.trim()) {
                if !slot.excluders.contains(&origin_idx) {
                    slot.excluders.push(origin_idx);
                }
                continue;
            }
            if slot.providers.contains(&origin_idx) {
                continue;
            }
            slot.providers.push(origin_idx);
            slot.section.content.clone_from(&section.content);
            slot.section.origin = origins[origin_idx].to_string();
        }
    }

    for slot in &slots {
        let heading = &slot.section.heading;
        if slot.providers.len() > 1 {
            let discarded: Vec<&str> = slot.providers[..slot.providers.len() - 1]
                .iter()
                .map(|&idx| origins[idx])
                .collect();
            let warning = format!(
                "steering section '{heading}' from {} replaced by '{}'",
                discarded
                    .iter()
                    .map(|o| format!("'{o}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
                slot.section.origin
            );
            warn!(heading = %heading, winner = %slot.section.origin, "{warning}");
            report.push(
                CollisionKind::Steering,
                CollisionRecord {
                    name: heading.clone(),
                    origins: slot.providers.iter().map(|&idx| origins[idx].to_string()).collect(),
                    resolution: CollisionResolution::LastWins,
                    final_state: format!("kept from '{}'", slot.section.origin),
                    warning: Some(warning),
                },
            );
        } else if !slot.excluders.is_empty() && slot.providers.len() + slot.excluders.len() > 1 {
            let mut involved: Vec<usize> = slot
                .providers
                .iter()
                .chain(&slot.excluders)
                .copied()
                .collect();
            involved.sort_unstable();
            let final_state = match slot.providers.first() {
                Some(&idx) => format!("kept from '{}'", origins[idx]),
                None => "dropped".to_string(),
            };
            report.push(
                CollisionKind::Steering,
                CollisionRecord {
                    name: heading.clone(),
                    origins: involved.iter().map(|&idx| origins[idx].to_string()).collect(),
                    resolution: CollisionResolution::Excluded,
                    final_state,
                    warning: None,
                },
            );
        }
    }

    slots
        .into_iter()
        .filter(|slot| !slot.providers.is_empty())
        .map(|slot| slot.section)
        .collect()
}
