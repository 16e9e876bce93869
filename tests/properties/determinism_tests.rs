use proptest::prelude::*;

use powerforge::compose::{ModuleContribution, ModuleReference, SteeringSection, resolve_collisions};
use powerforge::policy::intersect;

use super::strategies::{constraint_set, token};

fn module(idx: usize, tools: Vec<String>, headings: Vec<String>) -> ModuleContribution {
    ModuleContribution {
        reference: ModuleReference::new(format!("mods/m{idx}")),
        tools,
        servers: Vec::new(),
        steering: headings
            .into_iter()
            .map(|heading| SteeringSection::new(heading, format!("from m{idx}")))
            .collect(),
    }
}

fn modules() -> impl Strategy<Value = Vec<ModuleContribution>> {
    prop::collection::vec(
        (
            prop::collection::vec(token(), 0..3),
            prop::collection::vec(token(), 0..3),
        ),
        1..5,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(idx, (mut tools, mut headings))| {
                tools.dedup();
                headings.dedup();
                module(idx, tools, headings)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_intersection_is_deterministic(a in constraint_set(), b in constraint_set()) {
        prop_assert_eq!(intersect(&a, &b), intersect(&a, &b));
    }

    #[test]
    fn test_steering_last_wins_is_deterministic(contributions in modules()) {
        let first = resolve_collisions(&contributions);
        let second = resolve_collisions(&contributions);
        prop_assert_eq!(&first, &second);

        // Steering never fails on its own; when tools merge cleanly the last
        // contributor of each heading supplies its content.
        if let Ok(merged) = first {
            for section in &merged.steering {
                let last = contributions
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.steering.iter().any(|s| s.heading == section.heading))
                    .map(|(idx, _)| idx)
                    .max()
                    .unwrap();
                prop_assert_eq!(&section.content, &format!("from m{last}"));
            }
        }
    }
}
