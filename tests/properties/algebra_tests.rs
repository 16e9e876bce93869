use proptest::prelude::*;

use powerforge::policy::{CapabilityPattern, intersect, matches};

use super::strategies::{constraint_set, identifier, pattern};

proptest! {
    #[test]
    fn test_exact_pattern_matches_itself(id in identifier()) {
        let pattern = CapabilityPattern::parse(&id).unwrap();
        prop_assert!(matches(&pattern, &id));
    }

    #[test]
    fn test_wildcard_covers_prefix_and_descendants(prefix in identifier(), rest in identifier()) {
        let wildcard = CapabilityPattern::parse(&format!("{prefix}.*")).unwrap();
        prop_assert!(wildcard.matches(&prefix));
        let child = format!("{prefix}.{rest}");
        prop_assert!(wildcard.matches(&child));
    }

    #[test]
    fn test_wildcard_does_not_match_token_prefix(id in identifier()) {
        let wildcard = CapabilityPattern::parse(&format!("{id}.*")).unwrap();
        let extended = format!("{id}x");
        prop_assert!(!wildcard.matches(&extended));
    }

    #[test]
    fn test_subsumption_implies_matching(a in pattern(), b in pattern(), id in identifier()) {
        if a.subsumes(&b) && b.matches(&id) {
            prop_assert!(a.matches(&id));
        }
    }

    #[test]
    fn test_parse_display_roundtrip(p in pattern()) {
        let reparsed = CapabilityPattern::parse(&p.to_string()).unwrap();
        prop_assert_eq!(reparsed, p);
    }

    #[test]
    fn test_parse_never_panics(raw in ".{0,40}") {
        let _ = CapabilityPattern::parse(&raw);
    }

    #[test]
    fn test_intersection_never_exceeds_either_side(
        a in constraint_set(),
        b in constraint_set(),
        id in identifier(),
    ) {
        let effective = intersect(&a, &b);
        if effective.permits(&id) {
            prop_assert!(a.permits(&id), "{id} permitted by intersection but not by a");
            prop_assert!(b.permits(&id), "{id} permitted by intersection but not by b");
        }
    }

    #[test]
    fn test_denial_dominates(a in constraint_set(), b in constraint_set(), id in identifier()) {
        let effective = intersect(&a, &b);
        if a.denied_under(&id) || b.denied_under(&id) {
            prop_assert!(!effective.permits(&id));
        }
    }

    #[test]
    fn test_intersection_is_commutative_on_permits(
        a in constraint_set(),
        b in constraint_set(),
        id in identifier(),
    ) {
        prop_assert_eq!(intersect(&a, &b).permits(&id), intersect(&b, &a).permits(&id));
    }
}
