use proptest::prelude::*;

use powerforge::policy::{
    AuditLevel, CapabilityPattern, DelegationSecurityConfig, Elevation, resolve_delegation,
};

use super::strategies::{constraint_set, identifier, scoped_pattern};

proptest! {
    #[test]
    fn test_intersection_mode_never_exceeds_delegator(
        delegator in constraint_set(),
        subagent in constraint_set(),
        id in identifier(),
    ) {
        let outcome = resolve_delegation(
            &delegator,
            &subagent,
            "helper",
            &DelegationSecurityConfig::intersection(),
        )
        .unwrap();
        if outcome.effective.permits(&id) {
            prop_assert!(delegator.permits(&id));
        }
        prop_assert!(outcome.report.audit_trail.is_empty());
    }

    #[test]
    fn test_elevation_grants_only_listed_patterns(
        delegator in constraint_set(),
        subagent in constraint_set(),
        elevated in scoped_pattern(),
        id in identifier(),
    ) {
        let config = DelegationSecurityConfig::elevated(vec![Elevation {
            pattern: elevated.clone(),
            justification: "reviewed".into(),
            audit_level: AuditLevel::High,
        }]);
        let outcome = resolve_delegation(&delegator, &subagent, "helper", &config).unwrap();
        if outcome.effective.permits(&id) {
            prop_assert!(delegator.permits(&id) || elevated.matches(&id));
        }
        prop_assert_eq!(outcome.report.audit_trail.len(), 1);
    }

    #[test]
    fn test_blank_justification_is_rejected(
        delegator in constraint_set(),
        subagent in constraint_set(),
        blank in "[ \t\n]{0,4}",
    ) {
        let full = DelegationSecurityConfig::full_delegation(blank.clone());
        prop_assert!(resolve_delegation(&delegator, &subagent, "helper", &full).is_err());

        let elevated = DelegationSecurityConfig::elevated(vec![Elevation {
            pattern: CapabilityPattern::parse("db.write").unwrap(),
            justification: blank,
            audit_level: AuditLevel::Low,
        }]);
        let errors = resolve_delegation(&delegator, &subagent, "helper", &elevated).unwrap_err();
        prop_assert!(errors.iter().any(|e| e.code() == "missing_justification"));
    }

    #[test]
    fn test_universal_elevation_is_rejected(
        delegator in constraint_set(),
        subagent in constraint_set(),
    ) {
        let config = DelegationSecurityConfig::elevated(vec![Elevation {
            pattern: CapabilityPattern::parse("*").unwrap(),
            justification: "everything".into(),
            audit_level: AuditLevel::High,
        }]);
        let errors = resolve_delegation(&delegator, &subagent, "helper", &config).unwrap_err();
        prop_assert!(errors.iter().any(|e| e.code() == "overly_broad_elevation"));
    }
}
