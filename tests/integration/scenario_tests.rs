//! End-to-end resolver scenarios.

use powerforge::compose::{ModuleReference, resolve_collisions};
use powerforge::policy::{
    AgentPolicy, CollectionPolicy, ConflictPolicy, DelegationSecurityConfig, resolve_collection,
    resolve_delegation,
};
use powerforge::registry::{DEFAULT_SUGGESTION_THRESHOLD, resolve_specialist};
use powerforge::report::DelegationModeKind;
use powerforge::test_utils::fixtures::{constraint_set, contribution, standalone_context};
use powerforge::PolicyError;

#[test]
fn scenario_a_collection_narrows_agent() {
    let collection = CollectionPolicy {
        name: "platform".into(),
        constraints: constraint_set(&["filesystem.*", "database.*"], &["network.external.*"]),
        requires_network: None,
    };
    let agent = AgentPolicy {
        name: "reviewer".into(),
        constraints: constraint_set(&["filesystem.read", "network.*"], &[]),
        ..AgentPolicy::default()
    };

    let resolved = resolve_collection(&collection, &agent, ConflictPolicy::Warn).unwrap();
    assert_eq!(resolved.effective.allowed_strings(), vec!["filesystem.read"]);
    assert_eq!(resolved.effective.denied_strings(), vec!["network.external.*"]);
    assert_eq!(resolved.conflicts.len(), 1);
    assert_eq!(resolved.conflicts[0].to_string(), "network.*");
}

#[test]
fn scenario_b_intersection_delegation() {
    let delegator = constraint_set(&["filesystem.read"], &["network.*"]);
    let subagent = constraint_set(&["filesystem.*", "database.*", "network.internal"], &[]);

    let outcome = resolve_delegation(
        &delegator,
        &subagent,
        "db-helper",
        &DelegationSecurityConfig::intersection(),
    )
    .unwrap();

    assert_eq!(outcome.effective.allowed_strings(), vec!["filesystem.read"]);
    assert!(!outcome.effective.permits("database.query"));
    assert!(!outcome.effective.permits("network.internal"));
    assert_eq!(outcome.report.mode, DelegationModeKind::Intersection);
    assert!(outcome.report.audit_trail.is_empty());
}

#[test]
fn scenario_c_alias_resolves_tool_collision() {
    let first = contribution(ModuleReference::new("powers/postgres"), &["query"], "");
    let second = contribution(ModuleReference::new("powers/analytics"), &["query"], "");

    let errors = resolve_collisions(&[first.clone(), second.clone()]).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        PolicyError::UnresolvedCollision {
            name, first, second, ..
        } => {
            assert_eq!(name, "query");
            assert_eq!(first, "powers/postgres");
            assert_eq!(second, "powers/analytics");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let aliased = contribution(
        ModuleReference::new("powers/analytics").alias_tool("query", "api_query"),
        &["query"],
        "",
    );
    let merged = resolve_collisions(&[first, aliased]).unwrap();
    let names: Vec<&str> = merged.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["query", "api_query"]);
    assert_eq!(merged.collisions.tool_collisions.len(), 1);
}

#[test]
fn scenario_d_standalone_specialist_suggestion() {
    let context = standalone_context("agents/orchestrator", &[("database-specialist", true)]);

    let err =
        resolve_specialist("db_expert", &context, DEFAULT_SUGGESTION_THRESHOLD).unwrap_err();
    match &err {
        PolicyError::SpecialistNotFound { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("database-specialist"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("did you mean database-specialist"));
}

#[test]
fn steering_last_wins_is_deterministic() {
    let modules = [
        contribution(ModuleReference::new("a"), &[], "# Style\nfirst"),
        contribution(ModuleReference::new("b"), &[], "# Style\nsecond"),
        contribution(ModuleReference::new("c"), &[], "# Style\nthird"),
    ];
    for _ in 0..5 {
        let merged = resolve_collisions(&modules).unwrap();
        assert_eq!(merged.steering.len(), 1);
        assert_eq!(merged.steering[0].content, "third");
        assert_eq!(merged.steering[0].origin, "c");
    }
}
