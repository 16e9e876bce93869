//! Engine tests driven from request documents.

use powerforge::document::parse_request;
use powerforge::engine::{ResolveOptions, resolve, resolve_batch};
use powerforge::policy::ConflictPolicy;
use powerforge::report::{DelegationModeKind, NetworkReason};

const PLATFORM_REQUEST: &str = r"
agent:
  name: reviewer
  allowed_tools: [filesystem.read, network.*]
  requires_network: true
collection:
  name: platform
  allowed_tools: [filesystem.*, database.*]
  denied_tools: [network.external.*]
  requires_network: false
modules:
  - reference: powers/postgres
    tools: [query, migrate]
    steering: |
      # Style
      Prefer CTEs.
  - reference:
      path: powers/analytics
      tool_aliases: {query: api_query}
      exclude_steering_sections: [Style]
    tools: [query]
    steering: |
      # Style
      Use window functions.
      # Limits
      Cap result sets.
specialists: [analytics]
context:
  kind: collection
  collection: platform
  registry:
    - path: ./agents/analytics
      role: data analyst
delegation:
  subagent:
    name: analytics
    allowed_tools: [filesystem.*, database.query]
  security:
    elevations:
      - pattern: database.query
        justification: dashboards need read queries
        audit_level: high
";

#[test]
fn test_full_request_resolves() {
    let request = parse_request(PLATFORM_REQUEST).unwrap();
    let resolution = resolve(&request, &ResolveOptions::default()).unwrap();
    let report = &resolution.report;

    assert_eq!(report.final_allowed_tools, vec!["filesystem.read"]);
    assert!(!report.network_access.final_resolution);
    assert_eq!(
        report.network_access.resolution_reason,
        NetworkReason::CollectionPolicyWins
    );

    let tools: Vec<&str> = resolution
        .resources
        .tools
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(tools, vec!["query", "migrate", "api_query"]);
    let headings: Vec<&str> = resolution
        .resources
        .steering
        .iter()
        .map(|s| s.heading.as_str())
        .collect();
    assert_eq!(headings, vec!["Style", "Limits"]);
    assert_eq!(resolution.resources.steering[0].content, "Prefer CTEs.");

    assert_eq!(resolution.specialists.len(), 1);
    assert_eq!(resolution.specialists[0].path, "./agents/analytics");

    let delegation = report.delegation.as_ref().unwrap();
    assert_eq!(delegation.mode, DelegationModeKind::Elevated);
    assert_eq!(
        delegation.effective_allowed_tools,
        vec!["filesystem.read", "database.query"]
    );
    assert_eq!(delegation.audit_trail.len(), 1);
}

#[test]
fn test_report_json_contract() {
    let request = parse_request(PLATFORM_REQUEST).unwrap();
    let resolution = resolve(&request, &ResolveOptions::default()).unwrap();
    let json = serde_json::to_value(&resolution.report).unwrap();

    for key in [
        "final_allowed_tools",
        "final_denied_tools",
        "network_access",
        "collisions",
        "delegation",
        "opt_out",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["delegation"]["mode"], "elevated");
    assert_eq!(json["delegation"]["elevations"][0]["audit_level"], "high");
    assert_eq!(
        json["collisions"]["tool_collisions"][0]["resolution"],
        "aliased"
    );
}

#[test]
fn test_delegation_config_errors_surface() {
    let mut request = parse_request(PLATFORM_REQUEST).unwrap();
    let security = &mut request.delegation.as_mut().unwrap().security;
    security.elevations[0].pattern = "*".into();
    security.audit_trail = Some(false);

    let errors = resolve(&request, &ResolveOptions::default()).unwrap_err();
    assert!(errors.contains("overly_broad_elevation"));
    assert!(errors.contains("audit_trail_required"));
}

#[test]
fn test_conflict_policy_is_configurable() {
    let request = parse_request(PLATFORM_REQUEST).unwrap();

    let strict = ResolveOptions {
        conflict_policy: ConflictPolicy::Error,
        ..ResolveOptions::default()
    };
    assert!(
        resolve(&request, &strict)
            .unwrap_err()
            .contains("constraint_conflict")
    );

    let quiet = ResolveOptions {
        conflict_policy: ConflictPolicy::Ignore,
        ..ResolveOptions::default()
    };
    let resolution = resolve(&request, &quiet).unwrap();
    assert!(
        resolution
            .findings
            .iter()
            .all(|f| f.rule_id != "collection-conflict")
    );
}

#[test]
fn test_batch_matches_sequential() {
    let base = parse_request(PLATFORM_REQUEST).unwrap();
    let requests: Vec<_> = (0..16)
        .map(|i| {
            let mut request = base.clone();
            request.agent.name = format!("agent-{i}");
            if i % 5 == 0 {
                request.agent.allowed_tools.push("bad..pattern".into());
            }
            request
        })
        .collect();

    let options = ResolveOptions::default();
    let parallel = resolve_batch(&requests, &options);
    let sequential: Vec<_> = requests.iter().map(|r| resolve(r, &options)).collect();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.iter().filter(|r| r.is_err()).count(), 4);
    assert_eq!(parallel[1].as_ref().unwrap().agent, "agent-1");
}
