//! Layout discovery against real directory trees.

use powerforge::engine::{ResolveOptions, resolve};
use powerforge::registry::{ResolutionContext, discover_context, resolve_specialist};
use powerforge::test_utils::fixtures::constraint_doc;
use powerforge::document::ResolutionRequest;

use super::fixture::TestFixture;

#[test]
fn test_standalone_agent_resolves_sibling() {
    let fixture = TestFixture::new("standalone_sibling");
    let me = fixture.agent("agents/orchestrator");
    fixture.agent("agents/database-specialist");
    fixture.dir("agents/docs");

    let context = discover_context(&me).unwrap();
    let resolved = resolve_specialist("database-specialist", &context, 0.6).unwrap();
    assert_eq!(resolved.module, "database-specialist");
    assert!(resolved.path.ends_with("agents/database-specialist"));

    let err = resolve_specialist("docs", &context, 0.6).unwrap_err();
    assert!(err.to_string().contains("available: database-specialist, docs"));
}

#[test]
fn test_collection_manifest_scopes_lookup() {
    let fixture = TestFixture::new("collection_scope");
    let me = fixture.agent("team/agents/lead");
    fixture.agent("team/agents/qa");
    fixture.agent("team/agents/unregistered");
    fixture.write(
        "team/collection.yaml",
        r"
meta:
  name: delivery
  description: ships things
agents:
  - path: ./agents/lead
    role: lead
    description: coordinates
  - path: ./agents/qa
    role: quality assurance
",
    );

    let context = discover_context(&me).unwrap();
    let ResolutionContext::Collection { collection, .. } = &context else {
        panic!("expected collection context, got {context:?}");
    };
    assert_eq!(collection, "delivery");

    assert_eq!(resolve_specialist("qa", &context, 0.6).unwrap().module, "qa");

    // Sibling on disk but not registered: collection scope wins.
    let err = resolve_specialist("unregistered", &context, 0.6).unwrap_err();
    assert!(err.to_string().contains("collection 'delivery'"));

    // Role text points at the registered module.
    let err = resolve_specialist("quality assurance", &context, 0.6).unwrap_err();
    assert!(err.to_string().contains("did you mean qa"));
}

#[test]
fn test_manifest_beyond_three_levels_is_ignored() {
    let fixture = TestFixture::new("deep_manifest");
    let me = fixture.agent("a/b/c/d/agent");
    fixture.write(
        "a/collection.yaml",
        "agents:\n  - path: ./b/c/d/agent\n",
    );
    assert!(matches!(
        discover_context(&me).unwrap(),
        ResolutionContext::Standalone { .. }
    ));
    assert!(fixture.path().join("a/collection.yaml").is_file());
}

#[test]
fn test_engine_with_discovered_context() {
    let fixture = TestFixture::new("engine_discovered");
    let me = fixture.agent("agents/orchestrator");
    fixture.agent("agents/database-specialist");

    let request = ResolutionRequest {
        agent: constraint_doc("orchestrator", &["filesystem.read"], &[]),
        specialists: vec!["db_expert".into()],
        context: Some(discover_context(&me).unwrap()),
        ..ResolutionRequest::default()
    };
    let errors = resolve(&request, &ResolveOptions::default()).unwrap_err();
    assert!(errors.contains("specialist_not_found"));
    assert!(errors.to_string().contains("did you mean database-specialist"));
}
