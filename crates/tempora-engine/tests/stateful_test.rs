use std::collections::BTreeSet;
use std::sync::Arc;

use tempora_core::config::EngineConfig;
use tempora_core::definitions::{PropositionDefinition, RawDefinition, SliceDefinition, TemporalExtendedPropositionDefinition};
use tempora_core::errors::ExecutionError;
use tempora_core::sources::InMemoryKnowledgeSource;
use tempora_core::traits::KeyValueStore;
use tempora_engine::engine::{KeyResult, SessionSnapshot};
use tempora_engine::{
    builtin_algorithm_source, AbstractionCompiler, DerivationSnapshot, ExecutionStrategy,
    StatefulExecution, StatefulStores,
};
use tempora_core::proposition::Proposition;
use tempora_storage::InMemoryStore;
use test_fixtures::{definite, deleted, event, hours, primitive};

fn stores() -> StatefulStores {
    StatefulStores {
        propositions: Arc::new(InMemoryStore::<Vec<Proposition>>::new("propositions")),
        sessions: Arc::new(InMemoryStore::<SessionSnapshot>::new("sessions")),
        derivations: Arc::new(InMemoryStore::<DerivationSnapshot>::new("derivations")),
    }
}

fn stateful(knowledge: &InMemoryKnowledgeSource, ids: &[&str], stores: StatefulStores) -> StatefulExecution {
    let algorithms = builtin_algorithm_source();
    let requested: BTreeSet<String> = ids.iter().map(|s| s.to_string()).collect();
    let rules = AbstractionCompiler::new(knowledge, &algorithms)
        .compile(&requested)
        .unwrap();
    StatefulExecution::new(Arc::new(rules), EngineConfig::default(), stores)
}

fn high_intervals(result: &KeyResult) -> Vec<tempora_core::temporal::Interval> {
    result
        .of_type("systolic-high")
        .filter_map(|p| p.interval().copied())
        .collect()
}

#[test]
fn later_batches_extend_earlier_abstractions() {
    let knowledge = test_fixtures::systolic_knowledge();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores());

    let first = execution
        .execute("p1", vec![primitive("systolic", "s1", hours(1), 150.0)])
        .unwrap();
    assert_eq!(high_intervals(&first), vec![definite(hours(1), hours(1))]);

    let second = execution
        .execute("p1", vec![primitive("systolic", "s2", hours(2), 155.0)])
        .unwrap();
    assert_eq!(high_intervals(&second), vec![definite(hours(1), hours(2))]);
    let merged = second.of_type("systolic-high").next().unwrap();
    assert_eq!(second.derived_from(&merged.unique_id).len(), 2);
}

#[test]
fn updating_a_source_retracts_its_abstraction() {
    let knowledge = test_fixtures::systolic_knowledge();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores());
    let first = execution
        .execute(
            "p1",
            vec![
                primitive("systolic", "s1", hours(1), 150.0),
                primitive("systolic", "s2", hours(4), 150.0),
            ],
        )
        .unwrap();
    assert_eq!(high_intervals(&first), vec![definite(hours(1), hours(4))]);

    let second = execution
        .execute("p1", vec![primitive("systolic", "s1", hours(1), 100.0)])
        .unwrap();
    assert_eq!(high_intervals(&second), vec![definite(hours(4), hours(4))]);
    let remaining = second.of_type("systolic-high").next().unwrap();
    let sources = second.derived_from(&remaining.unique_id);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].unique_id.local_id, "s2");
}

#[test]
fn keys_are_isolated() {
    let knowledge = test_fixtures::systolic_knowledge();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores());
    execution
        .execute("p1", vec![primitive("systolic", "a", hours(1), 150.0)])
        .unwrap();
    let other = execution
        .execute("p2", vec![primitive("systolic", "b", hours(2), 150.0)])
        .unwrap();
    assert_eq!(high_intervals(&other), vec![definite(hours(2), hours(2))]);
    assert_eq!(execution.persisted_keys().unwrap(), vec!["p1", "p2"]);
}

#[test]
fn deleting_a_source_keeps_the_derived_fact() {
    let knowledge = test_fixtures::systolic_knowledge();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores());
    let s1 = primitive("systolic", "s1", hours(1), 150.0);
    execution.execute("p1", vec![s1.clone()]).unwrap();

    let after = execution.execute("p1", vec![deleted(&s1)]).unwrap();
    assert_eq!(high_intervals(&after), vec![definite(hours(1), hours(1))]);
    let high = after.of_type("systolic-high").next().unwrap();
    let sources = after.derived_from(&high.unique_id);
    assert_eq!(sources.len(), 1);
    assert!(sources[0].is_deleted());
    assert_eq!(after.to_delete.len(), 1);
}

#[test]
fn reprocess_rebuilds_from_raw_facts() {
    let knowledge = test_fixtures::systolic_knowledge();
    let stores = stores();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores.clone());
    let s1 = primitive("systolic", "s1", hours(1), 150.0);
    execution
        .execute(
            "p1",
            vec![s1.clone(), primitive("systolic", "s2", hours(3), 150.0)],
        )
        .unwrap();
    execution.execute("p1", vec![deleted(&s1)]).unwrap();

    let raw = stores.propositions.get("p1").unwrap().unwrap();
    assert_eq!(raw.len(), 1);

    let rebuilt = execution.reprocess("p1").unwrap().unwrap();
    assert_eq!(high_intervals(&rebuilt), vec![definite(hours(3), hours(3))]);
    assert!(execution.reprocess("unknown").unwrap().is_none());

    let all = execution.reprocess_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].key_id, "p1");
}

#[test]
fn slices_reconcile_when_earlier_instances_arrive() {
    let knowledge = InMemoryKnowledgeSource::new()
        .with_definition(PropositionDefinition::Event(RawDefinition::new("dose")))
        .with_definition(SliceDefinition::new(
            "first-dose",
            TemporalExtendedPropositionDefinition::new("dose"),
            0,
            Some(1),
        ));
    let mut execution = stateful(&knowledge, &["first-dose"], stores());
    let first = execution
        .execute("p1", vec![event("dose", "d2", hours(2), hours(2))])
        .unwrap();
    let first_intervals: Vec<_> = first.propositions.iter().map(|p| *p.interval().unwrap()).collect();
    assert_eq!(first_intervals, vec![definite(hours(2), hours(2))]);

    let second = execution
        .execute("p1", vec![event("dose", "d1", hours(1), hours(1))])
        .unwrap();
    let second_intervals: Vec<_> = second.propositions.iter().map(|p| *p.interval().unwrap()).collect();
    assert_eq!(second_intervals, vec![definite(hours(1), hours(1))]);
}

#[test]
fn session_without_derivations_is_corrupt() {
    let knowledge = test_fixtures::systolic_knowledge();
    let stores = stores();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores.clone());
    execution
        .execute("p1", vec![primitive("systolic", "s1", hours(1), 150.0)])
        .unwrap();
    stores.derivations.remove("p1").unwrap();

    let err = execution
        .execute("p1", vec![primitive("systolic", "s2", hours(2), 150.0)])
        .unwrap_err();
    assert!(matches!(err, ExecutionError::CorruptState { .. }));
}

#[test]
fn closed_stores_surface_as_execution_errors() {
    let knowledge = test_fixtures::systolic_knowledge();
    let stores = stores();
    let mut execution = stateful(&knowledge, &["systolic-high"], stores.clone());
    stores.sessions.shutdown().unwrap();
    let err = execution
        .execute("p1", vec![primitive("systolic", "s1", hours(1), 150.0)])
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Store(_)));
}
