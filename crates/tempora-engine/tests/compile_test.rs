use std::collections::BTreeSet;

use tempora_core::constants::{SALIENCE_COMBINE, SALIENCE_DELETE, SALIENCE_DERIVE};
use tempora_core::definitions::{
    HighLevelAbstractionDefinition, LowLevelAbstractionDefinition, LowLevelValueDefinition,
    PropositionDefinition, RawDefinition, TemporalExtendedPropositionDefinition,
};
use tempora_core::errors::CompileError;
use tempora_core::sources::InMemoryKnowledgeSource;
use tempora_core::temporal::{Distance, Relation};
use tempora_engine::{builtin_algorithm_source, AbstractionCompiler, CompiledRuleSet};

fn compile(
    knowledge: &InMemoryKnowledgeSource,
    ids: &[&str],
) -> Result<CompiledRuleSet, CompileError> {
    let algorithms = builtin_algorithm_source();
    let requested: BTreeSet<String> = ids.iter().map(|s| s.to_string()).collect();
    AbstractionCompiler::new(knowledge, &algorithms).compile(&requested)
}

fn tepd(id: &str) -> TemporalExtendedPropositionDefinition {
    TemporalExtendedPropositionDefinition::new(id)
}

#[test]
fn fixture_knowledge_compiles_in_dependency_order() {
    let knowledge = test_fixtures::load_knowledge("knowledge/hypertension.json");
    let rules = compile(&knowledge, &["uncontrolled-hypertension"]).unwrap();

    assert_eq!(
        rules.topological_order(),
        ["systolic-high", "uncontrolled-hypertension"]
    );
    assert_eq!(
        rules.raw_proposition_ids(),
        &BTreeSet::from(["antihypertensive".to_string(), "systolic".to_string()])
    );
    assert_eq!(
        rules.output_ids(),
        &BTreeSet::from(["uncontrolled-hypertension".to_string()])
    );

    let delete = rules.rule(rules.delete_rule());
    assert_eq!(delete.salience, SALIENCE_DELETE);
    let combine = rules
        .rules()
        .iter()
        .find(|r| r.id == "systolic-high:combine")
        .unwrap();
    assert_eq!(combine.salience, SALIENCE_COMBINE);
    let pattern = rules
        .rules()
        .iter()
        .find(|r| r.id == "uncontrolled-hypertension:derive")
        .unwrap();
    assert_eq!(pattern.salience, SALIENCE_DERIVE);
    assert!(combine.topo_rank < pattern.topo_rank);
}

#[test]
fn rules_are_indexed_by_input() {
    let knowledge = test_fixtures::load_knowledge("knowledge/hypertension.json");
    let rules = compile(&knowledge, &["uncontrolled-hypertension"]).unwrap();
    let consumers: Vec<&str> = rules
        .rules_consuming("systolic-high")
        .iter()
        .map(|&i| rules.rule(i).id.as_str())
        .collect();
    assert!(consumers.contains(&"systolic-high:combine"));
    assert!(consumers.iter().any(|id| id.starts_with("uncontrolled-hypertension")));
    assert!(rules.rules_consuming("unrelated").is_empty());
}

#[test]
fn cyclic_abstractions_are_rejected() {
    let knowledge = InMemoryKnowledgeSource::new()
        .with_definition(HighLevelAbstractionDefinition::new("a").with_extended(tepd("b")))
        .with_definition(HighLevelAbstractionDefinition::new("b").with_extended(tepd("a")));
    match compile(&knowledge, &["a"]) {
        Err(CompileError::CyclicDependency { cycle }) => assert_eq!(cycle, "a -> b -> a"),
        other => panic!("expected a cycle error, got {:?}", other.map(|r| r.rules().len())),
    }
}

#[test]
fn unknown_proposition_is_rejected() {
    let knowledge = InMemoryKnowledgeSource::new()
        .with_definition(HighLevelAbstractionDefinition::new("a").with_extended(tepd("ghost")));
    assert!(matches!(
        compile(&knowledge, &["a"]),
        Err(CompileError::UnknownProposition { id }) if id == "ghost"
    ));
    assert!(matches!(
        compile(&knowledge, &["nothing"]),
        Err(CompileError::UnknownProposition { .. })
    ));
}

#[test]
fn identical_unrelated_descriptors_are_ambiguous() {
    let base = InMemoryKnowledgeSource::new()
        .with_definition(PropositionDefinition::Event(RawDefinition::new("dose")));
    let ambiguous = base.clone().with_definition(
        HighLevelAbstractionDefinition::new("two-doses")
            .with_extended(tepd("dose"))
            .with_extended(tepd("dose")),
    );
    assert!(matches!(
        compile(&ambiguous, &["two-doses"]),
        Err(CompileError::AmbiguousDescriptors { first: 0, second: 1, .. })
    ));

    let ordered = base.with_definition(
        HighLevelAbstractionDefinition::new("two-doses")
            .with_extended(tepd("dose"))
            .with_extended(tepd("dose"))
            .with_relation(0, 1, Relation::new().gap(Some(Distance::millis(1)), None)),
    );
    assert!(compile(&ordered, &["two-doses"]).is_ok());
}

#[test]
fn low_level_definitions_need_a_known_algorithm_and_arguments() {
    let base = InMemoryKnowledgeSource::new()
        .with_definition(PropositionDefinition::Primitive(RawDefinition::new("hr")));

    let unknown = base.clone().with_definition(
        LowLevelAbstractionDefinition::new("hr-odd", ["hr"], "oddness")
            .with_value(LowLevelValueDefinition::new("ODD")),
    );
    assert!(matches!(
        compile(&unknown, &["hr-odd"]),
        Err(CompileError::UnknownAlgorithm { algorithm_id, .. }) if algorithm_id == "oddness"
    ));

    let missing = base.with_definition(
        LowLevelAbstractionDefinition::new("hr-trend", ["hr"], "trend")
            .with_value(LowLevelValueDefinition::new("UP")),
    );
    assert!(matches!(
        compile(&missing, &["hr-trend"]),
        Err(CompileError::MissingArgument { parameter, .. }) if parameter == "direction"
    ));
}

#[test]
fn low_level_over_an_abstraction_is_invalid() {
    let knowledge = test_fixtures::systolic_knowledge().with_definition(
        LowLevelAbstractionDefinition::new("high-high", ["systolic-high"], "valueThreshold")
            .with_value(LowLevelValueDefinition::new("X").with_argument("minThreshold", 1.0)),
    );
    assert!(matches!(
        compile(&knowledge, &["high-high"]),
        Err(CompileError::InvalidDefinition { .. })
    ));
}

#[test]
fn inverse_is_a_children_feed_parent_consumers() {
    let knowledge = InMemoryKnowledgeSource::new()
        .with_definition(PropositionDefinition::Primitive(
            RawDefinition::new("bp").with_children(["sbp", "dbp"]),
        ))
        .with_definition(PropositionDefinition::Primitive(RawDefinition::new("sbp")))
        .with_definition(PropositionDefinition::Primitive(RawDefinition::new("dbp")))
        .with_definition(
            LowLevelAbstractionDefinition::new("bp-any", ["bp"], "valueThreshold")
                .with_value(LowLevelValueDefinition::new("ANY").with_argument("minThreshold", 0.0)),
        );
    let rules = compile(&knowledge, &["bp-any"]).unwrap();
    assert!(rules.raw_proposition_ids().contains("sbp"));
    assert!(rules.raw_proposition_ids().contains("dbp"));
    assert!(!rules.rules_consuming("sbp").is_empty());
}

#[test]
fn compilation_is_deterministic() {
    let knowledge = test_fixtures::load_knowledge("knowledge/hypertension.json");
    let first = compile(&knowledge, &["uncontrolled-hypertension", "systolic-high"]).unwrap();
    let second = compile(&knowledge, &["systolic-high", "uncontrolled-hypertension"]).unwrap();
    let ids = |rules: &CompiledRuleSet| -> Vec<String> {
        rules.rules().iter().map(|r| r.id.clone()).collect()
    };
    assert_eq!(ids(&first), ids(&second));
}
