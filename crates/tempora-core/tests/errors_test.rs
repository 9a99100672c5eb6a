use tempora_core::errors::*;

#[test]
fn compile_error_cycle_carries_path() {
    let err = CompileError::CyclicDependency {
        cycle: "a -> b -> a".into(),
    };
    assert!(err.to_string().contains("a -> b -> a"));
    assert_eq!(err.error_code(), "CYCLIC_DEPENDENCY");
}

#[test]
fn query_error_converts_from_subsystems() {
    let err: QueryError = ResultHandlerError::Processing {
        key_id: "k1".into(),
        message: "disk full".into(),
    }
    .into();
    assert!(matches!(err, QueryError::ResultHandler(_)));
    assert_eq!(err.error_code(), "RESULT_HANDLER_ERROR");
    assert!(err.coded_string().starts_with("[RESULT_HANDLER_ERROR]"));
}

#[test]
fn finder_error_lists_every_cause() {
    let err = QueryError::Finder {
        query_id: "q1".into(),
        errors: vec![
            QueryError::Cancelled,
            CloseError::Failed {
                resource: "iterator 0".into(),
                message: "boom".into(),
                failed: 1,
                total: 2,
            }
            .into(),
        ],
    };
    let msg = err.to_string();
    assert!(msg.contains("q1"));
    assert!(msg.contains("2 error(s)"));
    assert!(msg.contains("boom"));
    assert_eq!(err.causes().len(), 2);
    assert_eq!(err.error_code(), "FINDER_ERROR");
}

#[test]
fn nested_codes_pass_through() {
    let err: QueryError = CompileError::from(KnowledgeSourceReadError::Backend {
        id: "bp".into(),
        message: "timeout".into(),
    })
    .into();
    assert_eq!(err.error_code(), "KNOWLEDGE_SOURCE_READ_ERROR");
}

#[test]
fn execution_error_keeps_algorithm_source() {
    let err = ExecutionError::Algorithm {
        definition_id: "bp-high".into(),
        algorithm_id: "valueThreshold".into(),
        source: AlgorithmError::NonNumeric {
            proposition_id: "bp".into(),
        },
    };
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("valueThreshold"));
}

#[test]
fn partial_result_collects_errors() {
    let mut result = PartialResult::new(3usize);
    assert!(result.is_clean());
    result.add_error(QueryError::Cancelled);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.data, 3);
}
