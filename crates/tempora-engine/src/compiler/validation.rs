//! Structural checks run on every definition before rules are built.

use std::sync::Arc;

use tempora_core::definitions::{
    ContextDefinition, ContextKind, HighLevelAbstractionDefinition, LowLevelAbstractionDefinition,
    PropositionDefinition, RelationSpec, SliceDefinition, TemporalExtendedPropositionDefinition,
    WindowSizing,
};
use tempora_core::errors::CompileError;
use tempora_core::traits::{Algorithm, AlgorithmSource};

use super::closure::Closure;

fn invalid(definition_id: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidDefinition {
        definition_id: definition_id.to_string(),
        reason: reason.into(),
    }
}

/// Check descriptor indices and reject indistinguishable descriptors.
///
/// Two identical descriptors are ambiguous unless some constrained relation links them,
/// since otherwise every match would also match with the two instances swapped.
pub fn validate_pattern(
    definition_id: &str,
    extended: &[TemporalExtendedPropositionDefinition],
    relations: &[RelationSpec],
) -> Result<(), CompileError> {
    if extended.is_empty() {
        return Err(invalid(definition_id, "pattern has no descriptors"));
    }
    for spec in relations {
        if spec.lhs >= extended.len() || spec.rhs >= extended.len() {
            return Err(invalid(
                definition_id,
                format!(
                    "relation references descriptor {} or {} of {}",
                    spec.lhs,
                    spec.rhs,
                    extended.len()
                ),
            ));
        }
        if spec.lhs == spec.rhs {
            return Err(invalid(
                definition_id,
                format!("relation links descriptor {} with itself", spec.lhs),
            ));
        }
    }
    for first in 0..extended.len() {
        for second in first + 1..extended.len() {
            if extended[first] != extended[second] {
                continue;
            }
            let linked = relations.iter().any(|spec| {
                ((spec.lhs == first && spec.rhs == second)
                    || (spec.lhs == second && spec.rhs == first))
                    && !spec.relation.is_unconstrained()
            });
            if !linked {
                return Err(CompileError::AmbiguousDescriptors {
                    definition_id: definition_id.to_string(),
                    first,
                    second,
                });
            }
        }
    }
    Ok(())
}

pub fn validate_high_level(definition: &HighLevelAbstractionDefinition) -> Result<(), CompileError> {
    validate_pattern(&definition.id, &definition.extended, &definition.relations)?;
    if let Some(offset) = &definition.offset {
        let len = definition.extended.len();
        if offset.start_index >= len || offset.finish_index >= len {
            return Err(invalid(&definition.id, "offset references a missing descriptor"));
        }
    }
    Ok(())
}

/// Returns the resolved algorithm.
pub fn validate_low_level(
    definition: &LowLevelAbstractionDefinition,
    closure: &Closure,
    algorithms: &dyn AlgorithmSource,
) -> Result<Arc<dyn Algorithm>, CompileError> {
    if definition.abstracted_from.is_empty() {
        return Err(invalid(&definition.id, "abstracted from nothing"));
    }
    for source in &definition.abstracted_from {
        match closure.get(source) {
            Some(PropositionDefinition::Primitive(_)) => {}
            Some(other) => {
                return Err(invalid(
                    &definition.id,
                    format!("{source} is a {} definition, not a primitive parameter", other.kind_name()),
                ))
            }
            None => return Err(CompileError::UnknownProposition { id: source.clone() }),
        }
    }
    let algorithm = algorithms
        .read_algorithm(&definition.algorithm_id)?
        .ok_or_else(|| CompileError::UnknownAlgorithm {
            definition_id: definition.id.clone(),
            algorithm_id: definition.algorithm_id.clone(),
        })?;
    if definition.values.is_empty() {
        return Err(invalid(&definition.id, "no value definitions"));
    }
    for value in &definition.values {
        for parameter in algorithm.parameters().iter().filter(|p| p.required) {
            if !value.arguments.contains_key(&parameter.name) {
                return Err(CompileError::MissingArgument {
                    definition_id: definition.id.clone(),
                    parameter: parameter.name.clone(),
                });
            }
        }
    }
    if let WindowSizing::Explicit { min, max } = definition.window {
        if min == 0 || min > max {
            return Err(invalid(
                &definition.id,
                format!("window must satisfy 1 <= min <= max, got [{min}, {max}]"),
            ));
        }
    }
    Ok(algorithm)
}

pub fn validate_slice(definition: &SliceDefinition) -> Result<(), CompileError> {
    if let Some(max) = definition.max_index {
        let same_sign = (definition.min_index >= 0) == (max >= 0);
        if same_sign && definition.min_index >= max {
            return Err(invalid(
                &definition.id,
                format!("min_index {} must be below max_index {max}", definition.min_index),
            ));
        }
    }
    Ok(())
}

pub fn validate_context(definition: &ContextDefinition, closure: &Closure) -> Result<(), CompileError> {
    if let ContextKind::Composite { sub_contexts } = &definition.kind {
        if sub_contexts.is_empty() {
            return Err(invalid(&definition.id, "composite context without sub-contexts"));
        }
        for sub in sub_contexts {
            match closure.get(sub) {
                Some(PropositionDefinition::Context(_)) => {}
                Some(other) => {
                    return Err(invalid(
                        &definition.id,
                        format!("sub-context {sub} is a {} definition", other.kind_name()),
                    ))
                }
                None => return Err(CompileError::UnknownProposition { id: sub.clone() }),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::temporal::AllenRelation;

    fn tepd(id: &str) -> TemporalExtendedPropositionDefinition {
        TemporalExtendedPropositionDefinition::new(id)
    }

    #[test]
    fn identical_unlinked_descriptors_are_ambiguous() {
        let def = HighLevelAbstractionDefinition::new("h")
            .with_extended(tepd("a"))
            .with_extended(tepd("a"));
        assert!(matches!(
            validate_high_level(&def),
            Err(CompileError::AmbiguousDescriptors { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn ordering_relation_disambiguates() {
        let def = HighLevelAbstractionDefinition::new("h")
            .with_extended(tepd("a"))
            .with_extended(tepd("a"))
            .with_relation(0, 1, AllenRelation::Before);
        assert!(validate_high_level(&def).is_ok());
    }

    #[test]
    fn out_of_range_relation_is_invalid() {
        let def = HighLevelAbstractionDefinition::new("h")
            .with_extended(tepd("a"))
            .with_relation(0, 3, AllenRelation::Before);
        assert!(matches!(
            validate_high_level(&def),
            Err(CompileError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn slice_bounds_must_be_ordered() {
        assert!(validate_slice(&SliceDefinition::new("s", tepd("a"), 2, Some(1))).is_err());
        assert!(validate_slice(&SliceDefinition::new("s", tepd("a"), -1, Some(-2))).is_err());
        assert!(validate_slice(&SliceDefinition::new("s", tepd("a"), 1, Some(-1))).is_ok());
        assert!(validate_slice(&SliceDefinition::new("s", tepd("a"), -2, None)).is_ok());
    }
}
