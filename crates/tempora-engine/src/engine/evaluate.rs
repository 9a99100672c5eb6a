//! Rule evaluation: the candidate firings a rule proposes over the current working memory.
//!
//! Evaluation never mutates state. Firing happens in the session.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tempora_core::definitions::{ContextOffset, PatternOffset, SliceDefinition};
use tempora_core::errors::ExecutionError;
use tempora_core::proposition::{Proposition, PropositionKind, UniqueId, Value};
use tempora_core::temporal::{GapFunction, Interval};

use super::agenda::{Candidate, DesiredOutput, Payload};
use super::working_memory::WorkingMemory;
use crate::compiler::{CompiledRule, Descriptor, LowLevelRule, PatternRule, RuleAction, Windowing};

/// Propositions in temporal order, ties broken by unique id. Constants sort first.
pub(crate) fn sort_temporal(propositions: &mut [Arc<Proposition>]) {
    propositions.sort_by(|a, b| {
        let by_time = match (a.interval(), b.interval()) {
            (Some(x), Some(y)) => x.temporal_cmp(y),
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_time.then_with(|| a.unique_id.cmp(&b.unique_id))
    });
}

fn recency_of(memory: &WorkingMemory, sources: &[UniqueId]) -> u64 {
    sources.iter().map(|uid| memory.recency(uid)).max().unwrap_or(0)
}

fn candidate(memory: &WorkingMemory, sources: Vec<UniqueId>, payload: Payload) -> Candidate {
    Candidate {
        recency: recency_of(memory, &sources),
        sources,
        payload,
    }
}

/// Evaluate `rule`. `current_outputs` holds the live outputs of a set-valued rule.
pub fn evaluate(
    rule: &CompiledRule,
    memory: &WorkingMemory,
    current_outputs: &[DesiredOutput],
) -> Result<Vec<Candidate>, ExecutionError> {
    match &rule.action {
        RuleAction::Delete => Ok(evaluate_delete(memory)),
        RuleAction::Combine { gap_function } => {
            Ok(evaluate_combine(&rule.definition_id, gap_function, memory))
        }
        RuleAction::LowLevel(low_level) => evaluate_low_level(rule, low_level, memory),
        RuleAction::Pattern(pattern) => evaluate_pattern(rule, pattern, memory),
        RuleAction::InducedContext { inducer, offset } => {
            Ok(evaluate_induced_context(inducer, offset, memory))
        }
        RuleAction::Slice {
            definition,
            component,
        } => {
            let desired = slice_outputs(definition, component, memory);
            Ok(reconcile(memory, desired, current_outputs))
        }
        RuleAction::CompositeContext { sub_contexts } => {
            let desired = composite_outputs(sub_contexts, memory);
            Ok(reconcile(memory, desired, current_outputs))
        }
    }
}

fn evaluate_delete(memory: &WorkingMemory) -> Vec<Candidate> {
    memory
        .pending_deletes()
        .map(|(marker, recency)| Candidate {
            sources: vec![marker.unique_id.clone()],
            recency,
            payload: Payload::Delete {
                marker: marker.unique_id.clone(),
            },
        })
        .collect()
}

/// Pairs of equal-valued instances that may be concatenated.
///
/// `a` must precede `b` in temporal order, the two must touch or satisfy the gap function,
/// and no differently valued instance may sit between them in that order.
fn evaluate_combine(
    definition_id: &str,
    gap_function: &GapFunction,
    memory: &WorkingMemory,
) -> Vec<Candidate> {
    let mut instances = memory.of_type(definition_id);
    instances.retain(|p| p.is_temporal());
    sort_temporal(&mut instances);

    let mut candidates = Vec::new();
    for i in 0..instances.len() {
        let a = &instances[i];
        let (Some(a_interval), a_value) = (a.interval(), a.value()) else {
            continue;
        };
        for j in i + 1..instances.len() {
            let b = &instances[j];
            if b.value() != a_value {
                // Everything after a differently valued instance is blocked.
                break;
            }
            let Some(b_interval) = b.interval() else {
                continue;
            };
            if !a_interval.precedes(b_interval) {
                continue;
            }
            if !a_interval.is_contiguous_with(b_interval)
                && !gap_function.execute(a_interval, b_interval)
            {
                continue;
            }
            candidates.push(candidate(
                memory,
                vec![a.unique_id.clone(), b.unique_id.clone()],
                Payload::Combine {
                    first: a.unique_id.clone(),
                    second: b.unique_id.clone(),
                },
            ));
        }
    }
    candidates
}

fn evaluate_low_level(
    rule: &CompiledRule,
    low_level: &LowLevelRule,
    memory: &WorkingMemory,
) -> Result<Vec<Candidate>, ExecutionError> {
    let mut sequence: Vec<Arc<Proposition>> = memory
        .of_types(&rule.inputs)
        .into_iter()
        .filter(|p| matches!(p.kind, PropositionKind::PrimitiveParameter { .. }))
        .collect();
    sort_temporal(&mut sequence);
    let n = sequence.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    let windows: Vec<(usize, Vec<usize>)> = match low_level.windowing {
        Windowing::Whole => vec![(0, vec![n])],
        Windowing::Sliding { min, max } => (0..n)
            .map(|start| {
                let remaining = n - start;
                let upper = max.map_or(remaining, |m| m.min(remaining));
                (start, (min.max(1)..=upper).rev().collect())
            })
            .collect(),
    };

    for (start, sizes) in windows {
        for size in sizes {
            let window: Vec<&Proposition> = sequence[start..start + size]
                .iter()
                .map(|p| p.as_ref())
                .collect();
            if !within_max_gap(&window, low_level) {
                continue;
            }
            if let Some(value) = classify(rule, low_level, &window)? {
                let Some(interval) = span_of(&window) else {
                    break;
                };
                let sources = window.iter().map(|p| p.unique_id.clone()).collect();
                candidates.push(candidate(
                    memory,
                    sources,
                    Payload::Derive {
                        interval,
                        value: Some(value),
                    },
                ));
                break;
            }
        }
    }
    Ok(candidates)
}

fn within_max_gap(window: &[&Proposition], low_level: &LowLevelRule) -> bool {
    let Some(max_gap) = low_level.max_gap_between_values else {
        return true;
    };
    gaps_within(window, max_gap.to_millis())
}

fn gaps_within(window: &[&Proposition], limit: i64) -> bool {
    window.windows(2).all(|pair| match (pair[0].interval(), pair[1].interval()) {
        (Some(prev), Some(next)) => next.min_start().saturating_sub(prev.max_finish()) <= limit,
        _ => true,
    })
}

/// The value of the first value definition whose algorithm call accepts the window.
fn classify(
    rule: &CompiledRule,
    low_level: &LowLevelRule,
    window: &[&Proposition],
) -> Result<Option<Value>, ExecutionError> {
    for value_definition in &low_level.values {
        let verdict = low_level
            .algorithm
            .compute(window, &value_definition.arguments)
            .map_err(|source| ExecutionError::Algorithm {
                definition_id: rule.definition_id.clone(),
                algorithm_id: low_level.algorithm_id.clone(),
                source,
            })?;
        if verdict.is_some() {
            return Ok(Some(value_definition.value.clone()));
        }
    }
    Ok(None)
}

fn span_of(window: &[&Proposition]) -> Option<Interval> {
    let mut intervals = window.iter().filter_map(|p| p.interval());
    let first = *intervals.next()?;
    Some(intervals.fold(first, |acc, i| acc.span(i)))
}

fn evaluate_pattern(
    rule: &CompiledRule,
    pattern: &PatternRule,
    memory: &WorkingMemory,
) -> Result<Vec<Candidate>, ExecutionError> {
    let pools: Vec<Vec<Arc<Proposition>>> = pattern
        .descriptors
        .iter()
        .map(|descriptor| {
            let mut pool: Vec<Arc<Proposition>> = memory
                .of_types(&descriptor.matching_ids)
                .into_iter()
                .filter(|p| p.is_temporal() && descriptor.matches(p))
                .collect();
            sort_temporal(&mut pool);
            pool
        })
        .collect();
    if pools.iter().any(Vec::is_empty) {
        return Ok(Vec::new());
    }

    let mut assignments = Vec::new();
    let mut current: Vec<&Arc<Proposition>> = Vec::with_capacity(pools.len());
    assign(pattern, &pools, &mut current, &mut assignments);

    let mut candidates = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let interval = pattern_interval(rule, pattern.offset.as_ref(), &assignment)?;
        let sources = assignment.iter().map(|p| p.unique_id.clone()).collect();
        candidates.push(candidate(
            memory,
            sources,
            Payload::Derive {
                interval,
                value: Some(pattern.value.clone()),
            },
        ));
    }
    Ok(candidates)
}

/// Backtracking over pairwise-distinct instances, checking each relation as soon as both
/// of its descriptors are assigned.
fn assign<'p>(
    pattern: &PatternRule,
    pools: &'p [Vec<Arc<Proposition>>],
    current: &mut Vec<&'p Arc<Proposition>>,
    out: &mut Vec<Vec<Arc<Proposition>>>,
) {
    let index = current.len();
    if index == pools.len() {
        out.push(current.iter().map(|p| Arc::clone(p)).collect());
        return;
    }
    for candidate in &pools[index] {
        if current.iter().any(|p| p.unique_id == candidate.unique_id) {
            continue;
        }
        current.push(candidate);
        if relations_hold(pattern, current, index) {
            assign(pattern, pools, current, out);
        }
        current.pop();
    }
}

fn relations_hold(pattern: &PatternRule, current: &[&Arc<Proposition>], newest: usize) -> bool {
    pattern.relations.iter().all(|spec| {
        let involves_newest = spec.lhs == newest || spec.rhs == newest;
        if !involves_newest || spec.lhs > newest || spec.rhs > newest {
            return true;
        }
        match (current[spec.lhs].interval(), current[spec.rhs].interval()) {
            (Some(lhs), Some(rhs)) => spec.relation.has_relation(lhs, rhs),
            _ => false,
        }
    })
}

fn pattern_interval(
    rule: &CompiledRule,
    offset: Option<&PatternOffset>,
    assignment: &[Arc<Proposition>],
) -> Result<Interval, ExecutionError> {
    let intervals: Vec<&Interval> = assignment.iter().filter_map(|p| p.interval()).collect();
    let Some(offset) = offset else {
        let first = *intervals[0];
        return Ok(intervals[1..].iter().fold(first, |acc, i| acc.span(i)));
    };
    let (start_min, start_max) = intervals[offset.start_index].bounds(offset.start_side);
    let (finish_min, finish_max) = intervals[offset.finish_index].bounds(offset.finish_side);
    let start_shift = offset.start_offset.to_millis();
    let finish_shift = offset.finish_offset.to_millis();
    Interval::new(
        start_min.saturating_add(start_shift),
        start_max.saturating_add(start_shift),
        finish_min.saturating_add(finish_shift),
        finish_max.saturating_add(finish_shift),
    )
    .map_err(|source| ExecutionError::DerivedInterval {
        definition_id: rule.definition_id.clone(),
        source,
    })
}

fn evaluate_induced_context(
    inducer: &Descriptor,
    offset: &ContextOffset,
    memory: &WorkingMemory,
) -> Vec<Candidate> {
    let mut inducers: Vec<Arc<Proposition>> = memory
        .of_types(&inducer.matching_ids)
        .into_iter()
        .filter(|p| inducer.matches(p))
        .collect();
    sort_temporal(&mut inducers);
    inducers
        .iter()
        .filter_map(|p| {
            let window = offset.window(p.interval()?)?;
            Some(candidate(
                memory,
                vec![p.unique_id.clone()],
                Payload::Derive {
                    interval: window,
                    value: None,
                },
            ))
        })
        .collect()
}

fn slice_outputs(
    definition: &SliceDefinition,
    component: &Descriptor,
    memory: &WorkingMemory,
) -> Vec<DesiredOutput> {
    let mut matches: Vec<Arc<Proposition>> = memory
        .of_types(&component.matching_ids)
        .into_iter()
        .filter(|p| p.is_temporal() && component.matches(p))
        .collect();
    sort_temporal(&mut matches);
    let selected = &matches[definition.selected_range(matches.len())];
    if selected.is_empty() {
        return Vec::new();
    }

    let copy_value = |p: &Proposition| p.value().cloned().unwrap_or(Value::Boolean(true));
    if definition.merged_interval {
        let refs: Vec<&Proposition> = selected.iter().map(|p| p.as_ref()).collect();
        let Some(interval) = span_of(&refs) else {
            return Vec::new();
        };
        let first = copy_value(refs[0]);
        let value = if refs.iter().all(|p| copy_value(*p) == first) {
            first
        } else {
            Value::Boolean(true)
        };
        return vec![DesiredOutput {
            interval,
            value: Some(value),
            sources: selected.iter().map(|p| p.unique_id.clone()).collect(),
        }];
    }
    selected
        .iter()
        .filter_map(|p| {
            Some(DesiredOutput {
                interval: *p.interval()?,
                value: Some(copy_value(p.as_ref())),
                sources: vec![p.unique_id.clone()],
            })
        })
        .collect()
}

/// A maximal run of overlapping or touching instances.
#[derive(Debug, Clone)]
struct Span {
    start: i64,
    finish: i64,
    /// Each contributor with its outer interval.
    contributors: BTreeMap<UniqueId, (i64, i64)>,
}

fn union_spans(instances: &[Arc<Proposition>]) -> Vec<Span> {
    let mut outer: Vec<(i64, i64, &UniqueId)> = instances
        .iter()
        .filter_map(|p| {
            let (start, finish) = p.interval()?.outer();
            Some((start, finish, &p.unique_id))
        })
        .collect();
    outer.sort();
    let mut spans: Vec<Span> = Vec::new();
    for (start, finish, uid) in outer {
        match spans.last_mut() {
            Some(last) if start <= last.finish => {
                last.finish = last.finish.max(finish);
                last.contributors.insert(uid.clone(), (start, finish));
            }
            _ => spans.push(Span {
                start,
                finish,
                contributors: BTreeMap::from([(uid.clone(), (start, finish))]),
            }),
        }
    }
    spans
}

fn intersect_spans(lhs: &[Span], rhs: &[Span]) -> Vec<Span> {
    let mut out = Vec::new();
    for a in lhs {
        for b in rhs {
            let start = a.start.max(b.start);
            let finish = a.finish.min(b.finish);
            if start <= finish {
                let contributors = a
                    .contributors
                    .iter()
                    .chain(&b.contributors)
                    .filter(|(_, (s, f))| *s <= finish && *f >= start)
                    .map(|(uid, outer)| (uid.clone(), *outer))
                    .collect();
                out.push(Span {
                    start,
                    finish,
                    contributors,
                });
            }
        }
    }
    out
}

fn composite_outputs(sub_contexts: &[String], memory: &WorkingMemory) -> Vec<DesiredOutput> {
    let mut acc: Option<Vec<Span>> = None;
    for sub in sub_contexts {
        let spans = union_spans(&memory.of_type(sub));
        acc = Some(match acc {
            None => spans,
            Some(previous) => intersect_spans(&previous, &spans),
        });
    }
    acc.unwrap_or_default()
        .into_iter()
        .filter_map(|span| {
            Some(DesiredOutput {
                interval: Interval::definite(span.start, span.finish).ok()?,
                value: None,
                sources: span.contributors.into_keys().collect(),
            })
        })
        .collect()
}

/// One reconcile candidate when the desired outputs differ from the live ones.
fn reconcile(
    memory: &WorkingMemory,
    desired: Vec<DesiredOutput>,
    current: &[DesiredOutput],
) -> Vec<Candidate> {
    if desired.as_slice() == current {
        return Vec::new();
    }
    let sources: Vec<UniqueId> = desired
        .iter()
        .flat_map(|d| d.sources.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    vec![candidate(memory, sources, Payload::Reconcile { desired })]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(local: &str, start: i64, finish: i64) -> Arc<Proposition> {
        Arc::new(Proposition::context(
            "ctx",
            UniqueId::new("t", local),
            Interval::definite(start, finish).unwrap(),
        ))
    }

    #[test]
    fn union_merges_overlapping_and_touching() {
        let spans = union_spans(&[context("a", 0, 5), context("b", 5, 8), context("c", 10, 12)]);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].finish), (0, 8));
        assert_eq!(spans[0].contributors.len(), 2);
        assert_eq!((spans[1].start, spans[1].finish), (10, 12));
    }

    #[test]
    fn intersection_keeps_overlap_only() {
        let lhs = union_spans(&[context("a", 0, 10)]);
        let rhs = union_spans(&[context("b", 5, 20), context("c", 30, 40)]);
        let out = intersect_spans(&lhs, &rhs);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].start, out[0].finish), (5, 10));
        assert_eq!(out[0].contributors.len(), 2);
    }

    #[test]
    fn intersection_drops_contributors_outside_the_overlap() {
        let lhs = union_spans(&[context("a", 0, 4), context("b", 3, 10), context("c", 10, 30)]);
        let rhs = union_spans(&[context("d", 20, 25)]);
        let out = intersect_spans(&lhs, &rhs);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].start, out[0].finish), (20, 25));
        let kept: Vec<&str> = out[0].contributors.keys().map(|uid| uid.local_id.as_str()).collect();
        assert_eq!(kept, vec!["c", "d"]);
    }

    #[test]
    fn gaps_saturate_at_extreme_positions() {
        let far_apart = [context("a", i64::MIN, i64::MIN), context("b", i64::MAX, i64::MAX)];
        let window: Vec<&Proposition> = far_apart.iter().map(|p| p.as_ref()).collect();
        assert!(!gaps_within(&window, 3_600_000));
        assert!(gaps_within(&window, i64::MAX));
    }
}
