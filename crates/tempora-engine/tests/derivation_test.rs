use std::sync::Arc;

use proptest::prelude::*;

use tempora_core::proposition::{Proposition, UniqueId};
use tempora_core::temporal::Interval;
use tempora_engine::DerivationGraph;

fn node(n: u8) -> Arc<Proposition> {
    let interval = Interval::definite(i64::from(n), i64::from(n) + 1).unwrap();
    Arc::new(Proposition::context("node", UniqueId::new("test", n.to_string()), interval))
}

#[derive(Debug, Clone)]
enum Op {
    Assert(u8, u8),
    RetractForward(u8),
    RetractBackward(u8),
    Repoint(u8, u8),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..8, 0u8..8).prop_map(|(a, b)| Op::Assert(a, b)),
        1 => (0u8..8).prop_map(Op::RetractForward),
        1 => (0u8..8).prop_map(Op::RetractBackward),
        1 => (0u8..8, 8u8..12).prop_map(|(a, b)| Op::Repoint(a, b)),
        1 => (0u8..8).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn edges_stay_symmetric(ops in proptest::collection::vec(op(), 0..60)) {
        let mut graph = DerivationGraph::new();
        for op in ops {
            match op {
                Op::Assert(a, b) => graph.proposition_asserted(&node(a), &node(b)),
                Op::RetractForward(a) => {
                    graph.proposition_retracted_forward(&node(a));
                }
                Op::RetractBackward(a) => {
                    graph.proposition_retracted_backward(&node(a));
                }
                Op::Repoint(a, b) => graph.repoint(&node(a), &node(b)),
                Op::Remove(a) => graph.remove(&node(a)),
            }
            prop_assert!(graph.is_symmetric());
        }
    }

    #[test]
    fn snapshot_round_trip_preserves_edges(
        pairs in proptest::collection::vec((0u8..8, 0u8..8), 0..30)
    ) {
        let mut graph = DerivationGraph::new();
        for (a, b) in pairs {
            graph.proposition_asserted(&node(a), &node(b));
        }
        let snapshot = graph.snapshot();
        let mut restored = DerivationGraph::new();
        restored.restore(&snapshot);
        prop_assert_eq!(restored.snapshot(), snapshot);
        prop_assert_eq!(restored.edge_count(), graph.edge_count());
        prop_assert!(restored.is_symmetric());
    }
}

#[test]
fn retracting_forward_returns_derived_and_clears_both_sides() {
    let mut graph = DerivationGraph::new();
    graph.proposition_asserted(&node(1), &node(2));
    graph.proposition_asserted(&node(1), &node(3));
    let removed = graph.proposition_retracted_forward(&node(1));
    assert_eq!(removed.len(), 2);
    assert!(graph.backward(&node(2)).is_empty());
    assert!(graph.is_empty());
}
