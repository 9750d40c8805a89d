//! Property tests: arbitrary edit sequences keep every graph invariant.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use proptest::prelude::*;

use clusterdag_core::{
    CoreError, Graph, GraphParts, IssueRef, IssueState, LinkOutcome, LoadPolicy, Node, NodeId,
    NodeKind,
};

#[derive(Debug, Clone)]
enum Op {
    Link(u32, u32),
    Unlink(u32, u32),
    Delete(u32),
}

fn op(max: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=max, 1..=max).prop_map(|(a, b)| Op::Link(a, b)),
        1 => (1..=max, 1..=max).prop_map(|(a, b)| Op::Unlink(a, b)),
        1 => (1..=max).prop_map(Op::Delete),
    ]
}

fn scenario() -> impl Strategy<Value = (u32, Vec<Op>)> {
    (3u32..10).prop_flat_map(|n| (Just(n), prop::collection::vec(op(n), 0..40)))
}

fn unlinked(n: u32) -> Graph {
    let mut nodes = IndexMap::new();
    for raw in 1..=n {
        let kind = if raw == 1 {
            NodeKind::Entry
        } else {
            NodeKind::Issue(IssueRef::new(u64::from(raw), IssueState::Open))
        };
        nodes.insert(NodeId(raw), Node::new(NodeId(raw), kind));
    }
    Graph::from_parts(
        GraphParts {
            nodes,
            entry: NodeId(1),
            ..GraphParts::default()
        },
        LoadPolicy::Strict,
    )
    .unwrap()
}

/// All `(from, to)` pairs with a path of length >= 1.
fn reachability(graph: &Graph) -> BTreeSet<(NodeId, NodeId)> {
    let ids: Vec<NodeId> = graph.nodes().map(|node| node.id).collect();
    let mut pairs = BTreeSet::new();
    for &from in &ids {
        for &to in &ids {
            if graph.reaches(from, to).unwrap() {
                pairs.insert((from, to));
            }
        }
    }
    pairs
}

proptest! {
    #[test]
    fn edits_preserve_invariants((n, ops) in scenario()) {
        let mut graph = unlinked(n);

        for op in ops {
            let before = graph.clone();
            let result = match op {
                Op::Link(a, b) => graph.link_nodes(NodeId(a), NodeId(b)).map(|_| ()),
                Op::Unlink(a, b) => graph.unlink_nodes(NodeId(a), NodeId(b)).map(|_| ()),
                Op::Delete(a) => graph.delete_node(NodeId(a)).map(|_| ()),
            };

            match result {
                Ok(()) => prop_assert!(graph.validate().is_ok(), "{:?}", graph.validate()),
                Err(err) => {
                    prop_assert!(!matches!(err, CoreError::GraphIntegrity(_)), "{err}");
                    prop_assert_eq!(&graph, &before);
                }
            }
            prop_assert!(graph.count_closed() <= graph.count_nodes());
        }
    }

    #[test]
    fn link_keeps_reachability_of_closure((n, ops) in scenario(), up in 1u32..10, down in 1u32..10) {
        let mut graph = unlinked(n);
        for op in ops {
            if let Op::Link(a, b) = op {
                let _ = graph.link_nodes(NodeId(a), NodeId(b));
            }
        }
        prop_assume!(up <= n && down <= n);
        let (up, down) = (NodeId(up), NodeId(down));

        let mut expected = reachability(&graph);
        match graph.link_nodes(up, down) {
            Ok(outcome) => {
                // Reachability becomes the closure of the old relation plus
                // the new edge; reduction never loses a path.
                let sources: Vec<NodeId> = std::iter::once(up)
                    .chain(expected.iter().filter(|(_, to)| *to == up).map(|(from, _)| *from))
                    .collect();
                let targets: Vec<NodeId> = std::iter::once(down)
                    .chain(expected.iter().filter(|(from, _)| *from == down).map(|(_, to)| *to))
                    .collect();
                for &from in &sources {
                    for &to in &targets {
                        expected.insert((from, to));
                    }
                }
                prop_assert_eq!(reachability(&graph), expected);

                if let LinkOutcome::Linked { .. } = outcome {
                    prop_assert!(graph.node(up).unwrap().downstream.contains(&down));
                }
            }
            Err(err) => prop_assert!(matches!(err, CoreError::Cycle { .. }), "{err}"),
        }
    }

    #[test]
    fn delete_preserves_reachability_through_the_node((n, ops) in scenario(), victim in 2u32..10) {
        let mut graph = unlinked(n);
        for op in ops {
            if let Op::Link(a, b) = op {
                let _ = graph.link_nodes(NodeId(a), NodeId(b));
            }
        }
        prop_assume!(victim <= n);
        let victim = NodeId(victim);

        let before = reachability(&graph);
        graph.delete_node(victim).unwrap();

        let expected: BTreeSet<(NodeId, NodeId)> = before
            .into_iter()
            .filter(|(from, to)| *from != victim && *to != victim)
            .collect();
        prop_assert_eq!(reachability(&graph), expected);
        prop_assert_eq!(graph.deleted().last(), Some(&victim));
        prop_assert!(graph.validate().is_ok());
    }

    #[test]
    fn unlink_twice_equals_unlink_once((n, ops) in scenario(), a in 1u32..10, b in 1u32..10) {
        let mut graph = unlinked(n);
        for op in ops {
            if let Op::Link(x, y) = op {
                let _ = graph.link_nodes(NodeId(x), NodeId(y));
            }
        }
        prop_assume!(a <= n && b <= n);

        graph.unlink_nodes(NodeId(a), NodeId(b)).unwrap();
        let once = graph.clone();
        graph.unlink_nodes(NodeId(a), NodeId(b)).unwrap();

        prop_assert_eq!(graph, once);
    }
}
