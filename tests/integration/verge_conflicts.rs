//! Integration tests for verge traversal and conflict detection

use crate::integration::test_utils::{first_text, memory_graph, new_file_commit, replace_commit};
use std::collections::BTreeSet;
use strand::types::{sink_identity, source_identity};
use strand::{
    AncestryFrontier, Commit, CommitSet, EdgeRef, Everything, Frontier, Graph, NewContent,
    GraphError, NodeRef, Store, END_OF_FILE,
};

/// Replace the last unit of `path` (depth `depth` of the run at `head`)
fn replace_last(
    graph: &Graph<Store>,
    deps: &[&Commit],
    path: &str,
    head: &str,
    depth: u64,
    line: &str,
) -> Commit {
    Commit::new(
        deps.iter().map(|c| c.hash.clone()).collect(),
        vec![
            NodeRef {
                node: head.to_string(),
                depth: depth - 1,
            },
            NodeRef {
                node: sink_identity(path),
                depth: 1,
            },
        ],
        vec![NewContent::text(vec![line.as_bytes().to_vec()])],
        vec![EdgeRef::new(0, 2), EdgeRef::new(2, 1)],
        graph.hasher(),
    )
}

/// Dominators of every cut and the heads crossed, in order
struct Walk {
    cuts: Vec<Vec<String>>,
    crossed: Vec<String>,
}

/// Drive a verge up to the sink, checking the crossing rule at every step,
/// then retract it back past the start sentinel checking the mirrored rule.
///
/// Forward, the walk must leave only edges into the sink or parked at the
/// end of file. Backward, it must cross the same nodes and leave an empty
/// cut.
fn walk<F: Frontier>(graph: &Graph<Store>, path: &str, frontier: &F) -> Walk {
    let sink = sink_identity(path);
    let mut verge = graph.verge(path).unwrap();
    let mut cuts = Vec::new();
    let mut crossed = Vec::new();

    loop {
        cuts.push(verge.dominators(frontier));
        let Some(node) = verge.next().unwrap() else {
            break;
        };
        for edge in &node.ins {
            assert_eq!(
                verge.forward().get(&edge.commit),
                Some(&node.head),
                "crossed {} before its incoming edges were cut",
                node.head
            );
        }
        if node.head == sink {
            break;
        }
        verge.advance(&node).unwrap();
        crossed.push(node.head);
    }
    for target in verge.forward().values() {
        assert!(
            *target == sink || target == END_OF_FILE,
            "walk stopped short of {}",
            target
        );
    }

    let mut retracted = Vec::new();
    while let Some(node) = verge.prev().unwrap() {
        for edge in &node.outs {
            assert_eq!(
                verge.backward().get(&edge.commit),
                Some(&node.head),
                "retracted {} before its outgoing edges were cut",
                node.head
            );
        }
        verge.retract(&node).unwrap();
        retracted.push(node.head);
    }
    assert!(verge.forward().is_empty());
    assert!(verge.backward().is_empty());
    assert_eq!(retracted.pop(), Some(source_identity(path)));

    let ahead: BTreeSet<&String> = crossed.iter().collect();
    let behind: BTreeSet<&String> = retracted.iter().collect();
    assert_eq!(ahead, behind);
    assert_eq!(retracted.len(), crossed.len());

    Walk { cuts, crossed }
}

#[test]
fn test_linear_history_has_single_dominator() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc\nd");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    let c1 = replace_commit(&graph, &[&c0], &head, 2, &["B"]);
    graph.apply(&c1).unwrap();
    let c2 = replace_last(&graph, &[&c1], "v.txt", &head, 4, "D");
    graph.apply(&c2).unwrap();

    let frontier = AncestryFrontier::new(graph.repo(), &[c2.hash.clone()]).unwrap();
    let cuts = walk(&graph, "v.txt", &frontier).cuts;
    assert!(!cuts.is_empty());
    for dominators in &cuts {
        assert_eq!(dominators.len(), 1, "cut dominators: {:?}", dominators);
    }

    assert!(graph.scan_conflicts("v.txt", &frontier).unwrap().is_empty());
    assert_eq!(graph.read_text("v.txt", &frontier).unwrap(), b"a\nB\nc\nD");
}

#[test]
fn test_sibling_edits_conflict() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    let c1 = replace_commit(&graph, &[&c0], &head, 2, &["left"]);
    let c2 = replace_commit(&graph, &[&c0], &head, 2, &["right"]);
    graph.apply(&c1).unwrap();
    graph.apply(&c2).unwrap();

    let frontier = CommitSet::new([c0.hash.clone(), c1.hash.clone(), c2.hash.clone()]);
    let mut expected = vec![c1.hash.clone(), c2.hash.clone()];
    expected.sort();

    // after crossing the shared first line both edits are on the cut
    let mut verge = graph.verge("v.txt").unwrap();
    assert!(verge.conflicts(&frontier).is_empty());
    let first = verge.next().unwrap().unwrap();
    assert_eq!(first.head, head);
    verge.advance(&first).unwrap();
    assert_eq!(verge.conflicts(&frontier), expected);

    let regions = graph.scan_conflicts("v.txt", &frontier).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].start, head);
    assert_eq!(regions[0].commits, expected);

    // observing only one side resolves the ambiguity
    let one_side = CommitSet::new([c0.hash.clone(), c1.hash.clone()]);
    assert!(verge.conflicts(&one_side).is_empty());
    assert_eq!(graph.read_text("v.txt", &one_side).unwrap(), b"a\nleft\nc");

    let both = walk(&graph, "v.txt", &frontier);
    assert_eq!(both.crossed.len(), 5);
    assert!(both.cuts.contains(&expected));
    assert!(walk(&graph, "v.txt", &one_side)
        .cuts
        .iter()
        .all(|dominators| dominators.len() == 1));
}

#[test]
fn test_disjoint_sibling_edits_do_not_conflict() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc\nd");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    let c1 = replace_commit(&graph, &[&c0], &head, 2, &["B"]);
    let c2 = replace_last(&graph, &[&c0], "v.txt", &head, 4, "D");
    graph.apply(&c1).unwrap();
    graph.apply(&c2).unwrap();

    assert!(graph.scan_conflicts("v.txt", &Everything).unwrap().is_empty());
    assert_eq!(
        graph.read_text("v.txt", &Everything).unwrap(),
        b"a\nB\nc\nD"
    );
    for dominators in walk(&graph, "v.txt", &Everything).cuts {
        assert_eq!(dominators.len(), 1, "cut dominators: {:?}", dominators);
    }
}

#[test]
fn test_merge_commit_resolves_conflict() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    let c1 = replace_commit(&graph, &[&c0], &head, 2, &["left"]);
    let c2 = replace_commit(&graph, &[&c0], &head, 2, &["right"]);
    graph.apply(&c1).unwrap();
    graph.apply(&c2).unwrap();

    // a merge depending on both sides replaces the disputed line again
    let merge = replace_commit(&graph, &[&c1, &c2], &head, 2, &["merged"]);
    graph.apply(&merge).unwrap();

    let frontier = AncestryFrontier::new(graph.repo(), &[merge.hash.clone()]).unwrap();
    assert_eq!(frontier.commits().len(), 4);
    assert_eq!(
        graph.read_text("v.txt", &frontier).unwrap(),
        b"a\nmerged\nc"
    );

    let mut verge = graph.verge("v.txt").unwrap();
    let first = verge.next().unwrap().unwrap();
    verge.advance(&first).unwrap();
    assert!(verge.conflicts(&frontier).is_empty());
    assert_eq!(verge.dominators(&frontier), vec![merge.hash.clone()]);

    // the rejoined graph walks cleanly in both directions
    let rejoined = walk(&graph, "v.txt", &frontier);
    assert_eq!(rejoined.crossed.len(), 6);
    for dominators in &rejoined.cuts {
        assert_eq!(dominators.len(), 1, "cut dominators: {:?}", dominators);
    }
}

#[test]
fn test_deletion_beside_insertion_walks_and_conflicts() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    let delete = Commit::new(
        vec![c0.hash.clone()],
        vec![
            NodeRef {
                node: head.clone(),
                depth: 1,
            },
            NodeRef {
                node: head.clone(),
                depth: 3,
            },
        ],
        vec![],
        vec![EdgeRef::new(0, 1)],
        graph.hasher(),
    );
    let insert = Commit::new(
        vec![c0.hash.clone()],
        vec![
            NodeRef {
                node: head.clone(),
                depth: 2,
            },
            NodeRef {
                node: head.clone(),
                depth: 3,
            },
        ],
        vec![NewContent::text(vec![b"Y".to_vec()])],
        vec![EdgeRef::new(0, 2), EdgeRef::new(2, 1)],
        graph.hasher(),
    );
    graph.apply(&delete).unwrap();
    graph.apply(&insert).unwrap();

    let mut expected = vec![delete.hash.clone(), insert.hash.clone()];
    expected.sort();
    let diverged = walk(&graph, "v.txt", &Everything);
    assert_eq!(diverged.crossed.len(), 4);
    assert!(diverged.cuts.contains(&expected));

    assert!(matches!(
        graph.read_file("v.txt", &Everything),
        Err(GraphError::Conflict { commits, .. }) if commits == expected
    ));
}

#[test]
fn test_tail_deletion_parks_on_end_of_file() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;

    // end the file right after "a"
    let truncate = Commit::new(
        vec![c0.hash.clone()],
        vec![NodeRef {
            node: head.clone(),
            depth: 1,
        }],
        vec![],
        vec![EdgeRef::to_end(0)],
        graph.hasher(),
    );
    graph.apply(&truncate).unwrap();
    assert_eq!(graph.read_text("v.txt", &Everything).unwrap(), b"a");

    let mut verge = graph.verge("v.txt").unwrap();
    let first = verge.next().unwrap().unwrap();
    verge.advance(&first).unwrap();
    assert_eq!(
        verge.forward().get(&truncate.hash).map(String::as_str),
        Some(END_OF_FILE)
    );
    assert_eq!(verge.dominators(&Everything), vec![truncate.hash.clone()]);

    let truncated = walk(&graph, "v.txt", &Everything);
    assert_eq!(truncated.crossed.len(), 2);
    for dominators in &truncated.cuts {
        assert_eq!(dominators.len(), 1, "cut dominators: {:?}", dominators);
    }
}

#[test]
fn test_file_without_sink_walks_to_end_of_file() {
    let graph = memory_graph();
    let commit = Commit::new(
        vec![],
        vec![],
        vec![
            NewContent::file_src("e.txt"),
            NewContent::text(vec![b"only".to_vec()]),
        ],
        vec![EdgeRef::new(0, 1), EdgeRef::to_end(1)],
        graph.hasher(),
    );
    graph.apply(&commit).unwrap();

    let open_ended = walk(&graph, "e.txt", &Everything);
    assert_eq!(open_ended.crossed.len(), 1);
    assert_eq!(graph.read_text("e.txt", &Everything).unwrap(), b"only");
}

#[test]
fn test_retract_walks_back_to_start() {
    let graph = memory_graph();
    let c0 = new_file_commit(&graph, "v.txt", "a\nb\nc");
    graph.apply(&c0).unwrap();
    let head = first_text(&graph, "v.txt").head;
    graph.split_node(&head, 1).unwrap();
    graph.split_node(&head, 2).unwrap();

    let mut verge = graph.verge("v.txt").unwrap();
    let mut forward = Vec::new();
    while let Some(node) = verge.next().unwrap() {
        if node.head == sink_identity("v.txt") {
            break;
        }
        verge.advance(&node).unwrap();
        forward.push(node.head);
    }
    assert_eq!(forward.len(), 3);

    let mut backward = Vec::new();
    while let Some(node) = verge.prev().unwrap() {
        verge.retract(&node).unwrap();
        backward.push(node.head);
    }
    backward.pop(); // the start sentinel
    backward.reverse();
    assert_eq!(backward, forward);
}
