//! Integration tests for node splitting

use crate::integration::test_utils::{first_text, memory_graph, new_file_commit};
use strand::types::source_identity;
use strand::{Commit, EdgeRef, Everything, GraphError, NewContent, NodeRef, Repo};

#[test]
fn test_split_identity_at_every_depth() {
    for depth in 1..=6 {
        let graph = memory_graph();
        graph
            .apply(&new_file_commit(&graph, "s.txt", "1\n2\n3\n4\n5\n6"))
            .unwrap();
        let original = first_text(&graph, "s.txt");

        let point = graph.split_node(&original.head, depth).unwrap();
        let left = graph.node(&original.head).unwrap();
        let right_tail = graph.node_by_tail(&original.tail).unwrap();

        assert_eq!(left.head, original.head, "depth {}", depth);
        assert_eq!(right_tail.tail, original.tail, "depth {}", depth);
        assert_eq!(left.tail, point.left_tail, "depth {}", depth);

        if depth < 6 {
            let right = graph.node(point.right_head.as_ref().unwrap()).unwrap();
            assert_eq!(left.count + right.count, original.count);
            assert_eq!(right.tail, original.tail);
        } else {
            assert_eq!(point.right_head, None);
            assert_eq!(left, original);
        }

        // the file reads back unchanged
        assert_eq!(
            graph.read_text("s.txt", &Everything).unwrap(),
            b"1\n2\n3\n4\n5\n6"
        );
    }
}

#[test]
fn test_split_idempotence_leaves_store_untouched() {
    let graph = memory_graph();
    graph
        .apply(&new_file_commit(&graph, "s.txt", "a\nb\nc"))
        .unwrap();
    let head = first_text(&graph, "s.txt").head;
    let first = graph.split_node(&head, 1).unwrap();

    let snapshot: Vec<_> = graph
        .repo()
        .list_keys(strand::store::EntityKind::Node, "", usize::MAX)
        .unwrap()
        .into_iter()
        .map(|key| graph.node(&key).unwrap())
        .collect();

    let again = graph.split_node(&head, 1).unwrap();
    assert_eq!(first, again);

    for node in snapshot {
        assert_eq!(graph.node(&node.head).unwrap(), node);
    }
}

#[test]
fn test_sentinel_depth_one_after_redirecting_split() {
    let graph = memory_graph();
    let base = new_file_commit(&graph, "s.txt", "a\nb");
    graph.apply(&base).unwrap();
    let text = first_text(&graph, "s.txt");
    let src = source_identity("s.txt");

    // split the sentinel's successor so its out edge now leads to a shorter node
    graph.split_node(&text.head, 1).unwrap();

    // the boundary still leads to the unchanged head of the first piece
    let point = graph.split_node(&src, 1).unwrap();
    assert_eq!(point.left_tail, src);
    assert_eq!(point.right_head, Some(text.head.clone()));
    assert!(matches!(
        graph.split_node(&src, 2),
        Err(GraphError::Malformed(_))
    ));

    // prepend a line using the sentinel boundary as the source
    let prepend = Commit::new(
        vec![base.hash.clone()],
        vec![
            NodeRef {
                node: src.clone(),
                depth: 1,
            },
            NodeRef {
                node: text.head.clone(),
                depth: 1,
            },
        ],
        vec![NewContent::text(vec![b"zero".to_vec()])],
        vec![EdgeRef::new(0, 2), EdgeRef::new(2, 1)],
        graph.hasher(),
    );
    graph.apply(&prepend).unwrap();

    assert_eq!(
        graph.read_text("s.txt", &Everything).unwrap(),
        b"zero\na\nb"
    );
    let sentinel = graph.node(&src).unwrap();
    assert_eq!(sentinel.outs.len(), 2);
    assert_eq!(sentinel.out_deps, vec![vec![], vec![0]]);

    // with two edges leaving the sentinel the unit after it is ambiguous
    assert_eq!(graph.split_node(&src, 1).unwrap().right_head, None);
    let ambiguous = Commit::new(
        vec![prepend.hash.clone()],
        vec![
            NodeRef {
                node: src.clone(),
                depth: 1,
            },
            NodeRef {
                node: src.clone(),
                depth: 2,
            },
        ],
        vec![NewContent::text(vec![b"minus".to_vec()])],
        vec![EdgeRef::new(0, 2), EdgeRef::new(2, 1)],
        graph.hasher(),
    );
    assert!(matches!(
        graph.apply(&ambiguous),
        Err(GraphError::Malformed(_))
    ));
}

#[test]
fn test_prepend_through_start_sentinel_refs() {
    let graph = memory_graph();
    let base = new_file_commit(&graph, "s.txt", "a\nb");
    graph.apply(&base).unwrap();
    let first = first_text(&graph, "s.txt");
    let src = source_identity("s.txt");

    // depth 2 on the start sentinel names the file's first unit
    let prepend = Commit::new(
        vec![base.hash.clone()],
        vec![
            NodeRef {
                node: src.clone(),
                depth: 1,
            },
            NodeRef {
                node: src.clone(),
                depth: 2,
            },
        ],
        vec![NewContent::text(vec![b"zero".to_vec()])],
        vec![EdgeRef::new(0, 2), EdgeRef::new(2, 1)],
        graph.hasher(),
    );
    graph.apply(&prepend).unwrap();

    assert_eq!(
        graph.read_text("s.txt", &Everything).unwrap(),
        b"zero\na\nb"
    );
    let first_after = graph.node(&first.head).unwrap();
    assert_eq!(first_after.ins.len(), 2);
    assert_eq!(first_after.count, first.count);
}

#[test]
fn test_split_of_unknown_node_is_not_found() {
    let graph = memory_graph();
    assert!(matches!(
        graph.split_node("missing", 1),
        Err(GraphError::NodeNotFound(_))
    ));
}
