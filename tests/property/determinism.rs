//! Property-based tests for hashing determinism and split identity

use proptest::prelude::*;
use strand::chunk::{join_lines, split_lines};
use strand::graph::Form;
use strand::hashing::{chain_span, content_key};
use strand::types::source_identity;
use strand::{Blake3, Commit, EdgeRef, Everything, Graph, NewContent, Store};

fn chunks_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..12)
}

/// Test that chained unit hashing is a pure function of its inputs
#[test]
fn test_chain_span_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(chunks_strategy(), "[0-9a-f]{8}", "[0-9a-f]{8}"),
            |(chunks, commit, prev)| {
                let first = chain_span(&Blake3, &commit, &prev, Form::Text, &chunks).unwrap();
                let second = chain_span(&Blake3, &commit, &prev, Form::Text, &chunks).unwrap();
                prop_assert_eq!(&first, &second);

                // a different commit never reuses the chain
                let other_commit = format!("{}x", commit);
                let other = chain_span(&Blake3, &other_commit, &prev, Form::Text, &chunks).unwrap();
                prop_assert_ne!(&first.head, &other.head);
                prop_assert_ne!(&first.tail, &other.tail);

                Ok(())
            },
        )
        .unwrap();
}

/// Test that changing one byte of content changes the content key and tail
#[test]
fn test_content_change_changes_hashes_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(chunks_strategy(), any::<u8>()), |(chunks, byte)| {
            let mut changed = chunks.clone();
            let last = changed.len() - 1;
            changed[last].push(byte);

            prop_assert_ne!(content_key(&Blake3, &chunks), content_key(&Blake3, &changed));
            let a = chain_span(&Blake3, "c", "p", Form::Text, &chunks).unwrap();
            let b = chain_span(&Blake3, "c", "p", Form::Text, &changed).unwrap();
            prop_assert_ne!(a.tail, b.tail);

            Ok(())
        })
        .unwrap();
}

/// Test that splitting at any depth preserves the run's ends and content
#[test]
fn test_split_identity_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec("[a-z]{0,6}", 2..10), any::<prop::sample::Index>()),
            |(lines, pick)| {
                let graph = Graph::with_default_hasher(Store::memory());
                let chunks: Vec<Vec<u8>> = lines.iter().map(|l| l.as_bytes().to_vec()).collect();
                let commit = Commit::new(
                    vec![],
                    vec![],
                    vec![
                        NewContent::file_src("p.txt"),
                        NewContent::text(chunks.clone()),
                        NewContent::file_snk("p.txt"),
                    ],
                    vec![EdgeRef::new(0, 1), EdgeRef::new(1, 2)],
                    graph.hasher(),
                );
                graph.apply(&commit).unwrap();

                let src = graph.node(&source_identity("p.txt")).unwrap();
                let original = graph.node(&src.outs[0].target).unwrap();
                let depth = pick.index(chunks.len() - 1) as u64 + 1;

                let point = graph.split_node(&original.head, depth).unwrap();
                let left = graph.node(&original.head).unwrap();
                let right = graph
                    .node(point.right_head.as_ref().unwrap())
                    .unwrap();

                prop_assert_eq!(&left.head, &original.head);
                prop_assert_eq!(&right.tail, &original.tail);
                prop_assert_eq!(left.count + right.count, original.count);
                prop_assert_eq!(left.count, depth);

                let mut rejoined = graph.content(&left).unwrap();
                rejoined.extend(graph.content(&right).unwrap());
                prop_assert_eq!(&rejoined, &chunks);
                prop_assert_eq!(graph.read_file("p.txt", &Everything).unwrap(), chunks);

                Ok(())
            },
        )
        .unwrap();
}

/// Test that line chunking reproduces its input
#[test]
fn test_line_chunking_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<Vec<u8>>(), |bytes| {
            prop_assert_eq!(join_lines(&split_lines(&bytes)), bytes);
            Ok(())
        })
        .unwrap();
}
