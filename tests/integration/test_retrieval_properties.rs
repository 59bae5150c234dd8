//! End-to-end retrieval over a flat index written to disk.

use crate::common::{CORPUS, Fixture};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_results_bounded_and_sorted_for_every_top_k() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);
    let queries = ["storm over the valley", "market bread", "a letter from the sea"];

    for query in queries {
        for top_k in 1..=CORPUS.len() {
            let results = retriever.retrieve(query, top_k).unwrap();
            assert!(results.len() <= top_k, "{query}: {} > {top_k}", results.len());
            assert!(
                results.windows(2).all(|w| w[0].distance <= w[1].distance),
                "{query}: distances not ascending for top_k={top_k}"
            );
        }
    }
}

#[test]
fn test_retrieval_is_idempotent() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let first = retriever.retrieve("waves and rocks", 5).unwrap();
    let second = retriever.retrieve("waves and rocks", 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_every_sentence_matches_itself_first() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    for (sentence, title) in CORPUS {
        let results = retriever.retrieve(sentence, 3).unwrap();
        assert_eq!(results[0].sentence, *sentence);
        assert_eq!(results[0].story_title, *title);
        assert!(results[0].distance.abs() < 1e-6, "{sentence}: {}", results[0].distance);
    }
}

#[test]
fn test_top_k_one_returns_exactly_one() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let results = retriever.retrieve("candlelight", 1).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn test_top_k_beyond_corpus_returns_whole_corpus() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let results = retriever.retrieve("snow", CORPUS.len() + 25).unwrap();
    assert_eq!(results.len(), CORPUS.len());
}

#[test]
fn test_unbounded_top_k_returns_whole_corpus() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let results = retriever.retrieve("snow", usize::MAX).unwrap();
    assert_eq!(results.len(), CORPUS.len());
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_results_join_to_matching_rows() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    for result in retriever.retrieve("the harbor at night", CORPUS.len()).unwrap() {
        assert!(
            CORPUS
                .iter()
                .any(|(s, t)| *s == result.sentence && *t == result.story_title),
            "unexpected pair: {result}"
        );
    }
}

#[test]
fn test_dawn_example() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let results = retriever.retrieve("the sun rose", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].sentence, "The sun rose over the hills.");
    assert_eq!(results[0].story_title, "Dawn");
    assert!(results[0].distance < 0.5);
}

#[test]
fn test_prompt_context_lines() {
    let fixture = Fixture::flat();
    let retriever = fixture.retriever(1);

    let results = retriever.retrieve("the sun rose", 1).unwrap();
    assert_eq!(
        storyctx::format_context(&results),
        "- Sentence: The sun rose over the hills. (from 'Dawn')"
    );
}

#[tokio::test]
async fn test_timeout_wrapper_matches_direct_call() {
    let fixture = Fixture::flat();
    let retriever = Arc::new(fixture.retriever(1));

    let direct = retriever.retrieve("kites on the shore", 4).unwrap();
    let wrapped = retriever
        .clone()
        .retrieve_with_timeout("kites on the shore".to_string(), 4, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(direct, wrapped);
}
