//! Partitioned index behavior against the exact index.

use crate::common::{CORPUS, Fixture};

const QUERIES: &[&str] = &[
    "the sun rose",
    "storm and thunder",
    "winter snow in the woods",
    "a merchant with coins",
];

#[test]
fn test_searching_every_partition_equals_flat() {
    let flat = Fixture::flat();
    let partitioned = Fixture::partitioned(4);

    let exact = flat.retriever(1);
    let ivf = partitioned.retriever(4);
    assert_eq!(ivf.index().partition_count(), 4);

    for query in QUERIES {
        assert_eq!(
            exact.retrieve(query, 5).unwrap(),
            ivf.retrieve(query, 5).unwrap(),
            "{query}"
        );
    }
}

#[test]
fn test_nprobe_above_nlist_is_exact() {
    let flat = Fixture::flat();
    let partitioned = Fixture::partitioned(3);

    let exact = flat.retriever(1);
    let ivf = partitioned.retriever(64);

    for query in QUERIES {
        assert_eq!(
            exact.retrieve(query, CORPUS.len()).unwrap(),
            ivf.retrieve(query, CORPUS.len()).unwrap()
        );
    }
}

#[test]
fn test_single_partition_scans_one_partition() {
    let partitioned = Fixture::partitioned(4);
    let retriever = partitioned.retriever(1);

    // Round-robin assignment puts CORPUS.len() / 4 rows in each partition
    let results = retriever.retrieve("the sun rose", CORPUS.len()).unwrap();
    assert_eq!(results.len(), CORPUS.len() / 4);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));

    let again = retriever.retrieve("the sun rose", CORPUS.len()).unwrap();
    assert_eq!(results, again);
}
