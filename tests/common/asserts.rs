use groundsmith::{DocumentChunk, SearchResult};
use rustc_hash::FxHashSet;

#[allow(dead_code)]
pub fn assert_ranked_descending(results: &[SearchResult]) {
    for pair in results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "results out of rank order: {} before {}",
            pair[0].score,
            pair[1].score
        );
    }
}

#[allow(dead_code)]
pub fn assert_scores_in_unit_range(results: &[SearchResult]) {
    for result in results {
        assert!(
            (0.0..=1.0).contains(&result.score),
            "score {} for chunk '{}' outside [0, 1]",
            result.score,
            result.chunk.id
        );
    }
}

#[allow(dead_code)]
pub fn assert_unique_ids(chunks: &[DocumentChunk]) {
    let mut seen = FxHashSet::default();
    for chunk in chunks {
        assert!(seen.insert(chunk.id.as_str()), "duplicate chunk id '{}'", chunk.id);
    }
}

#[allow(dead_code)]
pub fn assert_non_empty_contents(chunks: &[DocumentChunk]) {
    for chunk in chunks {
        assert!(
            !chunk.content.trim().is_empty(),
            "chunk '{}' has blank content",
            chunk.id
        );
    }
}
