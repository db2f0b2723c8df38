//! Pure helpers that turn retrieved chunks into model context and a score.

use itertools::Itertools;

use crate::search::RetrievedChunk;

/// Separator placed between sources in the context string
pub const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

/// Join chunks into one context string, labelling each with its 1-based
/// position and similarity percentage. Input order is kept as is.
///
/// Percentages are rounded to one decimal with ties going up, so 82.25%
/// is labelled 82.3%.
#[inline]
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            format!(
                "[Source {}] (Similarity: {:.1}%)\n{}",
                index + 1,
                similarity_percent(chunk.similarity),
                chunk.text
            )
        })
        .join(SOURCE_SEPARATOR)
}

// `{:.1}` alone rounds exact ties to even
fn similarity_percent(similarity: f64) -> f64 {
    (similarity * 100.0 * 10.0).round() / 10.0
}

/// Mean similarity of the retrieved chunks, clamped to `[0, 1]` and rounded
/// to two decimals. Zero when nothing was retrieved.
///
/// This measures how close the evidence is to the query, not whether the
/// generated answer is correct. Non-finite similarities count as zero.
#[inline]
pub fn estimate_confidence(chunks: &[RetrievedChunk]) -> f64 {
    if chunks.is_empty() {
        return 0.0;
    }

    let total: f64 = chunks
        .iter()
        .map(|chunk| {
            if chunk.similarity.is_finite() {
                chunk.similarity
            } else {
                0.0
            }
        })
        .sum();
    let mean = total / chunks.len() as f64;

    (mean.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, similarity: f64) -> RetrievedChunk {
        RetrievedChunk::new(text, text, similarity)
    }

    #[test]
    fn empty_context() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn context_labels_sources_in_order() {
        let chunks = vec![chunk("A", 0.823), chunk("B", 0.5)];

        assert_eq!(
            build_context(&chunks),
            "[Source 1] (Similarity: 82.3%)\nA\n\n---\n\n[Source 2] (Similarity: 50.0%)\nB"
        );
    }

    #[test]
    fn context_percentages_round_ties_up() {
        let labels: Vec<String> = [0.8225, 0.0025, 0.1225, 0.0125, 0.5625]
            .into_iter()
            .map(|similarity| build_context(&[chunk("x", similarity)]))
            .collect();

        assert_eq!(
            labels,
            vec![
                "[Source 1] (Similarity: 82.3%)\nx",
                "[Source 1] (Similarity: 0.3%)\nx",
                "[Source 1] (Similarity: 12.3%)\nx",
                "[Source 1] (Similarity: 1.3%)\nx",
                "[Source 1] (Similarity: 56.3%)\nx",
            ]
        );
    }

    #[test]
    fn context_does_not_resort() {
        let chunks = vec![chunk("low", 0.4), chunk("high", 0.95)];
        let context = build_context(&chunks);

        assert!(context.starts_with("[Source 1] (Similarity: 40.0%)\nlow"));
        assert!(context.ends_with("[Source 2] (Similarity: 95.0%)\nhigh"));
    }

    #[test]
    fn context_uses_display_text() {
        let mut retrieved = chunk("raw", 1.0);
        retrieved.text = "Heading\nraw".to_string();

        assert_eq!(
            build_context(&[retrieved]),
            "[Source 1] (Similarity: 100.0%)\nHeading\nraw"
        );
    }

    #[test]
    fn confidence_of_nothing_is_zero() {
        assert!(estimate_confidence(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_grows_with_similarity() {
        let strong = estimate_confidence(&[chunk("a", 0.9), chunk("b", 0.9)]);
        let weak = estimate_confidence(&[chunk("a", 0.5), chunk("b", 0.5)]);

        assert!(strong > weak);
        assert!((strong - 0.9).abs() < 1e-9);
        assert!((weak - 0.5).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_rounded_mean() {
        let score = estimate_confidence(&[chunk("a", 0.823), chunk("b", 0.7), chunk("c", 0.71)]);
        assert!((score - 0.74).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_clamped() {
        assert!((estimate_confidence(&[chunk("a", 1.4)]) - 1.0).abs() < f64::EPSILON);
        assert!(estimate_confidence(&[chunk("a", -0.3)]).abs() < f64::EPSILON);
        assert!(estimate_confidence(&[chunk("a", f64::NAN)]).abs() < f64::EPSILON);
    }
}
