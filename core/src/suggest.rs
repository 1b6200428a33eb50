//! Nearest-match suggestions for misspelled keywords and keys.

use strsim::normalized_damerau_levenshtein;

/// Minimum normalized Damerau-Levenshtein similarity for a suggestion.
/// Below this, candidates are considered unrelated and no suggestion
/// is offered.
const MIN_SIMILARITY: f64 = 0.5;

/// Returns the candidate most similar to `input`, if any candidate
/// clears the similarity cutoff. Ties keep the earliest candidate, so
/// canonical ordering of the candidate list doubles as the tie-break.
pub fn nearest<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(f64, &'a str)> = None;
    for candidate in candidates {
        let score = normalized_damerau_levenshtein(input, candidate);
        if best.map(|(top, _)| score > top).unwrap_or(true) {
            best = Some((score, candidate));
        }
    }
    best.filter(|(score, _)| *score > MIN_SIMILARITY)
        .map(|(_, candidate)| candidate)
}
