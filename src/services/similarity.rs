use std::cmp::Ordering;

use strsim::levenshtein;

/// Weights of the title / secondary-field blend used to rank catalog candidates
///
/// Weights are always normalized so they sum to 1, which keeps every blended
/// score inside `[0, 1]` regardless of the configured values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    title: f64,
    secondary: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            title: 0.7,
            secondary: 0.3,
        }
    }
}

impl MatchWeights {
    /// Creates normalized weights; non-positive totals fall back to the default blend
    pub fn new(title: f64, secondary: f64) -> Self {
        let title = title.max(0.0);
        let secondary = secondary.max(0.0);
        let total = title + secondary;
        if !total.is_finite() || total <= 0.0 {
            return Self::default();
        }
        Self {
            title: title / total,
            secondary: secondary / total,
        }
    }

    pub fn title(&self) -> f64 {
        self.title
    }

    pub fn secondary(&self) -> f64 {
        self.secondary
    }

    /// Weighted similarity of a candidate against the generated title/secondary pair
    pub fn score(&self, title: &str, secondary: &str, candidate: (&str, &str)) -> f64 {
        self.title * similarity(title, candidate.0)
            + self.secondary * similarity(secondary, candidate.1)
    }
}

/// A candidate together with its blended similarity score
#[derive(Debug)]
pub struct Scored<'a, I> {
    pub item: &'a I,
    pub score: f64,
}

/// Casefolds, strips everything but letters, digits and spaces, and collapses whitespace
pub fn normalize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity in `[0, 1]` derived from the Levenshtein distance of the normalized strings
///
/// Two strings that normalize to empty are considered identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Ranks candidates best-first by the weighted title/secondary blend
///
/// `fields` projects a candidate onto its `(title, secondary)` pair. Ties keep
/// their original order.
pub fn rank_candidates<'a, I, F>(
    title: &str,
    secondary: &str,
    candidates: &'a [I],
    weights: &MatchWeights,
    fields: F,
) -> Vec<Scored<'a, I>>
where
    F: Fn(&I) -> (&str, &str),
{
    let mut scored: Vec<Scored<'a, I>> = candidates
        .iter()
        .map(|item| Scored {
            item,
            score: weights.score(title, secondary, fields(item)),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// Picks the candidate that best matches a generated title/secondary pair
///
/// A case-insensitive exact title match always wins (the best-scored one when
/// several share the title). Otherwise the top-ranked candidate is returned no
/// matter how low its score is; `None` only when there are no candidates.
pub fn best_match<'a, I, F>(
    title: &str,
    secondary: &str,
    candidates: &'a [I],
    weights: &MatchWeights,
    fields: F,
) -> Option<Scored<'a, I>>
where
    F: Fn(&I) -> (&str, &str),
{
    let wanted = title.trim().to_lowercase();
    let ranked = rank_candidates(title, secondary, candidates, weights, &fields);

    let exact = ranked
        .iter()
        .position(|s| fields(s.item).0.trim().to_lowercase() == wanted);

    let mut ranked = ranked;
    match exact {
        Some(index) => Some(ranked.swap_remove(index)),
        None => ranked.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(c: &(String, String)) -> (&str, &str) {
        (c.0.as_str(), c.1.as_str())
    }

    fn candidates(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(t, s)| (t.to_string(), s.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_strips_punctuation_and_whitespace() {
        assert_eq!(normalize("  The   Beatles! "), "the beatles");
        assert_eq!(normalize("Sgt. Pepper's Lonely-Hearts"), "sgt peppers lonelyhearts");
        assert_eq!(normalize("???"), "");
    }

    #[test]
    fn test_similarity_identity() {
        assert_eq!(similarity("Interstellar", "Interstellar"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("!!", "  "), 1.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [("kitten", "sitting"), ("Dune", "Dune Messiah"), ("", "abc")];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_similarity_decreases_with_distance() {
        let exact = similarity("abcd", "abcd");
        let one_edit = similarity("abcd", "abce");
        let two_edits = similarity("abcd", "abef");
        let four_edits = similarity("abcd", "wxyz");

        assert!(exact > one_edit);
        assert!(one_edit > two_edits);
        assert!(two_edits > four_edits);
        assert_eq!(one_edit, 0.75);
        assert_eq!(four_edits, 0.0);
    }

    #[test]
    fn test_similarity_ignores_case_and_punctuation() {
        assert_eq!(similarity("Abbey Road", "abbey-road"), 1.0 - 1.0 / 10.0);
        assert_eq!(similarity("ABBEY ROAD", "abbey road!"), 1.0);
    }

    #[test]
    fn test_weights_are_normalized() {
        let weights = MatchWeights::new(0.6, 0.6);
        assert_eq!(weights.title(), 0.5);
        assert_eq!(weights.secondary(), 0.5);

        let fallback = MatchWeights::new(0.0, 0.0);
        assert_eq!(fallback, MatchWeights::default());
    }

    #[test]
    fn test_best_match_prefers_exact_title() {
        let items = candidates(&[
            ("Interstellar Wars", "Christopher Nolan"),
            ("interstellar", "Someone Else"),
        ]);
        let best = best_match(
            "Interstellar",
            "Christopher Nolan",
            &items,
            &MatchWeights::default(),
            pair,
        )
        .unwrap();

        assert_eq!(best.item.0, "interstellar");
    }

    #[test]
    fn test_best_match_falls_back_to_top_score() {
        let items = candidates(&[("Zzz", "Nobody"), ("The Dark Knight Rises", "Nolan")]);
        let best = best_match("Dark Knight", "Nolan", &items, &MatchWeights::default(), pair)
            .unwrap();

        assert_eq!(best.item.0, "The Dark Knight Rises");
        assert!(best.score < 1.0);
    }

    #[test]
    fn test_best_match_accepts_low_scores() {
        let items = candidates(&[("Completely Different", "Unrelated")]);
        let best = best_match("Dune", "Herbert", &items, &MatchWeights::default(), pair);
        assert!(best.is_some());
    }

    #[test]
    fn test_best_match_empty() {
        let items: Vec<(String, String)> = Vec::new();
        assert!(best_match("Dune", "Herbert", &items, &MatchWeights::default(), pair).is_none());
    }

    #[test]
    fn test_rank_candidates_orders_best_first() {
        let items = candidates(&[
            ("Dune Messiah", "Herbert"),
            ("Dune", "Frank Herbert"),
            ("Emma", "Austen"),
        ]);
        let weights = MatchWeights::default();
        let ranked = rank_candidates("Dune", "Frank Herbert", &items, &weights, pair);

        let titles: Vec<&str> = ranked.iter().map(|s| s.item.0.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Dune Messiah", "Emma"]);
    }
}
