//! "Did you mean" suggestions for misspelled capability names.

/// Largest edit distance still offered as a suggestion.
pub const MAX_SUGGESTION_DISTANCE: usize = 2;

/// Levenshtein edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row of the DP matrix
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// The closest candidate within [`MAX_SUGGESTION_DISTANCE`] of `name`.
/// Ties go to the earlier candidate; an exact match is no suggestion.
pub fn suggest<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| (1..=MAX_SUGGESTION_DISTANCE).contains(distance))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("cirle", "circle"), 1);
        assert_eq!(levenshtein("rektangel", "rectangle"), 3);
        assert_eq!(levenshtein("å", "ä"), 1);
    }

    #[test]
    fn test_suggest_closest() {
        let names = ["circle", "clear", "ring"];
        assert_eq!(suggest("cirle", names), Some("circle"));
        assert_eq!(suggest("rin", names), Some("ring"));
        assert_eq!(suggest("triangle", names), None);
        assert_eq!(suggest("clear", names), None);
    }

    #[test]
    fn test_ties_prefer_first_candidate() {
        assert_eq!(suggest("lin", ["line", "lint"]), Some("line"));
    }
}
