//! Token-level edit distance.

/// Levenshtein distance between two token sequences.
///
/// Tokens are compared whole: `["a", "b"]` vs `["a", "c"]` is one
/// substitution, regardless of the tokens' lengths. Insertions, deletions
/// and substitutions each cost 1.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> u32 {
    if a.is_empty() {
        return b.len() as u32;
    }
    if b.is_empty() {
        return a.len() as u32;
    }

    // Two rolling rows over `b`.
    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        curr[0] = i as u32 + 1;
        for (j, y) in b.iter().enumerate() {
            let substitute = prev[j] + u32::from(x != y);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn identical_sequences_cost_nothing() {
        let a = tokens(&["web", "frontend"]);
        assert_eq!(edit_distance(&a, &a), 0);
    }

    #[test]
    fn empty_against_non_empty_is_length() {
        let a = tokens(&["x", "y", "z"]);
        assert_eq!(edit_distance(&a, &[]), 3);
        assert_eq!(edit_distance(&[], &a), 3);
        assert_eq!(edit_distance::<String>(&[], &[]), 0);
    }

    #[test]
    fn tokens_are_atomic() {
        // One substitution, even though the strings differ in many characters.
        let a = tokens(&["a", "database-primary"]);
        let b = tokens(&["a", "c"]);
        assert_eq!(edit_distance(&a, &b), 1);
    }

    #[test]
    fn mixed_operations() {
        // kitten -> sitting, token by token.
        let a = tokens(&["k", "i", "t", "t", "e", "n"]);
        let b = tokens(&["s", "i", "t", "t", "i", "n", "g"]);
        assert_eq!(edit_distance(&a, &b), 3);
    }

    #[test]
    fn order_matters() {
        let a = tokens(&["a", "b"]);
        let b = tokens(&["b", "a"]);
        assert_eq!(edit_distance(&a, &b), 2);
    }
}
