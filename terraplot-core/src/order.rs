//! Key ordering for associative maps.
//!
//! Script authors index arrays with auto-numbered string keys `"1"`,
//! `"2"`, ... so enumeration must put `"10"` after `"2"`, not before it.
//! The comparator parses both keys as integers when possible and falls
//! back to lexical order otherwise. A mixed numeric/non-numeric key set
//! therefore gets a total but not especially meaningful order — that is a
//! documented quirk of the language, not something to fix here.

use std::cmp::Ordering;

/// Compare two map keys, numerically when both parse as integers.
#[must_use]
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.cmp(b),
    }
}

/// Sort a list of keys with [`compare_keys`].
pub fn sort_keys(keys: &mut [String]) {
    keys.sort_by(|a, b| compare_keys(a, b));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_sort_numerically() {
        let mut keys = vec!["10".to_owned(), "2".to_owned(), "1".to_owned()];
        sort_keys(&mut keys);
        assert_eq!(keys, ["1", "2", "10"]);
    }

    #[test]
    fn non_numeric_keys_fall_back_to_lexical() {
        let mut keys = vec!["b".to_owned(), "10a".to_owned(), "a".to_owned()];
        sort_keys(&mut keys);
        assert_eq!(keys, ["10a", "a", "b"]);
    }

    #[test]
    fn negative_numeric_keys() {
        let mut keys = vec!["3".to_owned(), "-5".to_owned(), "0".to_owned()];
        sort_keys(&mut keys);
        assert_eq!(keys, ["-5", "0", "3"]);
    }

    #[test]
    fn mixed_set_has_a_total_order() {
        // One numeric, one not: the pair compares lexically.
        assert_eq!(compare_keys("10", "a"), Ordering::Less);
        assert_eq!(compare_keys("a", "10"), Ordering::Greater);
        assert_eq!(compare_keys("2", "2"), Ordering::Equal);
    }
}
