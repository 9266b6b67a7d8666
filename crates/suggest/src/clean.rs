//! Custom data cleaning
//!
//! The analytics service only stores scalar custom dimensions of at most
//! [`CUSTOM_DATA_MAX_LENGTH`] characters, so lists such as the partial query
//! history travel as a single `;`-joined string trimmed from the oldest end.

/// Longest value the service keeps for one custom dimension
pub const CUSTOM_DATA_MAX_LENGTH: usize = 256;

/// Separator used to join list entries
pub const CUSTOM_DATA_DELIMITER: char = ';';

/// How much the budget shrinks on each retry
const BUDGET_STEP: usize = 10;

/// Clean `entries` into a transport-safe string using the default budget
pub fn clean_custom_data<S: AsRef<str>>(entries: &[S]) -> String {
    clean_custom_data_with_budget(entries, CUSTOM_DATA_MAX_LENGTH)
}

/// Clean `entries` into a `;`-joined string shorter than
/// [`CUSTOM_DATA_MAX_LENGTH`]
///
/// Consecutive duplicates and empty entries are dropped and the delimiter is
/// stripped from every entry. The newest entries whose summed length fits in
/// `reject_length` are kept; if the joined result is still too long the
/// budget is reduced by ten and the kept entries are trimmed again.
pub fn clean_custom_data_with_budget<S: AsRef<str>>(entries: &[S], reject_length: usize) -> String {
    let mut kept = collapse(entries);
    let mut budget = reject_length;

    loop {
        kept = newest_within(kept, budget);
        let joined = kept.join(&CUSTOM_DATA_DELIMITER.to_string());
        if joined.chars().count() < CUSTOM_DATA_MAX_LENGTH {
            return joined;
        }
        budget = budget.saturating_sub(BUDGET_STEP);
    }
}

fn collapse<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    let mut previous: Option<&str> = None;
    let mut collapsed = Vec::with_capacity(entries.len());

    for entry in entries.iter().map(AsRef::as_ref) {
        if previous == Some(entry) {
            continue;
        }
        previous = Some(entry);

        let stripped: String = entry
            .chars()
            .filter(|c| *c != CUSTOM_DATA_DELIMITER)
            .collect();
        if !stripped.is_empty() {
            collapsed.push(stripped);
        }
    }

    collapsed
}

/// Longest trailing run whose summed lengths stay within `budget`
fn newest_within(entries: Vec<String>, budget: usize) -> Vec<String> {
    let mut total = 0;
    let mut start = entries.len();

    for (index, entry) in entries.iter().enumerate().rev() {
        total += entry.chars().count();
        if total > budget {
            break;
        }
        start = index;
    }

    entries.into_iter().skip(start).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_duplicates_collapse() {
        assert_eq!(clean_custom_data(&["a", "a", "b"]), "a;b");
    }

    #[test]
    fn test_non_consecutive_duplicates_are_kept() {
        assert_eq!(clean_custom_data(&["a", "b", "a"]), "a;b;a");
    }

    #[test]
    fn test_delimiter_is_stripped() {
        assert_eq!(clean_custom_data(&["a;b", "c"]), "ab;c");
        assert_eq!(clean_custom_data(&[";", "c"]), "c");
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        assert_eq!(clean_custom_data(&["", "r", "", "ru"]), "r;ru");
        assert_eq!(clean_custom_data::<&str>(&[]), "");
    }

    #[test]
    fn test_long_history_keeps_newest_entries() {
        let entries: Vec<String> = (0..30).map(|i| format!("partial-query-{:04}", i)).collect();
        let cleaned = clean_custom_data(&entries);

        assert!(cleaned.chars().count() < CUSTOM_DATA_MAX_LENGTH);
        assert!(cleaned.ends_with("partial-query-0029"));
        assert!(!cleaned.contains("partial-query-0000"));

        let kept: Vec<&str> = cleaned.split(CUSTOM_DATA_DELIMITER).collect();
        let expected: Vec<&str> = entries[entries.len() - kept.len()..]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_separators_trigger_budget_retry() {
        // 10 entries of 25 chars fit the 256 budget, but joined they are 259 long
        let entries: Vec<String> = (0..10).map(|i| format!("{:0>25}", i)).collect();
        let cleaned = clean_custom_data(&entries);

        assert!(cleaned.chars().count() < CUSTOM_DATA_MAX_LENGTH);
        assert_eq!(cleaned.split(CUSTOM_DATA_DELIMITER).count(), 9);
        assert!(cleaned.ends_with(&format!("{:0>25}", 9)));
    }

    #[test]
    fn test_single_oversized_entry_is_dropped() {
        let huge = "x".repeat(400);
        assert_eq!(clean_custom_data(&[huge.as_str()]), "");
        assert_eq!(clean_custom_data(&["old", huge.as_str(), "new"]), "new");
    }

    #[test]
    fn test_lengths_count_characters() {
        let entries = vec!["é".repeat(200), "ü".repeat(50)];
        let cleaned = clean_custom_data(&entries);
        assert_eq!(cleaned.chars().count(), 250);
        assert!(cleaned.starts_with('é'));
    }
}
