// src/process/sanitize.rs

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

const CURRENCY_SYMBOL: char = '$';
const THOUSANDS_SEPARATOR: char = ',';

/// Cleanup applied to one designated column of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeRule {
    /// Amount column: drop one leading currency symbol and all thousands separators.
    Currency,
    /// Count column of three-wide groups: drop all thousands separators.
    GroupedCount,
}

/// Return the cleaned text. Never fails: a missing symbol or separator is a no-op.
pub fn sanitize(value: &str, rule: SanitizeRule) -> String {
    match rule {
        SanitizeRule::Currency => {
            let v = value.strip_prefix(CURRENCY_SYMBOL).unwrap_or(value);
            strip_separators(v)
        }
        SanitizeRule::GroupedCount => strip_separators(value),
    }
}

fn strip_separators(value: &str) -> String {
    value.chars().filter(|&c| c != THOUSANDS_SEPARATOR).collect()
}

/// Apply the positional rules to a reshaped record in place:
/// currency on the last field, grouped-count on the second-to-last when
/// the group is exactly three wide.
pub fn sanitize_record(record: &mut [String]) {
    let width = record.len();
    if let Some(last) = record.last_mut() {
        *last = sanitize(last, SanitizeRule::Currency);
    }
    if width == 3 {
        record[1] = sanitize(&record[1], SanitizeRule::GroupedCount);
    }
}

/// Trim and replace every whitespace run with a single `_`,
/// e.g. `"New  York"` → `"New_York"`. Used for storage names.
pub fn underscore_whitespace(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name.trim(), "_").into_owned()
}

/// Characters that never appear in a storage name.
fn is_reserved(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Storage name for page-supplied text: whitespace runs and path
/// separators become `_`. `None` when nothing usable is left, i.e. the
/// result is empty or made only of dots.
pub fn storage_name(name: &str) -> Option<String> {
    let name: String = underscore_whitespace(name)
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();
    if name.chars().all(|c| c == '.') {
        return None;
    }
    Some(name)
}

/// True when `name` can be joined onto a directory as a single entry.
pub fn is_storage_name(name: &str) -> bool {
    storage_name(name).as_deref() == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn currency_strips_symbol_and_separators() {
        assert_eq!(sanitize("$1,234", SanitizeRule::Currency), "1234");
        assert_eq!(sanitize("$12,345,678", SanitizeRule::Currency), "12345678");
        assert_eq!(sanitize("500", SanitizeRule::Currency), "500");
        assert_eq!(sanitize("", SanitizeRule::Currency), "");
    }

    #[test]
    fn currency_is_idempotent() {
        let once = sanitize("$1,234", SanitizeRule::Currency);
        let twice = sanitize(&once, SanitizeRule::Currency);
        assert_eq!(once, twice);
    }

    #[test]
    fn only_one_leading_symbol_is_removed() {
        assert_eq!(sanitize("$$5", SanitizeRule::Currency), "$5");
        assert_eq!(sanitize("5$", SanitizeRule::Currency), "5$");
    }

    #[test]
    fn grouped_count_keeps_symbols() {
        assert_eq!(sanitize("1,200", SanitizeRule::GroupedCount), "1200");
        assert_eq!(sanitize("$1,200", SanitizeRule::GroupedCount), "$1200");
    }

    #[test]
    fn grouped_count_only_for_width_three() {
        let mut three = rec(&["0-10", "1,200", "500"]);
        sanitize_record(&mut three);
        assert_eq!(three, rec(&["0-10", "1200", "500"]));

        let mut two = rec(&["1,200", "$500"]);
        sanitize_record(&mut two);
        assert_eq!(two, rec(&["1,200", "500"]));
    }

    #[test]
    fn whitespace_runs_become_underscores() {
        assert_eq!(underscore_whitespace("  New   York "), "New_York");
        assert_eq!(underscore_whitespace("District of\nColumbia"), "District_of_Columbia");
        assert_eq!(underscore_whitespace("Texas"), "Texas");
    }

    #[test]
    fn storage_names_stay_inside_their_directory() {
        assert_eq!(storage_name("New York").as_deref(), Some("New_York"));
        assert_eq!(storage_name("Guam/Saipan").as_deref(), Some("Guam_Saipan"));
        assert_eq!(storage_name("../..").as_deref(), Some(".._.."));
        assert_eq!(storage_name("a\\b:c").as_deref(), Some("a_b_c"));
        assert_eq!(storage_name(".."), None);
        assert_eq!(storage_name(" . "), None);
        assert_eq!(storage_name(""), None);

        assert!(is_storage_name("District_of_Columbia"));
        assert!(!is_storage_name(".."));
        assert!(!is_storage_name("2022/Ohio"));
        assert!(!is_storage_name("New York"));
    }

    #[test]
    fn empty_record_is_untouched() {
        let mut empty: Vec<String> = Vec::new();
        sanitize_record(&mut empty);
        assert!(empty.is_empty());
    }
}
