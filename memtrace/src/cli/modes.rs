//! Free-form report mode tokens
//!
//! Reports are chosen with bare words after the trace path, in any order.
//! A token selects a mode if it contains the mode's keyword; anything else
//! is ignored.

use crate::report::ReportSelection;

pub const MODE_UNFREED: &str = "unfreed";
pub const MODE_COUNTS: &str = "counts";
pub const MODE_TOO_BIG: &str = "toobig";
pub const MODE_ONE_AND_OVER: &str = "oneandover";
pub const MODE_NO_BACKTRACE: &str = "nobacktrace";
pub const MODE_CALLERS: &str = "callers";

/// Build a report selection from mode tokens
#[must_use]
pub fn parse_modes<S: AsRef<str>>(tokens: &[S]) -> ReportSelection {
    let has = |keyword: &str| tokens.iter().any(|token| token.as_ref().contains(keyword));

    ReportSelection {
        unfreed: has(MODE_UNFREED),
        counts: has(MODE_COUNTS),
        too_big: has(MODE_TOO_BIG),
        callers: has(MODE_CALLERS),
        significant_only: has(MODE_ONE_AND_OVER),
        backtraces: !has(MODE_NO_BACKTRACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tokens() {
        let selection = parse_modes::<&str>(&[]);
        assert_eq!(selection, ReportSelection::default());
        assert!(selection.backtraces);
    }

    #[test]
    fn test_order_independent() {
        let a = parse_modes(&["toobig", "unfreed", "nobacktrace"]);
        let b = parse_modes(&["nobacktrace", "unfreed", "toobig"]);
        assert_eq!(a, b);
        assert!(a.unfreed && a.too_big && !a.backtraces);
        assert!(!a.counts && !a.callers && !a.significant_only);
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let selection = parse_modes(&["verbose", "counts", "--", "42"]);
        assert_eq!(selection, ReportSelection { counts: true, ..ReportSelection::default() });
    }

    #[test]
    fn test_substring_match() {
        let selection = parse_modes(&["counts,oneandover", "callers"]);
        assert!(selection.counts);
        assert!(selection.significant_only);
        assert!(selection.callers);
    }
}
