//! Removal of `<think>...</think>` reasoning spans from reply text.

use std::sync::LazyLock;

use regex::Regex;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("think-span pattern is valid"));

/// Display form of raw reply text.
///
/// Every closed `<think>...</think>` span is removed (non-greedy, across
/// newlines) and the result is trimmed. An opening tag without a closing tag
/// is left in place, so a span still being streamed shows raw until it
/// closes.
///
/// ```
/// use chorus_orch::strip_thinking;
///
/// assert_eq!(strip_thinking("<think>hmm</think>\nHi"), "Hi");
/// assert_eq!(strip_thinking("  plain  "), "plain");
/// ```
#[must_use]
pub fn strip_thinking(raw: &str) -> String {
    THINK_SPAN.replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn removes_multiline_span() {
        assert_eq!(strip_thinking("<think>a\nb\nc</think>Answer"), "Answer");
    }

    #[test]
    fn removes_every_span_non_greedily() {
        let raw = "<think>x</think>one <think>y</think>two";
        assert_eq!(strip_thinking(raw), "one two");
    }

    #[test]
    fn unterminated_span_is_kept() {
        assert_eq!(strip_thinking("<think>still going"), "<think>still going");
    }

    #[test]
    fn only_thinking_is_empty() {
        assert_eq!(strip_thinking("<think>only</think>\n\n"), "");
    }

    proptest! {
        #[test]
        fn stripping_is_idempotent(raw in "(<think>|</think>|[a-z \n]){0,40}") {
            let once = strip_thinking(&raw);
            prop_assert_eq!(strip_thinking(&once), once.clone());
        }
    }
}
