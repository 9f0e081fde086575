//! Reading the model's free-text completion.
//!
//! A completion either carries an `Answer:` marker, or an `Action:` line in
//! one of two shapes:
//!
//! ```text
//! Action: python_exec("<path>")
//! Action: xlsx_query("<path>", "<query>")
//! ```
//!
//! Quotes may be single or double. Arguments are matched non-greedily and
//! escape sequences are not interpreted. Anything else is "no action".

use regex::Regex;
use std::sync::LazyLock;
use tracebank_core::Action;

pub const ANSWER_MARKER: &str = "Answer:";

const ACTION_MARKER: &str = "action:";

static SCRIPT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^python_exec\(["'](.+?)["']\)"#).unwrap());

static SPREADSHEET_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^xlsx_query\(["'](.+?)["']\s*,\s*["'](.+?)["']\)"#).unwrap()
});

/// Text after the first answer marker, trimmed. `None` when there is no marker.
pub fn extract_answer(completion: &str) -> Option<String> {
    completion
        .find(ANSWER_MARKER)
        .map(|at| completion[at + ANSWER_MARKER.len()..].trim().to_string())
}

/// Body of the first `Action:` line (case-insensitive marker), trimmed.
pub fn action_line(completion: &str) -> Option<&str> {
    completion
        .lines()
        .map(str::trim)
        .find(|line| line.to_lowercase().starts_with(ACTION_MARKER))
        .and_then(|line| line.split_once(':'))
        .map(|(_, body)| body.trim())
}

/// Parse the first action line into a typed [`Action`].
pub fn parse_action(completion: &str) -> Option<Action> {
    let body = action_line(completion)?;

    if let Some(caps) = SCRIPT_RUN.captures(body) {
        return Some(Action::ScriptRun(caps[1].to_string()));
    }

    SPREADSHEET_QUERY
        .captures(body)
        .map(|caps| Action::SpreadsheetQuery {
            path: caps[1].to_string(),
            query: caps[2].to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_run() {
        let action = parse_action("Thought: run it\nAction: python_exec(\"script.py\")");
        assert_eq!(action, Some(Action::ScriptRun("script.py".into())));
    }

    #[test]
    fn parses_spreadsheet_query() {
        let action = parse_action("Action: xlsx_query(\"data.xlsx\", \"total sales by city\")");
        assert_eq!(
            action,
            Some(Action::SpreadsheetQuery {
                path: "data.xlsx".into(),
                query: "total sales by city".into(),
            })
        );
    }

    #[test]
    fn single_quotes_and_marker_case() {
        let action = parse_action("  ACTION:   python_exec('a b.py')  ");
        assert_eq!(action, Some(Action::ScriptRun("a b.py".into())));
    }

    #[test]
    fn unknown_verb_or_missing_quotes_is_none() {
        assert_eq!(parse_action("Action: shell(\"ls\")"), None);
        assert_eq!(parse_action("Action: python_exec(script.py)"), None);
        assert_eq!(parse_action("Action: xlsx_query(\"a.xlsx\")"), None);
        assert_eq!(parse_action("Thought: nothing to do"), None);
        assert_eq!(parse_action(""), None);
    }

    #[test]
    fn only_first_action_line_counts() {
        let text = "Action: nonsense\nAction: python_exec(\"b.py\")";
        assert_eq!(parse_action(text), None);
    }

    #[test]
    fn non_greedy_argument() {
        let action = parse_action("Action: python_exec(\"a.py\") and python_exec(\"b.py\")");
        assert_eq!(action, Some(Action::ScriptRun("a.py".into())));
    }

    #[test]
    fn answer_extraction() {
        assert_eq!(extract_answer("Thought: done\nAnswer:  42 \n"), Some("42".into()));
        assert_eq!(extract_answer("Answer: a Answer: b"), Some("a Answer: b".into()));
        assert_eq!(extract_answer("Thought: hmm"), None);
    }

    #[test]
    fn action_line_body() {
        assert_eq!(
            action_line("x\naction: xlsx_query('f', 'select a from b')"),
            Some("xlsx_query('f', 'select a from b')")
        );
    }
}
