//! ReAct prompt assembly.

use std::fmt::Write;
use tracebank_core::rule::Rule;
use tracebank_core::trajectory::{RunMode, Trajectory};

const PREAMBLE: &str = r#"You are a tool-using agent.

You have access to the following tools:
1) python_exec(path): execute a Python script and extract the final numeric output.
2) xlsx_query(path, query): query an Excel spreadsheet and compute useful aggregates.

You should follow the ReAct style:
- Start with `Thought:` when you reason.
- When you want to use a tool, output a single line starting with `Action:`.
  The Action must be exactly one of the following forms:
    Action: python_exec("<path>")
    Action: xlsx_query("<path>", "<query>")
- When you are confident about the final result, output a line starting with `Answer:`.
"#;

const NO_RULES: &str = "(no prior rules available for this task)\n";

/// Everything that goes into one step's prompt.
pub struct PromptInput<'a> {
    pub mode: RunMode,
    pub question: &'a str,
    pub file_path: &'a str,
    pub trajectory: &'a Trajectory,
    pub reflections_used: usize,
    pub rules: &'a [Rule],
}

/// Render the prompt for the next step.
pub fn render(input: &PromptInput<'_>) -> String {
    let mut out = String::from(PREAMBLE);
    out.push('\n');

    if input.mode == RunMode::Enhanced {
        out.push_str("Here are some past reasoning strategies you may find useful:\n");
        out.push_str(&rules_block(input.rules));
        out.push_str("\n\n");
    }

    let _ = write!(
        out,
        "Question: {}\nAssociated file path: {}\n\nPrevious steps:\n{}\n\
         Reflections used so far: {}\n\n\
         Now continue with your next Thought (and possibly Action or Answer).\n",
        input.question,
        input.file_path,
        history(input.trajectory),
        input.reflections_used,
    );
    out
}

/// Prior steps, with action and observation for the steps that acted.
pub fn history(trajectory: &Trajectory) -> String {
    let mut out = String::new();
    for step in trajectory.steps() {
        let _ = writeln!(out, "Step {} Thought:\n{}", step.step, step.thought);
        if let Some(action) = &step.action {
            let observation = step
                .observation
                .as_ref()
                .and_then(|o| serde_json::to_string(o).ok())
                .unwrap_or_else(|| "null".into());
            let _ = writeln!(out, "Action: {action}\nObservation: {observation}");
        }
        out.push('\n');
    }
    out
}

fn rules_block(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return NO_RULES.to_string();
    }
    let mut lines = Vec::new();
    for rule in rules {
        lines.push(format!("- {} [tags: {}]", rule.title, rule.tags.join(", ")));
        lines.extend(rule.content.iter().map(|c| format!("  • {c}")));
    }
    lines.join("\n")
}
