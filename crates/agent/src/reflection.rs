//! Reflection notes and rule synthesis.

use serde_json::json;
use tracebank_core::rule::{Polarity, RuleCandidate};
use tracebank_core::trajectory::Trajectory;

/// The note recorded on every reflection step.
pub const REFLECTION_NOTE: &str =
    "I should reconsider my previous tool choices and double-check the results.";

const CHECKLIST: [&str; 2] = [
    "Always inspect the tool output (e.g., Python stdout or spreadsheet rows) carefully \
     before answering.",
    "If the question asks for a comparison or probability, explicitly compute all relevant \
     numeric values using tools first.",
];

/// Tags describing a task, from the file extension and question keywords.
pub fn infer_tags(question: &str, file_path: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let question = question.to_lowercase();

    if file_path.ends_with(".xlsx") {
        tags.push("xlsx");
        tags.push("spreadsheet");
    }
    if file_path.ends_with(".py") {
        tags.push("python");
    }
    let keywords = [("sales", "sales"), ("city", "city"), ("operating", "operating_status")];
    for (keyword, tag) in keywords {
        if question.contains(keyword) {
            tags.push(tag);
        }
    }

    tags.into_iter().map(String::from).collect()
}

/// Distill the trajectory so far into rule candidates.
///
/// Polarity follows the most recent observation: failure if it was an
/// error, success otherwise. Currently always yields one candidate.
pub fn synthesize_rules(
    question: &str,
    file_path: &str,
    trajectory: &Trajectory,
) -> Vec<RuleCandidate> {
    let tags = infer_tags(question, file_path);
    let polarity = match trajectory.last_observation() {
        Some(obs) if obs.is_error() => Polarity::Failure,
        _ => Polarity::Success,
    };

    let subject = if tags.is_empty() { "this".to_string() } else { tags.join(", ") };

    let candidate = RuleCandidate::new(format!("Strategy for {subject} task"), polarity)
        .with_description(format!("Reusable rule distilled from a {polarity} trajectory."))
        .with_content(CHECKLIST.iter().map(|s| s.to_string()).collect())
        .with_tags(tags)
        .with_evidence(json!([format!("traj_step#{}", trajectory.last_step_index())]));

    vec![candidate]
}
