//! Prompt composition.
//!
//! Two jobs: render the canned instructions behind the "extract" and
//! "compare" buttons, and wrap a question plus chat history into the single
//! instruction block sent with the attached documents.

use crate::message::{Role, Turn};
use crate::service::RemoteHandle;
use serde::{Deserialize, Serialize};

const TEMPLATE_HEAD: &str = "<s>[INST]Analyze all provided PDF documents. \
You are a Municipal bonds documents analyzer chat bot.\n\
Your goal is to deliver professional, precise, and contextually relevant information \
pertaining to all of the uploaded files.";

const TEMPLATE_TAIL: &str = "ANSWER:\n</s>[INST]";

const TABLE_HINT: &str = "Present the information clearly, preferably in a table.";

/// The canned actions offered next to the chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CannedKind {
    /// Extract the CUSIP list from each document
    Extract,
    /// Compare the key differences between the documents
    Compare,
}

impl CannedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CannedKind::Extract => "extract",
            CannedKind::Compare => "compare",
        }
    }
}

/// Everything sent to the model for one request.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    /// The composed instruction block
    pub instruction: String,

    /// Remote files in selection order
    pub documents: Vec<RemoteHandle>,
}

/// Join identifiers for prose: "A and B" for a pair, "A, B, C" otherwise.
fn join_identifiers(identifiers: &[String]) -> String {
    match identifiers {
        [a, b] => format!("{a} and {b}"),
        _ => identifiers.join(", "),
    }
}

/// Instruction text for a canned action.
///
/// With fewer than two documents selected the text refers to all uploaded
/// documents and names none of them.
pub fn build_canned_prompt(kind: CannedKind, selected: &[String]) -> String {
    let named = (selected.len() >= 2).then(|| join_identifiers(selected));

    match (kind, named) {
        (CannedKind::Extract, Some(names)) => format!(
            "Analyze all provided PDF documents, related to {names}. Don't miss any of the CUSIP.\n\
             Extract the CUSIP list with details from each bond's document.\n{TABLE_HINT}"
        ),
        (CannedKind::Extract, None) => format!(
            "Analyze all uploaded documents. Don't miss any of the CUSIP.\n\
             Extract the CUSIP list with details from each bond's document.\n{TABLE_HINT}"
        ),
        (CannedKind::Compare, Some(names)) => format!(
            "Analyze the documents for {names}, compare the key differences between them.\n{TABLE_HINT}"
        ),
        (CannedKind::Compare, None) => format!(
            "Analyze all uploaded documents, compare the key differences between them.\n{TABLE_HINT}"
        ),
    }
}

/// Render the user side of the transcript as `Role: text` lines.
pub fn chat_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .filter(|t| t.role != Role::Assistant)
        .map(|t| format!("{}: {}", t.role, t.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a question and the transcript into the instruction block.
pub fn compose(question: &str, turns: &[Turn]) -> String {
    format!(
        "\n{TEMPLATE_HEAD}\nCHAT HISTORY: {}\nQUESTION: {question}\n{TEMPLATE_TAIL}\n",
        chat_history(turns)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extract_names_both_documents() {
        let text = build_canned_prompt(CannedKind::Extract, &ids(&["A", "B"]));
        assert!(text.contains("A and B"));
        assert!(text.contains("CUSIP"));
    }

    #[test]
    fn extract_without_selection_is_generic() {
        let text = build_canned_prompt(CannedKind::Extract, &[]);
        assert!(text.contains("all uploaded documents"));
        assert!(!text.contains(" and "));
    }

    #[test]
    fn single_selection_is_generic() {
        let text = build_canned_prompt(CannedKind::Compare, &ids(&["57582R2F2"]));
        assert!(text.contains("all uploaded documents"));
        assert!(!text.contains("57582R2F2"));
    }

    #[test]
    fn more_than_two_are_comma_separated() {
        let text = build_canned_prompt(CannedKind::Compare, &ids(&["A", "B", "C"]));
        assert!(text.contains("A, B, C"));
        assert!(!text.contains("A and B"));
    }

    #[test]
    fn history_skips_assistant_turns() {
        let turns = vec![
            Turn::user("First question"),
            Turn::assistant("First answer"),
            Turn::user("Second question"),
        ];
        assert_eq!(
            chat_history(&turns),
            "User: First question\nUser: Second question"
        );
    }

    #[test]
    fn compose_includes_history_and_question() {
        let turns = vec![Turn::user("What is the par amount?")];
        let text = compose("What is the par amount?", &turns);
        assert!(text.contains("Municipal bonds documents analyzer"));
        assert!(text.contains("CHAT HISTORY: User: What is the par amount?"));
        assert!(text.contains("QUESTION: What is the par amount?"));
        assert!(text.contains("ANSWER:"));
    }

    #[test]
    fn compose_with_empty_history() {
        let text = compose("Hello", &[]);
        assert!(text.contains("CHAT HISTORY: \n"));
    }
}
