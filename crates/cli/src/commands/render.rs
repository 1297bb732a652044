//! Terminal rendering for the chat view.

use docpair_core::error::DocumentError;
use docpair_core::message::{Role, Turn};
use docpair_core::selection::Checkbox;

/// The document list, one checkbox per line.
pub fn checkboxes(rows: &[Checkbox]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "  [{}] {:<12} {}",
                if row.checked { "x" } else { " " },
                row.identifier,
                row.label
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn prefix(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// Prefix every line of `text` with the speaker.
pub fn turn(role: Role, text: &str) -> String {
    let prefix = prefix(role);
    text.lines()
        .map(|line| format!("  {prefix} > {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The whole conversation, blank line between turns.
pub fn transcript(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "  (no conversation yet)".into();
    }
    turns
        .iter()
        .map(|t| turn(t.role, &t.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn warning(error: &DocumentError) -> String {
    format!("  ⚠️  {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_rows_mark_selection() {
        let rows = vec![
            Checkbox {
                identifier: "57582R2F2".into(),
                label: "57582R2F2 Official Statement".into(),
                checked: true,
            },
            Checkbox {
                identifier: "646039YM3".into(),
                label: "646039YM3 Official Statement".into(),
                checked: false,
            },
        ];
        let out = checkboxes(&rows);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  [x] 57582R2F2"));
        assert!(lines[1].starts_with("  [ ] 646039YM3"));
    }

    #[test]
    fn multiline_turn_is_prefixed() {
        let out = turn(Role::Assistant, "| CUSIP |\n| --- |");
        assert_eq!(out, "  Assistant > | CUSIP |\n  Assistant > | --- |");
    }

    #[test]
    fn transcript_orders_turns() {
        let turns = vec![Turn::user("Coupon?"), Turn::assistant("5%")];
        assert_eq!(transcript(&turns), "  You > Coupon?\n\n  Assistant > 5%");
        assert!(transcript(&[]).contains("no conversation"));
    }

    #[test]
    fn warning_names_document() {
        let err = DocumentError::NotFound("ZZZ".into());
        assert!(warning(&err).contains("ZZZ"));
    }
}
