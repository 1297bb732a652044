//! Parsing of interactive chat lines.

use docpair_core::prompt::CannedKind;
use docpair_session::SessionEvent;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Translate directly into a session event
    Event(SessionEvent),
    /// Print the checkbox list
    Docs,
    /// Print the full transcript
    History,
    Help,
    Exit,
    /// Blank line
    Empty,
    /// A slash command that needs fixing
    Invalid(String),
}

pub const HELP: &str = "\
  /select ID     select a document (a third selection replaces the oldest)
  /deselect ID   deselect a document
  /extract       extract key information from the selected documents
  /compare       compare the selected documents
  /reset         clear the conversation
  /docs          show the document list
  /history       show the conversation so far
  /help          show this help
  exit           quit
  anything else is sent as a question";

pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if matches!(line, "exit" | "quit" | "/exit" | "/quit") {
        return Command::Exit;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Command::Event(SessionEvent::Submit {
            question: line.to_string(),
        });
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name, arg) {
        ("select" | "deselect", "") => Command::Invalid(format!("/{name} needs a document id")),
        ("select", id) => toggle(id, true),
        ("deselect", id) => toggle(id, false),
        ("extract", _) => Command::Event(SessionEvent::Canned {
            kind: CannedKind::Extract,
        }),
        ("compare", _) => Command::Event(SessionEvent::Canned {
            kind: CannedKind::Compare,
        }),
        ("reset" | "clear", _) => Command::Event(SessionEvent::Reset),
        ("docs", _) => Command::Docs,
        ("history", _) => Command::History,
        ("help", _) => Command::Help,
        _ => Command::Invalid(format!("Unknown command /{name}, try /help")),
    }
}

fn toggle(identifier: &str, selected: bool) -> Command {
    Command::Event(SessionEvent::Toggle {
        identifier: identifier.to_string(),
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_is_a_question() {
        assert_eq!(
            parse_line("  What is the coupon rate?  "),
            Command::Event(SessionEvent::Submit {
                question: "What is the coupon rate?".into()
            })
        );
    }

    #[test]
    fn select_and_deselect_take_an_id() {
        assert_eq!(
            parse_line("/select 57582R2F2"),
            Command::Event(SessionEvent::Toggle {
                identifier: "57582R2F2".into(),
                selected: true
            })
        );
        assert_eq!(
            parse_line("/deselect   646039YM3 "),
            Command::Event(SessionEvent::Toggle {
                identifier: "646039YM3".into(),
                selected: false
            })
        );
        assert!(matches!(parse_line("/select"), Command::Invalid(_)));
    }

    #[test]
    fn canned_and_reset() {
        assert_eq!(
            parse_line("/extract"),
            Command::Event(SessionEvent::Canned {
                kind: CannedKind::Extract
            })
        );
        assert_eq!(
            parse_line("/compare"),
            Command::Event(SessionEvent::Canned {
                kind: CannedKind::Compare
            })
        );
        assert_eq!(parse_line("/reset"), Command::Event(SessionEvent::Reset));
    }

    #[test]
    fn local_commands() {
        assert_eq!(parse_line("/docs"), Command::Docs);
        assert_eq!(parse_line("/history"), Command::History);
        assert_eq!(parse_line("/help"), Command::Help);
        assert_eq!(parse_line("exit"), Command::Exit);
        assert_eq!(parse_line("   "), Command::Empty);
    }

    #[test]
    fn unknown_slash_command() {
        match parse_line("/frobnicate now") {
            Command::Invalid(msg) => assert!(msg.contains("/frobnicate")),
            other => panic!("Expected Invalid, got: {other:?}"),
        }
    }
}
