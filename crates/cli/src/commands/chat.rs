//! `docpair chat`: Interactive or single-request chat.

use super::input::{self, Command};
use super::{load_config, render};
use docpair_config::{AppConfig, ConfigError, API_KEY_VARS};
use docpair_core::message::Role;
use docpair_core::prompt::CannedKind;
use docpair_core::service::LocalFiles;
use docpair_session::{Outcome, Session, SessionEvent, UploadPolicy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// Options for `docpair chat`.
#[derive(Debug, Default)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub select: Vec<String>,
    pub extract: bool,
    pub compare: bool,
}

impl ChatRequest {
    /// The event to run once and exit on, if any.
    fn single_shot(&self) -> Option<SessionEvent> {
        if self.extract {
            Some(SessionEvent::Canned {
                kind: CannedKind::Extract,
            })
        } else if self.compare {
            Some(SessionEvent::Canned {
                kind: CannedKind::Compare,
            })
        } else {
            self.message.as_ref().map(|question| SessionEvent::Submit {
                question: question.clone(),
            })
        }
    }
}

pub async fn run(
    path: Option<&Path>,
    request: ChatRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;

    let service = match docpair_providers::build_from_config(&config) {
        Ok(service) => service,
        Err(ConfigError::MissingCredentials(vars)) => {
            print_missing_key_help();
            return Err(ConfigError::MissingCredentials(vars).into());
        }
        Err(e) => return Err(e.into()),
    };

    let registry = Arc::new(config.registry());
    let mut session = Session::new(registry, service, Arc::new(LocalFiles)).with_upload_policy(
        UploadPolicy {
            max_attempts: config.upload.max_attempts,
            retry_delay: config.upload.retry_delay(),
        },
    );
    tracing::debug!(session = %session.id(), model = %config.model, "Session started");

    for identifier in &request.select {
        let outcome = session
            .handle(SessionEvent::Toggle {
                identifier: identifier.clone(),
                selected: true,
            })
            .await;
        print_warnings(&outcome);
    }

    if let Some(event) = request.single_shot() {
        eprint!("  Thinking...");
        let outcome = session.handle(event).await;
        eprint!("\r              \r");
        print_warnings(&outcome);
        return match outcome {
            Outcome::Replied { reply, .. } => {
                println!("{reply}");
                Ok(())
            }
            Outcome::Failed { error, .. } => Err(error.into()),
            _ => Err("Nothing to send".into()),
        };
    }

    interactive(&config, &mut session).await
}

async fn interactive(
    config: &AppConfig,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  {}", config.title);
    println!("  {}", "=".repeat(config.title.chars().count()));
    println!();
    println!("  Model:     {}", config.model);
    println!("  Documents: {}", config.documents_dir.display());
    println!();
    println!("{}", render::checkboxes(&session.checkboxes()));
    println!();
    println!("  Select up to two documents, then ask away. /help lists commands.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match input::parse_line(&line) {
            Command::Exit => break,
            Command::Empty => {}
            Command::Help => println!("{}\n", input::HELP),
            Command::Docs => println!("{}\n", render::checkboxes(&session.checkboxes())),
            Command::History => {
                println!("{}\n", render::transcript(session.conversation().turns()))
            }
            Command::Invalid(msg) => println!("  {msg}\n"),
            Command::Event(event) => {
                let canned = matches!(event, SessionEvent::Canned { .. });
                let sends_request = canned || matches!(event, SessionEvent::Submit { .. });
                if sends_request {
                    eprint!("  ...");
                }
                let outcome = session.handle(event).await;
                if sends_request {
                    eprint!("\r     \r");
                }
                show(session, &outcome, canned);
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn show(session: &Session, outcome: &Outcome, canned: bool) {
    print_warnings(outcome);
    match outcome {
        Outcome::SelectionChanged { evicted, .. } => {
            if let Some(old) = evicted {
                println!("  {old} was deselected to make room.");
            }
            println!("{}\n", render::checkboxes(&session.checkboxes()));
        }
        Outcome::Replied { reply, attached, .. } => {
            // Canned prompts were never typed, so echo them
            if canned {
                if let Some(question) = session
                    .conversation()
                    .turns()
                    .iter()
                    .rev()
                    .find(|t| t.role == Role::User)
                {
                    println!("{}", render::turn(Role::User, &question.text));
                }
            }
            if attached.is_empty() {
                println!("  (no documents attached)");
            }
            println!();
            println!("{}", render::turn(Role::Assistant, reply));
            println!();
        }
        Outcome::Failed { error, .. } => {
            eprintln!("  [Error] {error}");
            println!();
        }
        Outcome::Reset => println!("  Conversation cleared.\n"),
        Outcome::Ignored { .. } => {}
    }
}

fn print_warnings(outcome: &Outcome) {
    for warning in outcome.warnings() {
        eprintln!("{}", render::warning(warning));
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_missing_key_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in .env):");
    for var in API_KEY_VARS {
        eprintln!("    {var}");
    }
    eprintln!();
    eprintln!("  Or add api_key to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}
