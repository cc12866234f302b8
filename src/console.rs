//! Terminal shell for one assistant session — reads lines from stdin,
//! forwards them to [`Session::submit`], prints the transcript as it grows.
//!
//! Runs until the `shutdown` token is cancelled (Ctrl-C), `:quit` is typed,
//! or stdin is closed. The session is disposed on the way out, so a reply
//! still pending at that point is dropped.

use std::io::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assistant::{Rejected, Session};
use crate::error::AppError;

// ── Commands ─────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Free text for the assistant.
    Say(&'a str),
    /// `:N` — submit the N-th suggested prompt (1-based).
    Prompt(usize),
    /// `:transcript` — dump the transcript as JSON.
    Transcript,
    Help,
    Quit,
    Unknown(&'a str),
}

pub fn parse_command(line: &str) -> Command<'_> {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return Command::Say(line);
    };
    match rest {
        "q" | "quit" | "exit" => Command::Quit,
        "t" | "transcript" => Command::Transcript,
        "h" | "help" | "?" => Command::Help,
        n => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Prompt(n),
            _ => Command::Unknown(n),
        },
    }
}

// ── Shell ────────────────────────────────────────────────────────────────────

/// Renders a session onto stdout. Tracks how much of the transcript has
/// already been printed.
struct Shell<'a> {
    session: &'a Session,
    shown: usize,
}

impl<'a> Shell<'a> {
    fn new(session: &'a Session) -> Self {
        Self { session, shown: 0 }
    }

    fn render_new(&mut self) {
        let transcript = self.session.transcript();
        for message in transcript.iter().skip(self.shown) {
            println!("{message}");
        }
        self.shown = transcript.len();
    }

    fn render_prompts(&self) {
        let prompts = self.session.suggested_prompts();
        if prompts.is_empty() {
            return;
        }
        println!("Quick questions:");
        for (i, p) in prompts.iter().enumerate() {
            println!("  :{}  {p}", i + 1);
        }
    }

    /// Submit `text` and wait for the reply, unless shutdown comes first.
    async fn say(&mut self, text: &str, shutdown: &CancellationToken) {
        match self.session.submit(text) {
            Ok(()) => {}
            Err(Rejected::EmptyInput) => return,
            Err(e) => {
                debug!("submission declined: {e}");
                return;
            }
        }
        self.render_new();

        let session = self.session;
        if session.is_awaiting_response() {
            println!("  … assistant is typing");
        }
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {}
            _ = session.settled() => self.render_new(),
        }
    }
}

fn print_help() {
    println!("  :1 .. :N      ask a quick question (only before your first message)");
    println!("  :transcript   print the conversation as JSON");
    println!("  :quit         close the assistant");
}

/// Drive `session` from stdin until shutdown, `:quit`, or EOF.
pub async fn run(
    session: &Session,
    title: &str,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with(session, title, stdin, shutdown).await
}

/// [`run`] over any line source.
pub async fn run_with<R>(
    session: &Session,
    title: &str,
    input: R,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    info!(session_id = %session.id(), "console started — type a message and press Enter. Ctrl-C to quit.");
    println!("─────────────────────────────────");
    println!(" {title}  (:help, Ctrl-C to quit)");
    println!("─────────────────────────────────");

    let mut shell = Shell::new(session);
    shell.render_new();
    shell.render_prompts();

    let mut lines = input.lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\n[console] shutdown signal received — closing assistant");
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("console read error: {e}");
                break;
            }
            Ok(None) => {
                info!("console stdin closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        match parse_command(&input) {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Transcript => {
                let json = serde_json::to_string_pretty(&session.transcript())
                    .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
                println!("{json}");
            }
            Command::Prompt(n) => {
                let prompts = session.suggested_prompts();
                match prompts.get(n - 1) {
                    Some(prompt) => shell.say(prompt, &shutdown).await,
                    None if prompts.is_empty() => println!("(quick questions are no longer offered)"),
                    None => println!("(pick a number between 1 and {})", prompts.len()),
                }
            }
            Command::Unknown(cmd) => println!("unknown command ':{cmd}' — try :help"),
            Command::Say(text) => shell.say(text, &shutdown).await,
        }
    }

    session.dispose();
    Ok(())
}
