//! Console control surface
//!
//! Reads operator commands from stdin and drives the [`Orchestrator`].
//! A watcher task logs run-state and alarm transitions.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::{Orchestrator, StatusSnapshot};

/// Operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Restart,
    Status,
    Silence,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "restart" => Ok(Command::Restart),
            "status" => Ok(Command::Status),
            "silence" => Ok(Command::Silence),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

pub const HELP: &str = "\
Commands:
  start    start polling for orders
  stop     stop polling
  restart  stop, then start
  status   show state and last message
  silence  silence the alarm
  help     show this help
  quit     stop and exit";

/// One-line status for the console
pub fn describe(snapshot: &StatusSnapshot) -> String {
    format!("[{}] {}", snapshot.state_label(), snapshot.message)
}

/// Apply one command. Returns false when the shell should exit.
pub async fn dispatch(orchestrator: &Orchestrator, command: Command) -> bool {
    match command {
        Command::Start => orchestrator.start().await,
        Command::Stop => orchestrator.stop().await,
        Command::Restart => orchestrator.restart().await,
        Command::Status => println!("{}", describe(&orchestrator.status())),
        Command::Silence => {
            orchestrator.silence_alarm().await;
            info!("Alarm silenced by operator");
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

/// Run the command loop until `quit` or `shutdown`
///
/// When the input side closes the agent keeps serving until `shutdown`.
pub async fn run(
    orchestrator: &Orchestrator,
    mut lines: mpsc::Receiver<String>,
    shutdown: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };

        let Some(line) = line else {
            info!("Console input closed");
            shutdown.cancelled().await;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if !dispatch(orchestrator, command).await {
                    break;
                }
            }
            Err(e) => println!("{} (try `help`)", e),
        }
    }
}

/// Forward stdin lines from a detached thread
///
/// The thread is never joined; a pending read must not hold up runtime
/// shutdown.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Reading console input failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Log status transitions every `interval`
pub fn spawn_status_watcher(
    orchestrator: Orchestrator,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = orchestrator.status();
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let current = orchestrator.status();
            if current != last {
                if current.alarm {
                    warn!(state = current.state_label(), message = %current.message, "Status changed");
                } else {
                    info!(state = current.state_label(), message = %current.message, "Status changed");
                }
                last = current;
            }
        }
    })
}
