//! Operator console — line commands read from stdin and forwarded to the
//! scheduler through its handle.

use std::io::BufRead;
use std::str::FromStr;

use tokio::sync::mpsc;

use autoresume_app::scheduler::SchedulerHandle;
use autoresume_domain::error::AutoResumeError;

const LINE_BUFFER: usize = 8;

const HELP: &str = "commands: reset | toggle | on | off | status | quit";

/// A console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Restart the session timer.
    Reset,
    Toggle,
    On,
    Off,
    /// Print the status snapshot as JSON.
    Status,
    /// Stop the scheduler.
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "toggle" => Ok(Self::Toggle),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command {other:?}")),
        }
    }
}

/// Forward stdin lines from a dedicated thread.
///
/// The blocking read lives outside the runtime so it never holds up shutdown.
/// The channel closes at end of input.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Apply `command` and render the reply.
///
/// # Errors
///
/// Returns [`AutoResumeError::Stopped`] if the scheduler is gone.
pub async fn execute(
    command: Command,
    handle: &SchedulerHandle,
) -> Result<String, AutoResumeError> {
    let reply = match command {
        Command::Reset => {
            if handle.reset_session().await? {
                "session reset".to_string()
            } else {
                "session expired, reset ignored".to_string()
            }
        }
        Command::Toggle => on_off(handle.toggle().await?),
        Command::On => {
            handle.set_active(true).await?;
            on_off(true)
        }
        Command::Off => {
            handle.set_active(false).await?;
            on_off(false)
        }
        Command::Status => {
            let status = handle.status().await?;
            serde_json::to_string_pretty(&status).unwrap_or_else(|err| err.to_string())
        }
        Command::Quit => {
            handle.shutdown().await?;
            "stopping".to_string()
        }
    };
    Ok(reply)
}

fn on_off(active: bool) -> String {
    format!("auto-resume {}", if active { "ON" } else { "OFF" })
}

/// Read commands until input ends, `quit` is entered or the scheduler stops.
pub async fn run(mut lines: mpsc::Receiver<String>, handle: SchedulerHandle) {
    while let Some(line) = lines.recv().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}\n{HELP}");
                continue;
            }
        };
        match execute(command, &handle).await {
            Ok(reply) => println!("{reply}"),
            Err(err) => {
                tracing::debug!(error = %err, "console stopped");
                break;
            }
        }
        if command == Command::Quit {
            break;
        }
    }
}
