//! Console countdown prompt.
//!
//! The negotiator polls, so stdin is drained by a reader thread feeding a
//! channel; `poll` re-renders the countdown line and returns a pending
//! choice without ever blocking.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use console::style;
use rollout_core::countdown::{CountdownPrompt, CountdownView, PromptAction};

pub struct ConsolePrompt {
    input: Receiver<String>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { input: rx }
    }

    fn render(&self, view: &CountdownView) {
        let mut options = Vec::new();
        if view.allow_close_now {
            options.push("[c]lose apps now");
        }
        if view.allow_defer && view.deferrals_remaining > 0 {
            options.push("[d]efer");
        }
        if view.allow_cancel {
            options.push("[x] cancel");
        }

        let line = format!(
            "{} {} — {} remaining, {} deferrals left — {}",
            style("blocking:").yellow().bold(),
            view.blocking.join(", "),
            format_remaining(view.remaining.as_secs()),
            view.deferrals_remaining,
            options.join("  ")
        );
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r\x1b[2K{line}");
        let _ = stderr.flush();
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownPrompt for ConsolePrompt {
    fn poll(&mut self, view: &CountdownView) -> Option<PromptAction> {
        self.render(view);

        let line = match self.input.try_recv() {
            Ok(line) => line,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
        };

        match line.trim().to_ascii_lowercase().as_str() {
            "d" | "defer" => Some(PromptAction::Defer),
            "c" | "close" => Some(PromptAction::CloseNow),
            "x" | "cancel" => Some(PromptAction::Cancel),
            "" => None,
            other => {
                eprintln!("\nunrecognized choice: {other:?}");
                None
            }
        }
    }

    fn notify_forced_close(&mut self, blocking: &[String]) {
        eprintln!(
            "\n{} no deferral remains; the following applications will be closed: {}",
            style("notice:").red().bold(),
            blocking.join(", ")
        );
    }
}

fn format_remaining(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
