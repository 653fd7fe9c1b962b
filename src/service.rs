//! Service restart after a cache clean.
//!
//! The restart command is launched before [`ServiceRestarter::restart`]
//! returns, so it runs even if the calling process exits right after. Its
//! outcome is collected on a watcher thread and only shows up in the log;
//! short-lived callers use [`ServiceRestarter::wait`] to let that line be
//! written before they exit.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Upper bound on how long a restart command may run before it is killed.
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub trait ServiceRestarter {
    /// Launch a restart without waiting for it
    fn restart(&self);

    /// Block until launched restarts have finished or timed out.
    fn wait(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    Failed(String),
    TimedOut,
    NotStarted(String),
}

/// Runs the configured restart command, e.g. `systemctl restart 1panel.service`.
#[derive(Debug)]
pub struct CommandRestarter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    watchers: Mutex<Vec<JoinHandle<RestartOutcome>>>,
    settled: Mutex<Vec<RestartOutcome>>,
}

impl CommandRestarter {
    /// Returns `None` for an empty command or one with an unsafe program or
    /// argument.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if !is_safe_program(program) || !args.iter().all(|a| is_safe_arg(a)) {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: DEFAULT_RESTART_TIMEOUT,
            watchers: Mutex::new(Vec::new()),
            settled: Mutex::new(Vec::new()),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Wait for every launched restart and return their outcomes in launch
    /// order. Each wait is bounded by the timeout.
    pub fn wait_outcomes(&self) -> Vec<RestartOutcome> {
        let watchers: Vec<_> = self
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();

        let mut outcomes: Vec<RestartOutcome> = self
            .settled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for watcher in watchers {
            outcomes.push(
                watcher
                    .join()
                    .unwrap_or_else(|_| RestartOutcome::Failed("watcher panicked".to_string())),
            );
        }
        outcomes
    }

    fn settle(&self, outcome: RestartOutcome) {
        self.settled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome);
    }
}

/// Bare program name or absolute path; no `..`, nothing a shell would
/// interpret.
fn is_safe_program(program: &str) -> bool {
    !program.is_empty()
        && program.len() <= 4096
        && !program.split('/').any(|part| part == "..")
        && program
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
}

/// Alphanumerics plus `-`, `_`, `.`, `@`, `/`; keeps shell metacharacters
/// out of anything handed to the service manager.
fn is_safe_arg(arg: &str) -> bool {
    !arg.is_empty()
        && arg.len() <= 128
        && !arg.split('/').any(|part| part == "..")
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/'))
}

impl ServiceRestarter for CommandRestarter {
    fn restart(&self) {
        let command_line = self.command_line();
        tracing::info!(command = %command_line, "restarting service");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(command = %command_line, error = %e, "restart service failed");
                self.settle(RestartOutcome::NotStarted(e.to_string()));
                return;
            }
        };

        let timeout = self.timeout;
        let watcher = thread::Builder::new()
            .name("service-restart".to_string())
            .spawn(move || watch(child, &command_line, timeout));

        match watcher {
            Ok(handle) => self
                .watchers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(handle),
            // The command is already running; only its outcome goes unreported
            Err(e) => {
                tracing::warn!(error = %e, "could not watch restart command");
                self.settle(RestartOutcome::Failed(e.to_string()));
            }
        }
    }

    fn wait(&self) {
        self.wait_outcomes();
    }
}

fn watch(mut child: Child, command_line: &str, timeout: Duration) -> RestartOutcome {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => {
                tracing::info!(command = %command_line, "service restarted");
                return RestartOutcome::Restarted;
            }
            Ok(Some(status)) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                tracing::error!(
                    command = %command_line,
                    status = %status,
                    stderr = %stderr.trim(),
                    "restart service failed"
                );
                return RestartOutcome::Failed(status.to_string());
            }
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                tracing::error!(
                    command = %command_line,
                    timeout_secs = timeout.as_secs_f64(),
                    "restart service timed out, killed"
                );
                return RestartOutcome::TimedOut;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::error!(command = %command_line, error = %e, "restart service failed");
                return RestartOutcome::Failed(e.to_string());
            }
        }
    }
}

/// Logs the request and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRestarter;

impl ServiceRestarter for NoopRestarter {
    fn restart(&self) {
        tracing::info!("service restart skipped");
    }
}
