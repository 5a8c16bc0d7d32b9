#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::errors::TelescopeError;

/// Runs one hardware command and returns its textual output.
///
/// Implementations report a non-zero exit (or a failure to start the
/// command) as `TelescopeError::Command`; they never terminate the process.
pub trait CommandChannel: Send + Sync {
    fn run(&self, command: &str) -> Result<String, TelescopeError>;

    /// True when commands are only recorded and never reach hardware.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// A command in its own process group, so a terminal Ctrl-C reaches only
/// the quit handler and never an in-flight hardware command.
fn shell_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

fn run_process(mut cmd: Command, command: &str) -> Result<String, TelescopeError> {
    let output = cmd.output().map_err(|e| TelescopeError::Command {
        command: command.to_string(),
        reason: e.to_string(),
    })?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let reason = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        Err(TelescopeError::Command {
            command: command.to_string(),
            reason,
        })
    }
}

/// Executes commands with `sh -c` on the control computer itself.
#[derive(Debug, Default, Clone)]
pub struct LocalShell;

impl CommandChannel for LocalShell {
    fn run(&self, command: &str) -> Result<String, TelescopeError> {
        let mut cmd = shell_command("sh");
        cmd.arg("-c").arg(command);
        run_process(cmd, command)
    }
}

/// Executes commands on a remote control computer over `ssh`.
#[derive(Debug, Clone)]
pub struct RemoteShell {
    host: String,
}

impl RemoteShell {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl CommandChannel for RemoteShell {
    fn run(&self, command: &str) -> Result<String, TelescopeError> {
        let mut cmd = shell_command("ssh");
        cmd.arg("-o").arg("BatchMode=yes").arg(&self.host).arg(command);
        run_process(cmd, command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Output(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    exact: bool,
    reply: Reply,
}

impl Rule {
    fn matches(&self, command: &str) -> bool {
        if self.exact {
            command == self.pattern
        } else {
            command.contains(&self.pattern)
        }
    }
}

/// Telemetry a healthy, dark, clear site would report.
static DEMO_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule {
            pattern: "sun".into(),
            exact: true,
            reply: Reply::Output("alt=-18.0 az=280.0".into()),
        },
        Rule {
            pattern: "tx slit".into(),
            exact: true,
            reply: Reply::Output("slit=closed".into()),
        },
        Rule {
            pattern: "tx taux".into(),
            exact: true,
            reply: Reply::Output("rain=0 cloud=0.05 wind=2.1".into()),
        },
        Rule {
            pattern: "altaz".into(),
            exact: false,
            reply: Reply::Output("alt=65.0 az=180.0".into()),
        },
        Rule {
            pattern: "pfilter".into(),
            exact: true,
            reply: Reply::Output("clear".into()),
        },
    ]
});

/// Records every command and answers from a scripted rule table.
///
/// Rules added later take precedence. Commands no rule matches succeed with
/// empty output. Clones share the command log, so a test can keep one
/// handle while the telescope owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChannel {
    rules: Vec<Rule>,
    log: Arc<Mutex<Vec<String>>>,
}

impl SimulatedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel used for demo runs: benign telemetry for every query.
    pub fn demo() -> Self {
        Self {
            rules: DEMO_RULES.clone(),
            log: Arc::default(),
        }
    }

    /// Reply with `output` to any command containing `pattern`.
    pub fn respond(mut self, pattern: impl Into<String>, output: impl Into<String>) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into(),
            exact: false,
            reply: Reply::Output(output.into()),
        });
        self
    }

    /// Reply with `output` only to a command equal to `command`.
    pub fn respond_exact(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.rules.push(Rule {
            pattern: command.into(),
            exact: true,
            reply: Reply::Output(output.into()),
        });
        self
    }

    /// Fail any command containing `pattern`.
    pub fn fail(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.rules.push(Rule {
            reply: Reply::Fail(format!("simulated failure for '{pattern}'")),
            pattern,
            exact: false,
        });
        self
    }

    /// Every command seen so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of recorded commands containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

impl CommandChannel for SimulatedChannel {
    fn run(&self, command: &str) -> Result<String, TelescopeError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(command.to_string());
        }
        match self.rules.iter().rev().find(|rule| rule.matches(command)) {
            Some(Rule {
                reply: Reply::Fail(reason),
                ..
            }) => Err(TelescopeError::Command {
                command: command.to_string(),
                reason: reason.clone(),
            }),
            Some(Rule {
                reply: Reply::Output(out),
                ..
            }) => Ok(out.clone()),
            None => Ok(String::new()),
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
