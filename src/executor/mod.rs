
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::errors::{ExecutionError, QueueError, SessionError};
use crate::logging::{LogTarget, Logger};
use crate::queue;
use crate::session::{Session, SessionDefaults, SessionReport};
use crate::telescope::Telescope;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionSummary {
    pub reports: Vec<SessionReport>,
}

impl ExecutionSummary {
    pub fn completed(&self) -> usize {
        self.reports.len()
    }

    pub fn frames(&self) -> usize {
        self.reports.iter().map(|r| r.frames).sum()
    }
}

/// Drains one night's queue against a single telescope.
///
/// Sessions run strictly in admission order. The first session failure
/// stops the run; nothing after it is attempted.
pub struct Executor {
    telescope: Arc<Telescope>,
    sessions: Vec<Session>,
    logger: Logger,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(telescope: Arc<Telescope>, logger: Logger, cancel: CancellationToken) -> Self {
        Self {
            telescope,
            sessions: Vec::new(),
            logger,
            cancel,
        }
    }

    /// Sessions for every entry of a completed queue file.
    pub fn load(path: &Path, defaults: SessionDefaults) -> Result<Vec<Session>, QueueError> {
        queue::load(path)?
            .iter()
            .map(|entry| Session::from_entry(entry, defaults))
            .collect()
    }

    pub fn load_queue(
        &mut self,
        path: &Path,
        defaults: SessionDefaults,
    ) -> Result<usize, ExecutionError> {
        self.sessions = Self::load(path, defaults)?;
        self.logger.info(
            format!(
                "Loaded {} session(s) from {}.",
                self.sessions.len(),
                path.display()
            ),
            LogTarget::ConsoleAndFile,
        );
        Ok(self.sessions.len())
    }

    pub fn with_sessions(mut self, sessions: Vec<Session>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Cleanup to run when the operator confirms an interrupt: a
    /// best-effort dome close, skipped when there is nothing queued.
    pub fn cleanup_hook(&self) -> impl Fn() + Send + Sync + 'static {
        let telescope = Arc::clone(&self.telescope);
        let has_sessions = !self.sessions.is_empty();
        move || {
            if has_sessions {
                telescope.close_dome();
            }
        }
    }

    pub fn run(&self) -> Result<ExecutionSummary, ExecutionError> {
        let mut summary = ExecutionSummary::default();
        let total = self.sessions.len();

        for (idx, session) in self.sessions.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(self.abort_cancelled(idx));
            }
            self.logger.info(
                format!("Executing session {} of {total} for {}.", idx + 1, session.user()),
                LogTarget::ConsoleAndFile,
            );

            match session.execute(&self.telescope, &self.cancel, &self.logger) {
                Ok(report) => summary.reports.push(report),
                Err(SessionError::Cancelled) => return Err(self.abort_cancelled(idx)),
                Err(source) => {
                    self.logger.error(
                        format!(
                            "Session {} for {} failed: {source}. Stopping the queue.",
                            idx + 1,
                            session.user()
                        ),
                        LogTarget::ConsoleAndFile,
                    );
                    self.telescope.close_dome();
                    return Err(ExecutionError::SessionFailed {
                        index: idx + 1,
                        user: session.user().to_string(),
                        source,
                    });
                }
            }
        }

        self.logger.info(
            format!(
                "Queue complete: {} session(s), {} frame(s).",
                summary.completed(),
                summary.frames()
            ),
            LogTarget::ConsoleAndFile,
        );
        Ok(summary)
    }

    fn abort_cancelled(&self, completed: usize) -> ExecutionError {
        self.logger.warn(
            format!("Execution cancelled after {completed} session(s)."),
            LogTarget::ConsoleAndFile,
        );
        self.telescope.close_dome();
        ExecutionError::Cancelled { completed }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("telescope", &self.telescope)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
