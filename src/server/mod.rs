pub mod clock;
pub mod transport;

use std::path::PathBuf;

use chrono::{FixedOffset, NaiveDateTime};
use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::models::{AdminMessage, QueueEntry};
use crate::core::types::Magic;
use crate::errors::{QueueError, Result};
use crate::logging::{LogTarget, Logger};
use crate::queue::{QueueFile, QueueStore};
use crate::scheduler::{self, DayBoundaryScheduler, Tick};
use crate::server::clock::Clock;
use crate::server::transport::Transport;

/// Identity and initial state of a server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub request_magic: Magic,
    pub admin_magic: Magic,
    pub enabled: bool,
    pub offset: FixedOffset,
}

/// Answer to an admin `status` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub enabled: bool,
    pub queue: String,
    pub rotated: bool,
    pub twilight: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Magic(Magic),
    Status(ServerStatus),
    Error(String),
}

impl Reply {
    pub fn to_wire(&self) -> String {
        match self {
            Reply::Magic(magic) => magic.to_string(),
            Reply::Status(status) => serde_json::to_string(status)
                .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string()),
            Reply::Error(reason) => json!({ "error": reason }).to_string(),
        }
    }
}

/// Admission server: the only writer of the active queue file.
///
/// Requests are handled one at a time. Before each one the day-boundary
/// scheduler is advanced, which may rotate the queue file.
pub struct Server {
    settings: ServerSettings,
    enabled: bool,
    scheduler: DayBoundaryScheduler,
    store: QueueStore,
    clock: Box<dyn Clock>,
    logger: Logger,
}

impl Server {
    pub fn new(
        settings: ServerSettings,
        scheduler: DayBoundaryScheduler,
        store: QueueStore,
        clock: Box<dyn Clock>,
        logger: Logger,
    ) -> Self {
        Self {
            enabled: settings.enabled,
            settings,
            scheduler,
            store,
            clock,
            logger,
        }
    }

    pub fn from_config(
        config: &Config,
        queue_file: QueueFile,
        clock: Box<dyn Clock>,
        logger: Logger,
    ) -> Result<Self> {
        let offset = config.site().offset()?;
        let now = clock.now().with_timezone(&offset).naive_local();
        let scheduler = scheduler::from_config(config, now)?;
        let store = QueueStore::open(queue_file)?;
        let settings = ServerSettings {
            request_magic: config.request_magic().clone(),
            admin_magic: config.admin_magic().clone(),
            enabled: config.default_state().is_enabled(),
            offset,
        };
        Ok(Self::new(settings, scheduler, store, clock, logger))
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn queue_path(&self) -> PathBuf {
        self.store.path()
    }

    pub fn scheduler(&self) -> &DayBoundaryScheduler {
        &self.scheduler
    }

    fn local_now(&self) -> NaiveDateTime {
        self.clock
            .now()
            .with_timezone(&self.settings.offset)
            .naive_local()
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            enabled: self.enabled,
            queue: self.store.path().display().to_string(),
            rotated: self.scheduler.rotated(),
            twilight: self.scheduler.twilight().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Advances the day boundary to the current time, rotating the queue
    /// file at each twilight passed. Returns the last change made.
    pub fn tick(&mut self) -> Result<Tick> {
        let now = self.local_now();
        let mut last = Tick::Idle;
        loop {
            let tick = self.scheduler.tick(now)?;
            match tick {
                Tick::Idle => return Ok(last),
                Tick::Rotated => {
                    let closed = self.store.path();
                    let night = self.scheduler.admission_night();
                    let opened = self.store.rotate_to(night)?.path();
                    self.logger.info(
                        format!(
                            "Twilight passed; closed {} and opened {}.",
                            closed.display(),
                            opened.display()
                        ),
                        LogTarget::ConsoleAndFile,
                    );
                }
                Tick::Reopened => self.logger.info(
                    format!(
                        "New day; next twilight at {}.",
                        self.scheduler.twilight().format("%H:%M:%S")
                    ),
                    LogTarget::ConsoleAndFile,
                ),
            }
            last = tick;
        }
    }

    /// Appends `entry` to the active queue if it is valid, the server is
    /// enabled and the admission window is open.
    pub fn admit(&mut self, entry: &QueueEntry) -> std::result::Result<(), QueueError> {
        entry.validate()?;
        if !self.enabled {
            return Err(QueueError::Disabled);
        }
        if !self.scheduler.admission_open(self.local_now().time()) {
            return Err(QueueError::WindowClosed {
                twilight: self.scheduler.twilight().time(),
            });
        }
        self.store.append(entry)
    }

    /// Handles one raw message and returns the reply to send.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        let value = match decode(line) {
            Ok(value) => value,
            Err(reason) => {
                self.logger
                    .warn(format!("Rejected message: {reason}"), LogTarget::ConsoleAndFile);
                return Reply::Error(reason);
            }
        };

        match value.get("magic").and_then(Magic::from_json) {
            Some(magic) if magic == self.settings.request_magic => self.handle_request(value),
            Some(magic) if magic == self.settings.admin_magic => self.handle_admin(value),
            _ => {
                self.logger.warn(
                    "Received message with unrecognized magic; ignoring.",
                    LogTarget::ConsoleAndFile,
                );
                Reply::Error("Unrecognized magic.".into())
            }
        }
    }

    fn handle_request(&mut self, value: Value) -> Reply {
        let entry: QueueEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                let reason = format!("Malformed request: {e}");
                self.logger.warn(&reason, LogTarget::ConsoleAndFile);
                return Reply::Error(reason);
            }
        };

        match self.admit(&entry) {
            Ok(()) => {
                self.logger.info(
                    format!("Admitted request from {}: {entry}", entry.user),
                    LogTarget::ConsoleAndFile,
                );
                Reply::Magic(self.settings.request_magic.clone())
            }
            Err(e) => {
                self.logger.warn(
                    format!("Rejected request from {}: {e}", entry.user),
                    LogTarget::ConsoleAndFile,
                );
                Reply::Error(e.to_string())
            }
        }
    }

    fn handle_admin(&mut self, value: Value) -> Reply {
        let message: AdminMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                let reason = format!("Malformed admin message: {e}");
                self.logger.warn(&reason, LogTarget::ConsoleAndFile);
                return Reply::Error(reason);
            }
        };

        match (message.kind.as_str(), message.action.as_deref()) {
            ("state", Some(action @ ("enable" | "disable"))) => {
                self.enabled = action == "enable";
                self.logger.info(
                    format!("Queue server {action}d by {}.", message.user),
                    LogTarget::ConsoleAndFile,
                );
                Reply::Magic(self.settings.admin_magic.clone())
            }
            ("status", _) => Reply::Status(self.status()),
            (kind, action) => {
                let reason = format!(
                    "Unknown admin request: type '{kind}', action '{}'.",
                    action.unwrap_or("-")
                );
                self.logger.warn(&reason, LogTarget::ConsoleAndFile);
                Reply::Error(reason)
            }
        }
    }

    /// Serves requests until the transport closes or `cancel` fires.
    pub fn start(&mut self, transport: &mut dyn Transport, cancel: &CancellationToken) -> Result<()> {
        self.logger.info(
            format!(
                "Admitting requests to {} (server {}).",
                self.store.path().display(),
                if self.enabled { "enabled" } else { "disabled" }
            ),
            LogTarget::ConsoleAndFile,
        );

        while !cancel.is_cancelled() {
            let Some(line) = transport.recv()? else {
                break;
            };
            if let Err(e) = self.tick() {
                self.logger
                    .error(format!("Day boundary update failed: {e}"), LogTarget::ConsoleAndFile);
            }
            let reply = self.handle_line(&line);
            if let Err(e) = transport.reply(&reply.to_wire()) {
                self.logger
                    .warn(format!("Unable to send reply: {e}"), LogTarget::ConsoleAndFile);
            }
        }

        self.logger.info("Server stopped.", LogTarget::ConsoleAndFile);
        Ok(())
    }
}

/// Parses a message, unwrapping one level of JSON-string encoding as sent
/// by clients that serialize twice.
fn decode(line: &str) -> std::result::Result<Value, String> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| format!("Message is not valid JSON: {e}"))?;
    let value = match value {
        Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| format!("Message is not valid JSON: {e}"))?,
        other => other,
    };
    if value.is_object() {
        Ok(value)
    } else {
        Err("Message must be a JSON object.".into())
    }
}
