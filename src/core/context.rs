use crate::config::Config;
use crate::errors::Result;
use crate::logging::Logger;
use crate::queue::QueueFile;
use crate::scheduler;
use crate::session::SessionDefaults;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

/// Everything a subcommand needs, built once at startup.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub logger: Logger,
    pub config_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppContext {
    pub fn new_with_paths(config_path: PathBuf, logs_dir: PathBuf) -> Result<Self> {
        let config = Config::load_from(&config_path)?;

        let logger = Logger::new("NIGHTQUEUE");
        logger.set_log_file(&logs_dir, "nightqueue");
        logger.set_file_logging_enabled(config.file_logging_enabled());

        Ok(Self {
            config,
            logger,
            config_path,
            logs_dir,
        })
    }

    fn queue_on(&self, prefix: Option<&str>, night: NaiveDate) -> QueueFile {
        QueueFile::new(
            self.config.queue_dir(),
            prefix.unwrap_or(self.config.queue_name()),
            night,
        )
    }

    /// File a server starting at `now` opens: the site-local date. The
    /// scheduler rotates past it if twilight has already gone.
    pub fn server_queue(&self, prefix: Option<&str>, now: DateTime<Utc>) -> Result<QueueFile> {
        let today = scheduler::site_now(&self.config, now)?.date();
        Ok(self.queue_on(prefix, today))
    }

    /// Queue still accepting requests at `now`.
    pub fn admission_queue(&self, now: DateTime<Utc>) -> Result<QueueFile> {
        Ok(self.queue_on(None, scheduler::admission_night(&self.config, now)?))
    }

    /// Queue handed off for observing at `now`.
    pub fn observing_queue(&self, now: DateTime<Utc>) -> Result<QueueFile> {
        Ok(self.queue_on(None, scheduler::observing_night(&self.config, now)?))
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults::from_config(&self.config)
    }
}
