pub mod naming;

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::models::QueueEntry;
use crate::core::types::{Filter, Target};
use crate::errors::{FrameKind, QueueError, SessionError};
use crate::logging::{LogTarget, Logger};
use crate::session::naming::FrameNamer;
use crate::telescope::Telescope;

/// Settings a session takes from the process configuration rather than
/// from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    pub close_after: bool,
    pub demo: bool,
}

impl SessionDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            close_after: config.close_after(),
            demo: config.telescope().is_demo(),
        }
    }
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            close_after: true,
            demo: false,
        }
    }
}

/// What happened during one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub imaged: Vec<Target>,
    pub skipped: Vec<Target>,
    pub frames: usize,
    pub dome_closed: bool,
}

/// One imaging request: every target is pointed at, imaged through each
/// filter and followed by its dark and bias frames.
///
/// Filters form a set. Acquisition follows `Filter`'s ordering, which carries
/// no operational meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    targets: Vec<Target>,
    exposure_time: f64,
    exposure_count: u32,
    filters: BTreeSet<Filter>,
    binning: u32,
    user: String,
    close_after: bool,
    demo: bool,
}

fn fallback_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Session {
    pub fn new(exposure_time: f64, user: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            targets: Vec::new(),
            exposure_time,
            exposure_count: 1,
            filters: BTreeSet::from([Filter::Clear]),
            binning: 2,
            user: if user.trim().is_empty() {
                fallback_user()
            } else {
                user
            },
            close_after: true,
            demo: false,
        }
    }

    /// Builds a session from an admitted entry, validating it again.
    pub fn from_entry(entry: &QueueEntry, defaults: SessionDefaults) -> Result<Self, QueueError> {
        entry.validate()?;
        let mut session = Session::new(entry.exposure_time, entry.user.clone())
            .with_count(entry.exposure_count)
            .with_binning(entry.binning)
            .with_close_after(defaults.close_after)
            .with_demo(defaults.demo);
        session.filters = entry.parsed_filters()?.into_iter().collect();
        for target in entry.parsed_targets()? {
            session.add_target(target);
        }
        Ok(session)
    }

    pub fn add_target(&mut self, target: Target) -> &mut Self {
        self.targets.push(target);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.exposure_count = count.max(1);
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters = filters.into_iter().collect();
        if self.filters.is_empty() {
            self.filters.insert(Filter::Clear);
        }
        self
    }

    pub fn with_binning(mut self, binning: u32) -> Self {
        self.binning = binning.max(1);
        self
    }

    pub fn with_close_after(mut self, close_after: bool) -> Self {
        self.close_after = close_after;
        self
    }

    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn filters(&self) -> &BTreeSet<Filter> {
        &self.filters
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn exposure_time(&self) -> f64 {
        self.exposure_time
    }

    pub fn exposure_count(&self) -> u32 {
        self.exposure_count
    }

    pub fn binning(&self) -> u32 {
        self.binning
    }

    pub fn execute(
        &self,
        telescope: &Telescope,
        cancel: &CancellationToken,
        logger: &Logger,
    ) -> Result<SessionReport, SessionError> {
        self.execute_dated(telescope, cancel, logger, Utc::now().date_naive())
    }

    /// Runs the whole sequence with frame names stamped with `date` (UTC).
    pub fn execute_dated(
        &self,
        telescope: &Telescope,
        cancel: &CancellationToken,
        logger: &Logger,
        date: NaiveDate,
    ) -> Result<SessionReport, SessionError> {
        if self.targets.is_empty() {
            return Err(SessionError::NoTargets);
        }
        if self.demo && !telescope.is_simulated() {
            return Err(SessionError::DemoOnHardware);
        }
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        logger.info(
            format!(
                "Starting session for {} ({} target(s)).",
                self.user,
                self.targets.len()
            ),
            LogTarget::ConsoleAndFile,
        );
        if !telescope.open_dome() {
            return Err(SessionError::DomeUnavailable);
        }

        let namer = FrameNamer::new(self.exposure_time, self.binning, date, &self.user);
        let mut report = SessionReport::default();

        for target in &self.targets {
            if cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            if !telescope.goto_target(target) || !telescope.offset() {
                logger.warn(
                    format!(
                        "Unable to point telescope at {target}. Object is most likely not visible \
                         or there has been a telescope error. Skipping {target}..."
                    ),
                    LogTarget::ConsoleAndFile,
                );
                report.skipped.push(target.clone());
                continue;
            }

            report.frames += self.image_target(telescope, cancel, logger, &namer, target)?;
            report.imaged.push(target.clone());
        }

        if self.close_after {
            report.dome_closed = telescope.close_dome();
        }
        logger.info(
            format!(
                "Session for {} finished: {} imaged, {} skipped.",
                self.user,
                report.imaged.len(),
                report.skipped.len()
            ),
            LogTarget::ConsoleAndFile,
        );
        Ok(report)
    }

    fn image_target(
        &self,
        telescope: &Telescope,
        cancel: &CancellationToken,
        logger: &Logger,
        namer: &FrameNamer,
        target: &Target,
    ) -> Result<usize, SessionError> {
        let mut frames = 0;

        for filter in &self.filters {
            if !telescope.change_filter(filter) {
                return Err(capture(filter.wheel_position(), FrameKind::Filter));
            }
            for n in 0..self.exposure_count {
                if cancel.is_cancelled() {
                    return Err(SessionError::Cancelled);
                }
                let name = namer.science(target, filter, n);
                logger.info(
                    format!("Taking exposure {n} for {target}"),
                    LogTarget::ConsoleAndFile,
                );
                if !telescope.take_exposure(&name, self.exposure_time, self.binning) {
                    return Err(capture(name, FrameKind::Science));
                }
                frames += 1;
            }
        }

        if !telescope.change_filter(&Filter::Clear) {
            return Err(capture(Filter::Clear.wheel_position(), FrameKind::Filter));
        }

        for n in 0..self.exposure_count {
            if cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            let name = namer.calibration(target, n);
            if !telescope.take_dark(&name, self.exposure_time, self.binning) {
                return Err(capture(name, FrameKind::Dark));
            }
            frames += 1;
        }
        for n in 0..self.exposure_count {
            if cancel.is_cancelled() {
                return Err(SessionError::Cancelled);
            }
            let name = namer.calibration(target, n);
            if !telescope.take_bias(&name, self.binning) {
                return Err(capture(name, FrameKind::Bias));
            }
            frames += 1;
        }
        Ok(frames)
    }
}

fn capture(frame: String, kind: FrameKind) -> SessionError {
    SessionError::Capture { frame, kind }
}
