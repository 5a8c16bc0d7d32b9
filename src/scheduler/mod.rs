//! Night boundaries: when tonight's queue closes and the next one opens.

pub mod boundary;
pub mod twilight;
#[cfg(test)]
mod tests;

pub use boundary::{DayBoundaryScheduler, Tick};
pub use twilight::{FixedTwilight, SolarAlmanac, TwilightSource, make_twilight_source};

use crate::config::Config;
use crate::errors::Result;
use crate::extensions::chrono::NaiveDateExt;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Scheduler built from the configured twilight source and cutoff.
pub fn from_config(config: &Config, now: NaiveDateTime) -> Result<DayBoundaryScheduler> {
    let source = make_twilight_source(config.twilight(), config.site(), config.twilight_altitude());
    DayBoundaryScheduler::new(source, config.admission_cutoff_minutes(), now)
}

/// Wall-clock time at the configured site.
pub fn site_now(config: &Config, now: DateTime<Utc>) -> Result<NaiveDateTime> {
    Ok(now.with_timezone(&config.site().offset()?).naive_local())
}

fn twilight_today(config: &Config, local: NaiveDateTime) -> Result<NaiveDateTime> {
    make_twilight_source(config.twilight(), config.site(), config.twilight_altitude())
        .twilight_on(local.date())
}

/// Night whose queue is accepting requests at `now`: today's until local
/// twilight, tomorrow's after it.
pub fn admission_night(config: &Config, now: DateTime<Utc>) -> Result<NaiveDate> {
    let local = site_now(config, now)?;
    if local > twilight_today(config, local)? {
        Ok(local.date().next_day())
    } else {
        Ok(local.date())
    }
}

/// Most recent night whose queue has been handed off at `now`.
pub fn observing_night(config: &Config, now: DateTime<Utc>) -> Result<NaiveDate> {
    let local = site_now(config, now)?;
    if local > twilight_today(config, local)? {
        Ok(local.date())
    } else {
        Ok(local.date().previous_day())
    }
}
