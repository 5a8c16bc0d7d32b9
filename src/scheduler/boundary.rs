use crate::errors::Result;
use crate::extensions::chrono::NaiveDateExt;
use crate::scheduler::twilight::TwilightSource;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Longest admission cutoff honoured; anything longer would close the
/// window for the whole day.
const MAX_CUTOFF_MINUTES: u32 = 23 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing changed.
    Idle,
    /// Twilight passed: tonight's queue is closed and admission moves to the
    /// next night's file.
    Rotated,
    /// A new local day began; twilight was recomputed for it.
    Reopened,
}

/// Tracks tonight's twilight and whether the queue has been rotated past it.
///
/// `tick` takes one step at a time. After a gap with no ticks it may need
/// several calls (rotate, reopen, rotate) before it returns `Idle`.
pub struct DayBoundaryScheduler {
    source: Box<dyn TwilightSource>,
    twilight: NaiveDateTime,
    rotated: bool,
    cutoff: Duration,
}

impl DayBoundaryScheduler {
    pub fn new(
        source: Box<dyn TwilightSource>,
        cutoff_minutes: u32,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let twilight = source.twilight_on(now.date())?;
        Ok(Self {
            source,
            twilight,
            rotated: false,
            cutoff: Duration::minutes(i64::from(cutoff_minutes.min(MAX_CUTOFF_MINUTES))),
        })
    }

    pub fn twilight(&self) -> NaiveDateTime {
        self.twilight
    }

    pub fn rotated(&self) -> bool {
        self.rotated
    }

    /// Advances the state machine one step towards `now` (local time).
    ///
    /// Rotates once `now` is past the stored twilight. Once rotated, the
    /// first tick on a later calendar day recomputes twilight for that day,
    /// even when that day's twilight has already passed too.
    pub fn tick(&mut self, now: NaiveDateTime) -> Result<Tick> {
        if !self.rotated && now > self.twilight {
            self.rotated = true;
            return Ok(Tick::Rotated);
        }
        if self.rotated && now.date() > self.twilight.date() {
            self.twilight = self.source.twilight_on(now.date())?;
            self.rotated = false;
            return Ok(Tick::Reopened);
        }
        Ok(Tick::Idle)
    }

    /// Date of the night whose queue accepts requests: twilight's date until
    /// rotation, the day after once rotated.
    pub fn admission_night(&self) -> NaiveDate {
        let date = self.twilight.date();
        if self.rotated { date.next_day() } else { date }
    }

    /// Whether requests may be admitted at `now` (local time of day).
    ///
    /// Closed from `cutoff` before twilight until the rotation at twilight.
    pub fn admission_open(&self, now: NaiveTime) -> bool {
        if self.rotated || self.cutoff == Duration::zero() {
            return true;
        }
        let twilight = self.twilight.time();
        let (start, _) = twilight.overflowing_sub_signed(self.cutoff);
        let inside = if start <= twilight {
            start <= now && now <= twilight
        } else {
            now >= start || now <= twilight
        };
        !inside
    }
}

impl std::fmt::Debug for DayBoundaryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DayBoundaryScheduler")
            .field("twilight", &self.twilight)
            .field("rotated", &self.rotated)
            .field("cutoff", &self.cutoff)
            .finish()
    }
}
