use crate::core::types::{SiteLocation, TwilightSetting};
use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Julian date of 2000-01-01 12:00 UTC.
const J2000: f64 = 2_451_545.0;
/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const OBLIQUITY_DEG: f64 = 23.4397;

/// Supplies the local time at which evening twilight ends on a given local date.
pub trait TwilightSource: Send {
    fn twilight_on(&self, date: NaiveDate) -> Result<NaiveDateTime>;
}

/// The same local time every evening.
#[derive(Debug, Clone, Copy)]
pub struct FixedTwilight(pub NaiveTime);

impl TwilightSource for FixedTwilight {
    fn twilight_on(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        Ok(date.and_time(self.0))
    }
}

/// Evening time at which the sun sinks to `altitude` degrees, from the
/// sunrise equation. Accurate to a minute or two, which is plenty for
/// opening and closing an admission window.
#[derive(Debug, Clone, Copy)]
pub struct SolarAlmanac {
    pub site: SiteLocation,
    pub altitude: f64,
}

impl SolarAlmanac {
    pub fn new(site: SiteLocation, altitude: f64) -> Self {
        Self { site, altitude }
    }

    /// Julian date (UTC) of the evening crossing of `altitude`.
    fn setting_jd(&self, date: NaiveDate) -> Result<f64> {
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)
            .ok_or_else(|| Error::config("invalid almanac epoch"))?;
        let n = (date - epoch).num_days() as f64;

        let j_star = n - self.site.longitude / 360.0;
        let m = (357.5291 + 0.985_600_28 * j_star).rem_euclid(360.0);
        let m_rad = m.to_radians();
        let c = 1.9148 * m_rad.sin() + 0.0200 * (2.0 * m_rad).sin() + 0.0003 * (3.0 * m_rad).sin();
        let lambda = (m + c + 180.0 + 102.9372).rem_euclid(360.0).to_radians();
        let transit = J2000 + j_star + 0.0053 * m_rad.sin() - 0.0069 * (2.0 * lambda).sin();

        let declination = (lambda.sin() * OBLIQUITY_DEG.to_radians().sin()).asin();
        let phi = self.site.latitude.to_radians();
        let cos_omega = (self.altitude.to_radians().sin() - phi.sin() * declination.sin())
            / (phi.cos() * declination.cos());
        if !(-1.0..=1.0).contains(&cos_omega) {
            return Err(Error::Config(format!(
                "The sun does not cross {} degrees at latitude {} on {}.",
                self.altitude, self.site.latitude, date
            )));
        }
        Ok(transit + cos_omega.acos().to_degrees() / 360.0)
    }
}

impl TwilightSource for SolarAlmanac {
    fn twilight_on(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        let jd = self.setting_jd(date)?;
        let secs = ((jd - UNIX_EPOCH_JD) * 86_400.0).round() as i64;
        let utc = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::Config(format!("Twilight for {date} is out of range.")))?;
        Ok(utc.with_timezone(&self.site.offset()?).naive_local())
    }
}

pub fn make_twilight_source(
    setting: &TwilightSetting,
    site: &SiteLocation,
    altitude: f64,
) -> Box<dyn TwilightSource> {
    match setting {
        TwilightSetting::Fixed(time) => Box::new(FixedTwilight(*time)),
        TwilightSetting::Almanac => Box::new(SolarAlmanac::new(*site, altitude)),
    }
}
