use chrono::NaiveDate;

use crate::core::types::{Filter, Target};
use crate::extensions::chrono::NaiveDateExt;
use crate::extensions::string::ToFileToken;

/// Site suffix appended to every frame.
pub const SITE_SUFFIX: &str = "seo";

/// Per-session parts shared by every frame name.
#[derive(Debug, Clone)]
pub struct FrameNamer {
    exposure_time: f64,
    binning: u32,
    stamp: String,
    user: String,
}

impl FrameNamer {
    pub fn new(exposure_time: f64, binning: u32, date: NaiveDate, user: &str) -> Self {
        Self {
            exposure_time,
            binning,
            stamp: date.frame_stamp(),
            user: user.to_file_token(),
        }
    }

    fn tail(&self, index: u32) -> String {
        format!(
            "{}sec_bin{}_{}_{}_num{}_{}",
            self.exposure_time, self.binning, self.stamp, self.user, index, SITE_SUFFIX
        )
    }

    /// `m31_r-band_60sec_bin2_2016oct07_vega_num0_seo`
    pub fn science(&self, target: &Target, filter: &Filter, index: u32) -> String {
        format!(
            "{}_{}-band_{}",
            target.to_string().to_file_token(),
            filter,
            self.tail(index)
        )
    }

    /// Base name for darks and biases; the camera adds `_dark` / `_bias`.
    pub fn calibration(&self, target: &Target, index: u32) -> String {
        format!("{}_{}", target.to_string().to_file_token(), self.tail(index))
    }
}
