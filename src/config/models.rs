use crate::core::types::{
    AdmissionState, Bool, ChannelKind, Magic, PointingOffset, SiteLocation, TwilightSetting,
};
use serde::{Deserialize, Serialize};

pub trait ConfigItem<T> {
    fn get_value(&self) -> &T;
    fn description(&self) -> &str;
}

/// One configuration entry as stored on disk: `{ "value": ..., "description": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item<T> {
    pub value: T,
    #[serde(default)]
    pub description: String,
}

impl<T> Item<T> {
    pub fn new(value: T, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
        }
    }
}

impl<T> ConfigItem<T> for Item<T> {
    fn get_value(&self) -> &T {
        &self.value
    }
    fn description(&self) -> &str {
        &self.description
    }
}

pub type PortConfigItem = Item<u16>;
pub type MagicConfigItem = Item<Magic>;
pub type DefaultStateConfigItem = Item<AdmissionState>;
pub type PathConfigItem = Item<String>;
pub type SiteConfigItem = Item<SiteLocation>;
pub type TwilightConfigItem = Item<TwilightSetting>;
pub type AltitudeConfigItem = Item<f64>;
pub type MinutesConfigItem = Item<u32>;
pub type ChannelConfigItem = Item<ChannelKind>;
pub type FlagConfigItem = Item<Bool>;
pub type OffsetConfigItem = Item<Option<PointingOffset>>;

pub(super) fn default_queue_name() -> PathConfigItem {
    Item::new(String::new(), "Prefix prepended to every queue file name.")
}

pub(super) fn default_twilight() -> TwilightConfigItem {
    Item::new(
        TwilightSetting::Almanac,
        "Twilight source: 'almanac' or a fixed local time (HH:MM).",
    )
}

pub(super) fn default_twilight_altitude() -> AltitudeConfigItem {
    Item::new(-6.0, "Solar altitude in degrees that marks twilight.")
}

pub(super) fn default_admission_cutoff() -> MinutesConfigItem {
    Item::new(
        30,
        "Minutes before twilight when admission to tonight's queue closes.",
    )
}

pub(super) fn default_telescope() -> ChannelConfigItem {
    Item::new(
        ChannelKind::Local,
        "Command channel: local, demo or ssh:<host>.",
    )
}

pub(super) fn default_nodark() -> FlagConfigItem {
    Item::new(Bool(false), "Skip dark calibration frames.")
}

pub(super) fn default_nobias() -> FlagConfigItem {
    Item::new(Bool(false), "Skip bias calibration frames.")
}

pub(super) fn default_offset() -> OffsetConfigItem {
    Item::new(None, "Pointing offset 'ra,dec' in degrees applied after each goto.")
}

pub(super) fn default_close_after() -> FlagConfigItem {
    Item::new(Bool(true), "Close the dome at the end of every session.")
}

pub(super) fn default_file_logging() -> FlagConfigItem {
    Item::new(Bool(true), "Enable writing log messages to file.")
}
