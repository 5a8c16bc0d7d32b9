pub mod models;

use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter as EnumIterDerive, EnumString};

use crate::config::models::*;
use crate::core::types::{
    AdmissionState, ChannelKind, Magic, PointingOffset, SiteLocation, TwilightSetting,
};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIterDerive, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigKey {
    ServerPort,
    RequestMagic,
    AdminMagic,
    DefaultState,
    QueueDir,
    QueueName,
    Site,
    Twilight,
    TwilightAltitude,
    AdmissionCutoffMinutes,
    Telescope,
    Nodark,
    Nobias,
    Offset,
    CloseAfter,
    FileLoggingEnabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server_port: PortConfigItem,
    pub request_magic: MagicConfigItem,
    pub admin_magic: MagicConfigItem,
    pub default_state: DefaultStateConfigItem,
    pub queue_dir: PathConfigItem,
    #[serde(default = "default_queue_name")]
    pub queue_name: PathConfigItem,
    pub site: SiteConfigItem,
    #[serde(default = "default_twilight")]
    pub twilight: TwilightConfigItem,
    #[serde(default = "default_twilight_altitude")]
    pub twilight_altitude: AltitudeConfigItem,
    #[serde(default = "default_admission_cutoff")]
    pub admission_cutoff_minutes: MinutesConfigItem,
    #[serde(default = "default_telescope")]
    pub telescope: ChannelConfigItem,
    #[serde(default = "default_nodark")]
    pub nodark: FlagConfigItem,
    #[serde(default = "default_nobias")]
    pub nobias: FlagConfigItem,
    #[serde(default = "default_offset")]
    pub offset: OffsetConfigItem,
    #[serde(default = "default_close_after")]
    pub close_after: FlagConfigItem,
    #[serde(default = "default_file_logging")]
    pub file_logging_enabled: FlagConfigItem,
}

/// Startup configuration, loaded once and passed by reference to the
/// server, executor and telescope constructors.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    data: ConfigFile,
}

#[derive(Debug, Clone)]
pub struct ConfigRows(Vec<(String, String, String)>);

impl ConfigRows {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &(String, String, String)> {
        self.0.iter()
    }
}
impl Index<usize> for ConfigRows {
    type Output = (String, String, String);
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Config {
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file '{}' not found.",
                path.display()
            )));
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let data: ConfigFile = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("Invalid JSON in '{}': {}", path.display(), e)))?;
        let config = Self { path, data };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.request_magic().as_str().trim().is_empty() {
            return Err(Error::config("request_magic cannot be empty."));
        }
        if self.admin_magic().as_str().trim().is_empty() {
            return Err(Error::config("admin_magic cannot be empty."));
        }
        if self.request_magic() == self.admin_magic() {
            return Err(Error::config(
                "request_magic and admin_magic must be different.",
            ));
        }
        if self.queue_dir().as_os_str().is_empty() {
            return Err(Error::config("queue_dir cannot be empty."));
        }
        let altitude = self.twilight_altitude();
        if !(-18.0..=0.0).contains(&altitude) {
            return Err(Error::Config(format!(
                "twilight_altitude must be between -18 and 0 degrees, got {altitude}."
            )));
        }
        self.site().offset()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn server_port(&self) -> u16 {
        *self.data.server_port.get_value()
    }
    pub fn request_magic(&self) -> &Magic {
        self.data.request_magic.get_value()
    }
    pub fn admin_magic(&self) -> &Magic {
        self.data.admin_magic.get_value()
    }
    pub fn default_state(&self) -> AdmissionState {
        *self.data.default_state.get_value()
    }
    pub fn queue_dir(&self) -> PathBuf {
        PathBuf::from(self.data.queue_dir.get_value())
    }
    pub fn queue_name(&self) -> &str {
        self.data.queue_name.get_value()
    }
    pub fn site(&self) -> &SiteLocation {
        self.data.site.get_value()
    }
    pub fn twilight(&self) -> &TwilightSetting {
        self.data.twilight.get_value()
    }
    pub fn twilight_altitude(&self) -> f64 {
        *self.data.twilight_altitude.get_value()
    }
    pub fn admission_cutoff_minutes(&self) -> u32 {
        *self.data.admission_cutoff_minutes.get_value()
    }
    pub fn telescope(&self) -> &ChannelKind {
        self.data.telescope.get_value()
    }
    pub fn nodark(&self) -> bool {
        self.data.nodark.get_value().0
    }
    pub fn nobias(&self) -> bool {
        self.data.nobias.get_value().0
    }
    pub fn offset(&self) -> Option<PointingOffset> {
        *self.data.offset.get_value()
    }
    pub fn close_after(&self) -> bool {
        self.data.close_after.get_value().0
    }
    pub fn file_logging_enabled(&self) -> bool {
        self.data.file_logging_enabled.get_value().0
    }

    /// `(KEY, description, value)` for every recognized item, in declaration order.
    pub fn rows(&self) -> ConfigRows {
        let d = &self.data;
        let rows = ConfigKey::iter()
            .map(|key| {
                let (description, value) = match key {
                    ConfigKey::ServerPort => (d.server_port.description(), self.server_port().to_string()),
                    ConfigKey::RequestMagic => (d.request_magic.description(), "********".to_string()),
                    ConfigKey::AdminMagic => (d.admin_magic.description(), "********".to_string()),
                    ConfigKey::DefaultState => (d.default_state.description(), self.default_state().to_string()),
                    ConfigKey::QueueDir => (d.queue_dir.description(), self.queue_dir().display().to_string()),
                    ConfigKey::QueueName => (
                        d.queue_name.description(),
                        Self::or_dash(self.queue_name()),
                    ),
                    ConfigKey::Site => (d.site.description(), self.site().to_string()),
                    ConfigKey::Twilight => (d.twilight.description(), self.twilight().to_string()),
                    ConfigKey::TwilightAltitude => (
                        d.twilight_altitude.description(),
                        self.twilight_altitude().to_string(),
                    ),
                    ConfigKey::AdmissionCutoffMinutes => (
                        d.admission_cutoff_minutes.description(),
                        self.admission_cutoff_minutes().to_string(),
                    ),
                    ConfigKey::Telescope => (d.telescope.description(), self.telescope().to_string()),
                    ConfigKey::Nodark => (d.nodark.description(), d.nodark.get_value().to_string()),
                    ConfigKey::Nobias => (d.nobias.description(), d.nobias.get_value().to_string()),
                    ConfigKey::Offset => (
                        d.offset.description(),
                        self.offset()
                            .map(|o| o.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    ConfigKey::CloseAfter => (
                        d.close_after.description(),
                        d.close_after.get_value().to_string(),
                    ),
                    ConfigKey::FileLoggingEnabled => (
                        d.file_logging_enabled.description(),
                        d.file_logging_enabled.get_value().to_string(),
                    ),
                };
                (key.to_string(), description.to_string(), value)
            })
            .collect();
        ConfigRows(rows)
    }

    fn or_dash(s: &str) -> String {
        if s.is_empty() {
            "-".to_string()
        } else {
            s.to_string()
        }
    }
}
