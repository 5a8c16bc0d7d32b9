use crate::errors::{Error, Result, require_parse};
use crate::extensions::enums::valid_csv;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter as EnumIterDerive, EnumString};

// =======
// Target
// =======

/// Something to point at: a catalog designation (`m31`, `NGC 6974`) or an
/// explicit `ra,dec,equinox` triple. A comma in the input selects the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Catalog(String),
    Coordinates {
        ra: String,
        dec: String,
        equinox: String,
    },
}

impl Target {
    pub fn try_from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::parse("Target cannot be empty."));
        }
        if !s.contains(',') {
            return Ok(Target::Catalog(s.to_string()));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::Parse(format!(
                "Invalid coordinate target: '{}'. Expected format: 'ra,dec,equinox'.",
                s
            )));
        }
        let mut parts = parts.into_iter().map(str::to_string);
        let ra = require_parse(parts.next(), "Coordinate target is missing ra.")?;
        let dec = require_parse(parts.next(), "Coordinate target is missing dec.")?;
        let equinox = require_parse(parts.next(), "Coordinate target is missing equinox.")?;
        Ok(Target::Coordinates { ra, dec, equinox })
    }

    pub fn is_coordinates(&self) -> bool {
        matches!(self, Target::Coordinates { .. })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Catalog(name) => write!(f, "{name}"),
            Target::Coordinates { ra, dec, equinox } => write!(f, "{ra},{dec},{equinox}"),
        }
    }
}

// =======
// Filter
// =======

/// Filter wheel position. `clear` and `h-alpha` are named positions; every
/// other identifier is a photometric band (`g` selects `g-band`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Filter {
    Clear,
    HAlpha,
    Band(String),
}

impl Filter {
    pub fn try_from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.strip_suffix("-band").unwrap_or(&name);
        match name {
            "" => Err(Error::parse("Filter name cannot be empty.")),
            "clear" => Ok(Filter::Clear),
            "h-alpha" | "halpha" => Ok(Filter::HAlpha),
            band if band.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Ok(Filter::Band(band.to_string()))
            }
            other => Err(Error::Parse(format!("Invalid filter name: '{}'.", other))),
        }
    }

    /// Name of the wheel position as the hardware knows it.
    pub fn wheel_position(&self) -> String {
        match self {
            Filter::Clear => "clear".into(),
            Filter::HAlpha => "h-alpha".into(),
            Filter::Band(band) => format!("{band}-band"),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Clear => write!(f, "clear"),
            Filter::HAlpha => write!(f, "h-alpha"),
            Filter::Band(band) => write!(f, "{band}"),
        }
    }
}

// ==========
// DomeState
// ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIterDerive)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum DomeState {
    Open,
    Closed,
}

impl DomeState {
    pub fn try_from(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            Error::Parse(format!(
                "Invalid dome state: '{}'. Valid states: {}",
                s.trim(),
                valid_csv::<DomeState>()
            ))
        })
    }
}

// ===============
// AdmissionState
// ===============

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIterDerive)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum AdmissionState {
    On,
    Off,
}

impl AdmissionState {
    pub fn try_from(s: &str) -> Result<Self> {
        Self::from_str(s.trim()).map_err(|_| {
            Error::Parse(format!(
                "Invalid admission state: '{}'. Valid states: {}",
                s.trim(),
                valid_csv::<AdmissionState>()
            ))
        })
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, AdmissionState::On)
    }
}

impl Serialize for AdmissionState {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for AdmissionState {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<AdmissionState, <D as Deserializer<'de>>::Error> {
        let s = String::deserialize(deserializer)?;
        AdmissionState::try_from(&s).map_err(serde::de::Error::custom)
    }
}

// ======
// Magic
// ======

/// Shared discriminator carried by every wire message. Clients may send it
/// as a JSON string or number; it is always compared and stored as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Magic(pub String);

impl Magic {
    pub fn new(value: impl Into<String>) -> Self {
        Magic(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the magic field from a raw JSON value, if present.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Magic(s.clone())),
            serde_json::Value::Number(n) => Some(Magic(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Magic {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Magic {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Magic, <D as Deserializer<'de>>::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Magic::from_json(&raw)
            .ok_or_else(|| serde::de::Error::custom("magic must be a string or a number"))
    }
}

// =====
// Bool
// =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, EnumIterDerive)]
#[strum(ascii_case_insensitive)]
pub enum BoolFormat {
    #[strum(serialize = "true", serialize = "True", to_string = "True")]
    TextTrue,

    #[strum(serialize = "false", serialize = "False", to_string = "False")]
    TextFalse,
}

impl BoolFormat {
    #[inline]
    fn to_bool(self) -> bool {
        matches!(self, BoolFormat::TextTrue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bool(pub bool);

impl Bool {
    pub fn try_from_str(s: &str) -> Result<Self> {
        match BoolFormat::from_str(s) {
            Ok(fmt) => Ok(Bool(fmt.to_bool())),
            Err(_) => Err(Error::Parse(format!(
                "Invalid string value for boolean: '{}'. Valid values: {}",
                s,
                valid_csv::<BoolFormat>()
            ))),
        }
    }
}

impl fmt::Display for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.0 { "True" } else { "False" })
    }
}

impl Serialize for Bool {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bool {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Bool, <D as Deserializer<'de>>::Error> {
        let b = String::deserialize(deserializer)?;
        Bool::try_from_str(&b).map_err(serde::de::Error::custom)
    }
}

// ============
// ChannelKind
// ============

/// How telescope commands reach the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// `sh -c` on this machine.
    Local,
    /// `ssh <host>` to the telescope control computer.
    Remote(String),
    /// Commands are logged and answered with benign telemetry; nothing runs.
    Demo,
}

impl ChannelKind {
    pub fn try_from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(ChannelKind::Local),
            "demo" => return Ok(ChannelKind::Demo),
            _ => {}
        }
        match s.split_once(':') {
            Some((scheme, host)) if scheme.eq_ignore_ascii_case("ssh") && !host.trim().is_empty() => {
                Ok(ChannelKind::Remote(host.trim().to_string()))
            }
            _ => Err(Error::Parse(format!(
                "Invalid telescope channel: '{}'. Valid values: local, demo, ssh:<host>",
                s
            ))),
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, ChannelKind::Demo)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Local => write!(f, "local"),
            ChannelKind::Remote(host) => write!(f, "ssh:{host}"),
            ChannelKind::Demo => write!(f, "demo"),
        }
    }
}

impl Serialize for ChannelKind {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChannelKind {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<ChannelKind, <D as Deserializer<'de>>::Error> {
        let s = String::deserialize(deserializer)?;
        ChannelKind::try_from_str(&s).map_err(serde::de::Error::custom)
    }
}

// ================
// TwilightSetting
// ================

#[derive(Copy, Clone, Debug, EnumIterDerive, AsRefStr, EnumString)]
pub enum TimeFormat {
    #[strum(serialize = "%H:%M:%S")]
    Hms,
    #[strum(serialize = "%H:%M")]
    Hm,
}

/// Where tonight's twilight comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TwilightSetting {
    /// Computed from the site location.
    Almanac,
    /// The same local time every night.
    Fixed(NaiveTime),
}

impl TwilightSetting {
    pub fn try_from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("almanac") {
            return Ok(TwilightSetting::Almanac);
        }
        for fmt in [TimeFormat::Hms, TimeFormat::Hm] {
            if let Ok(t) = NaiveTime::parse_from_str(s, fmt.as_ref()) {
                return Ok(TwilightSetting::Fixed(t));
            }
        }
        Err(Error::Parse(format!(
            "Invalid twilight setting: '{}'. Use 'almanac' or a local time such as '18:30'.",
            s
        )))
    }
}

impl fmt::Display for TwilightSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwilightSetting::Almanac => write!(f, "almanac"),
            TwilightSetting::Fixed(t) => write!(f, "{}", t.format(TimeFormat::Hms.as_ref())),
        }
    }
}

impl Serialize for TwilightSetting {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TwilightSetting {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<TwilightSetting, <D as Deserializer<'de>>::Error> {
        let s = String::deserialize(deserializer)?;
        TwilightSetting::try_from_str(&s).map_err(serde::de::Error::custom)
    }
}

// =============
// SiteLocation
// =============

/// Observatory position and its standard-time offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_hours: f64,
}

impl SiteLocation {
    pub fn offset(&self) -> Result<FixedOffset> {
        let secs = (self.utc_offset_hours * 3600.0).round() as i32;
        FixedOffset::east_opt(secs).ok_or_else(|| {
            Error::Config(format!(
                "Site UTC offset {} hours is out of range.",
                self.utc_offset_hours
            ))
        })
    }
}

impl fmt::Display for SiteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat {:.4}, lon {:.4}, UTC{:+}",
            self.latitude, self.longitude, self.utc_offset_hours
        )
    }
}

// ===============
// PointingOffset
// ===============

/// Post-pointing correction in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingOffset {
    pub ra: f64,
    pub dec: f64,
}

impl PointingOffset {
    pub fn try_from_str(s: &str) -> Result<Self> {
        let (ra, dec) = s.trim().split_once(',').ok_or_else(|| {
            Error::Parse(format!(
                "Invalid offset: '{}'. Expected format: 'ra,dec' in degrees.",
                s.trim()
            ))
        })?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| Error::Parse(format!("Invalid offset component: '{}'.", v.trim())))
        };
        Ok(PointingOffset {
            ra: parse(ra)?,
            dec: parse(dec)?,
        })
    }
}

impl fmt::Display for PointingOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.ra, self.dec)
    }
}

impl Serialize for PointingOffset {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<<S as Serializer>::Ok, <S as Serializer>::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PointingOffset {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<PointingOffset, <D as Deserializer<'de>>::Error> {
        let s = String::deserialize(deserializer)?;
        PointingOffset::try_from_str(&s).map_err(serde::de::Error::custom)
    }
}
