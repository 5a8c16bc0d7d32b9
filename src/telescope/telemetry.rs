use crate::errors::TelescopeError;

/// Value of the first `key=value` token in `text`, if any.
pub fn find_value<'a>(key: &str, text: &'a str) -> Option<&'a str> {
    text.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.trim_end_matches([',', ';']))
}

pub fn require_value<'a>(key: &str, text: &'a str) -> Result<&'a str, TelescopeError> {
    find_value(key, text).ok_or_else(|| TelescopeError::MissingTelemetry {
        key: key.to_string(),
    })
}

pub fn require_f64(key: &str, text: &str) -> Result<f64, TelescopeError> {
    let raw = require_value(key, text)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TelescopeError::InvalidTelemetry {
            key: key.to_string(),
            value: raw.to_string(),
        })
}
