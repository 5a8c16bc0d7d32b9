use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

use nightqueue::config::Config;
use nightqueue::core::models::QueueEntry;
use nightqueue::core::types::Magic;
use nightqueue::logging::Logger;

pub const REQUEST_MAGIC: &str = "req-42";
pub const ADMIN_MAGIC: &str = "9981";

pub fn binary_path() -> String {
    let raw = PathBuf::from(env!("CARGO_BIN_EXE_nightqueue"));
    if raw.is_absolute() {
        return raw.to_string_lossy().to_string();
    }
    let from_manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(&raw);
    if from_manifest.exists() {
        return from_manifest.to_string_lossy().to_string();
    }
    raw.to_string_lossy().to_string()
}

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn make_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nightqueue-{prefix}-{}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Demo telescope, fixed 18:00 twilight at a UTC site, file logging off.
pub fn write_demo_config(dir: &Path) -> PathBuf {
    write_demo_config_at(dir, 0.0)
}

/// Same as [`write_demo_config`] for a site `utc_offset_hours` from UTC.
pub fn write_demo_config_at(dir: &Path, utc_offset_hours: f64) -> PathBuf {
    let cfg = format!(
        r#"{{
      "server_port": {{ "value": 0, "description": "port" }},
      "request_magic": {{ "value": "{REQUEST_MAGIC}", "description": "request magic" }},
      "admin_magic": {{ "value": {ADMIN_MAGIC}, "description": "admin magic" }},
      "default_state": {{ "value": "on", "description": "state" }},
      "queue_dir": {{ "value": "{}", "description": "queues" }},
      "site": {{
        "value": {{ "latitude": 0.0, "longitude": 0.0, "utc_offset_hours": {utc_offset_hours:.1} }},
        "description": "site"
      }},
      "twilight": {{ "value": "18:00", "description": "twilight" }},
      "telescope": {{ "value": "demo", "description": "channel" }},
      "file_logging_enabled": {{ "value": "False", "description": "file logging" }}
    }}"#,
        dir.join("queues").display(),
    );
    let path = dir.join("config.json");
    fs::write(&path, cfg).unwrap();
    path
}

pub fn load_config(dir: &Path) -> Config {
    Config::load_from(write_demo_config(dir)).expect("demo config should load")
}

pub fn quiet_logger(component: &'static str) -> Logger {
    let logger = Logger::new(component);
    logger.set_file_logging_enabled(false);
    logger
}

pub fn entry(user: &str, targets: &[&str], exposure_time: f64) -> QueueEntry {
    QueueEntry::new(
        Magic::new(REQUEST_MAGIC),
        user,
        targets.iter().map(|t| t.to_string()).collect(),
        exposure_time,
    )
}

pub fn run_binary(dir: &Path, args: &[&str]) -> Output {
    Command::new(binary_path())
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to run binary")
}

pub fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
