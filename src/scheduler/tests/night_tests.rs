use crate::config::Config;
use crate::scheduler::{admission_night, observing_night, site_now};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::at;

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Site eight hours west of UTC with a fixed 18:00 local twilight.
fn pacific_config() -> Config {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let uniq = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path: PathBuf =
        std::env::temp_dir().join(format!("nightqueue-night-test-{nanos}-{uniq}.json"));
    let json = r#"{
  "server_port": { "value": 27745, "description": "" },
  "request_magic": { "value": "req", "description": "" },
  "admin_magic": { "value": "adm", "description": "" },
  "default_state": { "value": "on", "description": "" },
  "queue_dir": { "value": "queues", "description": "" },
  "site": { "value": { "latitude": 38.29, "longitude": -122.46, "utc_offset_hours": -8.0 } },
  "twilight": { "value": "18:00", "description": "" }
}"#;
    std::fs::write(&path, json).unwrap();
    Config::load_from(&path).unwrap()
}

fn utc(m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, m, d, h, 0, 0).unwrap()
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, m, d).unwrap()
}

#[test]
fn site_now_applies_utc_offset() {
    let config = pacific_config();
    assert_eq!(site_now(&config, utc(12, 16, 4)).unwrap(), at(2016, 12, 15, 20, 0));
}

#[test]
fn nights_follow_local_calendar_west_of_utc() {
    let config = pacific_config();

    // 10:00 local on the 15th: admitting for the 15th, the 14th is out.
    assert_eq!(admission_night(&config, utc(12, 15, 18)).unwrap(), day(12, 15));
    assert_eq!(observing_night(&config, utc(12, 15, 18)).unwrap(), day(12, 14));

    // 20:00 local on the 15th, already the 16th in UTC.
    assert_eq!(admission_night(&config, utc(12, 16, 4)).unwrap(), day(12, 16));
    assert_eq!(observing_night(&config, utc(12, 16, 4)).unwrap(), day(12, 15));

    // 02:00 local on the 16th: still observing the night of the 15th.
    assert_eq!(admission_night(&config, utc(12, 16, 10)).unwrap(), day(12, 16));
    assert_eq!(observing_night(&config, utc(12, 16, 10)).unwrap(), day(12, 15));
}

#[test]
fn observing_night_crosses_year_boundary() {
    let config = pacific_config();
    // 01:00 local on Jan 1st.
    let now = Utc.with_ymd_and_hms(2017, 1, 1, 9, 0, 0).unwrap();
    assert_eq!(observing_night(&config, now).unwrap(), day(12, 31));
}
