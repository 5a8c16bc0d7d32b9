use super::{at, hm};
use crate::core::types::{SiteLocation, TwilightSetting};
use crate::scheduler::twilight::{FixedTwilight, SolarAlmanac, TwilightSource, make_twilight_source};
use chrono::{NaiveDate, NaiveDateTime};

const SONOMA: SiteLocation = SiteLocation {
    latitude: 38.29,
    longitude: -122.46,
    utc_offset_hours: -8.0,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_between(value: NaiveDateTime, low: NaiveDateTime, high: NaiveDateTime) {
    assert!(
        low <= value && value <= high,
        "{value} not within {low} .. {high}"
    );
}

#[test]
fn fixed_twilight_uses_same_time_every_day() {
    let source = FixedTwilight(hm(18, 30));
    assert_eq!(source.twilight_on(day(2020, 6, 1)).unwrap(), at(2020, 6, 1, 18, 30));
    assert_eq!(source.twilight_on(day(2020, 12, 1)).unwrap(), at(2020, 12, 1, 18, 30));
}

#[test]
fn civil_twilight_in_sonoma_winter() {
    let almanac = SolarAlmanac::new(SONOMA, -6.0);
    let t = almanac.twilight_on(day(2016, 12, 15)).unwrap();
    assert_between(t, at(2016, 12, 15, 17, 10), at(2016, 12, 15, 17, 30));
}

#[test]
fn civil_twilight_in_sonoma_summer() {
    let almanac = SolarAlmanac::new(SONOMA, -6.0);
    let t = almanac.twilight_on(day(2016, 6, 21)).unwrap();
    assert_between(t, at(2016, 6, 21, 19, 58), at(2016, 6, 21, 20, 18));
}

#[test]
fn deeper_depression_is_later() {
    let sunset = SolarAlmanac::new(SONOMA, -0.833).twilight_on(day(2016, 12, 15)).unwrap();
    let civil = SolarAlmanac::new(SONOMA, -6.0).twilight_on(day(2016, 12, 15)).unwrap();
    let nautical = SolarAlmanac::new(SONOMA, -12.0).twilight_on(day(2016, 12, 15)).unwrap();
    assert!(sunset < civil && civil < nautical);
}

#[test]
fn equinox_on_the_equator_sets_near_six() {
    let site = SiteLocation {
        latitude: 0.0,
        longitude: 0.0,
        utc_offset_hours: 0.0,
    };
    let t = SolarAlmanac::new(site, -6.0).twilight_on(day(2016, 3, 20)).unwrap();
    assert_between(t, at(2016, 3, 20, 18, 20), at(2016, 3, 20, 18, 40));
}

#[test]
fn midnight_sun_has_no_twilight() {
    let site = SiteLocation {
        latitude: 78.2,
        longitude: 15.6,
        utc_offset_hours: 1.0,
    };
    assert!(SolarAlmanac::new(site, -6.0).twilight_on(day(2016, 6, 21)).is_err());
}

#[test]
fn factory_picks_source_from_setting() {
    let fixed = make_twilight_source(&TwilightSetting::Fixed(hm(19, 0)), &SONOMA, -6.0);
    assert_eq!(fixed.twilight_on(day(2016, 12, 15)).unwrap(), at(2016, 12, 15, 19, 0));

    let almanac = make_twilight_source(&TwilightSetting::Almanac, &SONOMA, -6.0);
    assert_between(
        almanac.twilight_on(day(2016, 12, 15)).unwrap(),
        at(2016, 12, 15, 17, 10),
        at(2016, 12, 15, 17, 30),
    );
}
