use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use nightqueue::core::types::Target;
use nightqueue::errors::{ExecutionError, SessionError};
use nightqueue::executor::Executor;
use nightqueue::queue::{self, QueueFile};
use nightqueue::server::clock::ManualClock;
use nightqueue::server::{Reply, Server};
use nightqueue::session::{Session, SessionDefaults};
use nightqueue::telescope::channel::SimulatedChannel;
use nightqueue::telescope::{OnUnsafe, Telescope};
use tokio_util::sync::CancellationToken;

use nightqueue::config::Config;
use nightqueue::scheduler;

use crate::common::{
    ADMIN_MAGIC, entry, load_config, make_temp_dir, quiet_logger, write_demo_config_at,
};

fn telescope(channel: &SimulatedChannel) -> Telescope {
    Telescope::new(Box::new(channel.clone()), quiet_logger("TELESCOPE"))
        .with_unsafe_policy(OnUnsafe::Report)
}

fn request(user: &str, target: &str) -> String {
    serde_json::to_string(&entry(user, &[target], 20.0)).unwrap()
}

#[test]
fn admitted_requests_are_executed_in_order() {
    let dir = make_temp_dir("pipeline");
    let config = load_config(&dir);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap());
    let file = QueueFile::new(
        config.queue_dir(),
        config.queue_name(),
        NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
    );
    let mut server = Server::from_config(
        &config,
        file.clone(),
        Box::new(clock.clone()),
        quiet_logger("SERVER"),
    )
    .unwrap();

    for (user, target) in [("vega", "m31"), ("deneb", "m42"), ("altair", "m13")] {
        assert!(matches!(server.handle_line(&request(user, target)), Reply::Magic(_)));
    }
    // Inside the half hour before twilight nothing more is admitted.
    clock.set(Utc.with_ymd_and_hms(2021, 3, 4, 17, 45, 0).unwrap());
    assert!(matches!(server.handle_line(&request("late", "m1")), Reply::Error(_)));

    let channel = SimulatedChannel::demo();
    let mut executor = Executor::new(
        Arc::new(telescope(&channel)),
        quiet_logger("EXECUTOR"),
        CancellationToken::new(),
    );
    let loaded = executor
        .load_queue(&file.path(), SessionDefaults::from_config(&config))
        .unwrap();
    assert_eq!(loaded, 3);

    let summary = executor.run().unwrap();
    assert_eq!(summary.completed(), 3);
    let imaged: Vec<String> = summary
        .reports
        .iter()
        .flat_map(|r| r.imaged.iter().map(|t| t.to_string()))
        .collect();
    assert_eq!(imaged, vec!["m31", "m42", "m13"]);
    assert_eq!(channel.count("m1 "), 0);
}

#[test]
fn twilight_moves_admission_to_next_nights_file() {
    let dir = make_temp_dir("pipeline");
    let config = load_config(&dir);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 0).unwrap());
    let tonight = QueueFile::new(
        config.queue_dir(),
        "",
        NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
    );
    let mut server = Server::from_config(
        &config,
        tonight.clone(),
        Box::new(clock.clone()),
        quiet_logger("SERVER"),
    )
    .unwrap();

    server.handle_line(&request("vega", "m31"));
    clock.set(Utc.with_ymd_and_hms(2021, 3, 4, 18, 1, 0).unwrap());
    server.tick().unwrap();
    assert_eq!(server.queue_path(), tonight.next().path());
    assert!(matches!(server.handle_line(&request("deneb", "m42")), Reply::Magic(_)));

    let closed = queue::load(&tonight.path()).unwrap();
    let open = queue::load(&tonight.next().path()).unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].user, "deneb");
}

#[test]
fn west_of_utc_site_hands_off_the_local_night() {
    let dir = make_temp_dir("pipeline");
    let config = Config::load_from(write_demo_config_at(&dir, -8.0)).unwrap();
    // 10:00 local on Dec 15th.
    let morning = Utc.with_ymd_and_hms(2016, 12, 15, 18, 0, 0).unwrap();
    let clock = ManualClock::new(morning);
    let today = scheduler::site_now(&config, morning).unwrap().date();
    let file = QueueFile::new(config.queue_dir(), "", today);
    let mut server = Server::from_config(
        &config,
        file.clone(),
        Box::new(clock.clone()),
        quiet_logger("SERVER"),
    )
    .unwrap();
    server.handle_line(&request("vega", "m31"));

    // 18:05 local, already Dec 16th in UTC.
    clock.set(Utc.with_ymd_and_hms(2016, 12, 16, 2, 5, 0).unwrap());
    server.tick().unwrap();
    server.handle_line(&request("deneb", "m42"));
    assert!(server.queue_path().ends_with("2016-12-16_imaging_queue.json"));

    // The executor starting at 20:00 local picks the completed file.
    let evening = Utc.with_ymd_and_hms(2016, 12, 16, 4, 0, 0).unwrap();
    let observing = file.on(scheduler::observing_night(&config, evening).unwrap());
    assert_eq!(observing.path(), file.path());
    let handed_off = queue::load(&observing.path()).unwrap();
    assert_eq!(handed_off.len(), 1);
    assert_eq!(handed_off[0].user, "vega");
    assert_eq!(
        file.on(scheduler::admission_night(&config, evening).unwrap()).path(),
        server.queue_path()
    );
}

#[test]
fn admin_can_close_admission() {
    let dir = make_temp_dir("pipeline");
    let config = load_config(&dir);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2021, 3, 4, 9, 0, 0).unwrap());
    let file = QueueFile::new(config.queue_dir(), "", NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
    let mut server =
        Server::from_config(&config, file, Box::new(clock), quiet_logger("SERVER")).unwrap();

    let disable = format!(
        r#"{{"magic": "{ADMIN_MAGIC}", "user": "ops", "type": "state", "action": "disable"}}"#
    );
    assert_eq!(server.handle_line(&disable).to_wire(), ADMIN_MAGIC);
    assert!(matches!(server.handle_line(&request("vega", "m31")), Reply::Error(_)));
    assert!(queue::load(&server.queue_path()).unwrap().is_empty());
}

#[test]
fn failed_session_stops_the_night() {
    let channel = SimulatedChannel::demo().fail("outfile=m42_");
    let sessions = ["m31", "m42", "m13"]
        .into_iter()
        .map(|t| {
            let mut s = Session::new(10.0, "obs").with_demo(true);
            s.add_target(Target::Catalog(t.into()));
            s
        })
        .collect();
    let executor = Executor::new(
        Arc::new(telescope(&channel)),
        quiet_logger("EXECUTOR"),
        CancellationToken::new(),
    )
    .with_sessions(sessions);

    let err = executor.run().unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::SessionFailed {
            index: 2,
            source: SessionError::Capture { .. },
            ..
        }
    ));
    assert_eq!(channel.count("m13"), 0);
}

#[test]
fn unreachable_target_is_skipped_but_session_completes() {
    let channel = SimulatedChannel::demo().respond("catalog m42 | altaz", "alt=5.0 az=10.0");
    let tel = telescope(&channel);
    let mut session = Session::new(30.0, "obs").with_demo(true).with_count(2);
    session
        .add_target(Target::Catalog("m42".into()))
        .add_target(Target::Catalog("m31".into()));

    let report = session
        .execute(&tel, &CancellationToken::new(), &quiet_logger("SESSION"))
        .unwrap();
    assert_eq!(report.skipped, vec![Target::Catalog("m42".into())]);
    assert_eq!(report.imaged, vec![Target::Catalog("m31".into())]);
    assert_eq!(report.frames, 6);
    assert!(report.dome_closed);
    assert_eq!(channel.count("outfile=m42_"), 0);
}

#[test]
fn opening_an_open_dome_sends_nothing() {
    let channel = SimulatedChannel::demo().respond_exact("tx slit", "slit=open");
    let tel = telescope(&channel);
    assert!(tel.open_dome());
    assert_eq!(channel.count("openup"), 0);
}

#[test]
fn unsafe_weather_keeps_dome_closed() {
    for (taux, expected) in [
        ("rain=0 cloud=0.1", true),
        ("rain=0 cloud=0.39", true),
        ("rain=0 cloud=0.4", false),
        ("rain=1 cloud=0.0", false),
    ] {
        let channel = SimulatedChannel::demo().respond_exact("tx taux", taux);
        assert_eq!(telescope(&channel).weather_ok(), expected, "{taux}");
    }
}
