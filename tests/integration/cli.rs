use chrono::NaiveDate;
use nightqueue::queue::{QueueFile, QueueStore};

use crate::common::{combined_output, entry, make_temp_dir, run_binary, write_demo_config};

fn write_queue(dir: &std::path::Path) -> std::path::PathBuf {
    let file = QueueFile::new(
        dir.join("queues"),
        "",
        NaiveDate::from_ymd_opt(2021, 3, 4).unwrap(),
    );
    let mut store = QueueStore::open(file.clone()).unwrap();
    store.append(&entry("vega", &["m31"], 5.0)).unwrap();
    store
        .append(&entry("deneb", &["m42", "10.68,41.27,2000"], 8.0).with_count(2))
        .unwrap();
    file.path()
}

#[test]
fn fails_without_configuration() {
    let dir = make_temp_dir("cli");
    let output = run_binary(&dir, &["config"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr: {stderr}");
}

#[test]
fn unknown_command_prints_usage() {
    let dir = make_temp_dir("cli");
    let output = run_binary(&dir, &["launch"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"));
}

#[test]
fn config_command_lists_every_key() {
    let dir = make_temp_dir("cli");
    write_demo_config(&dir);
    let output = run_binary(&dir, &["config"]);
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SERVER_PORT"));
    assert!(stdout.contains("demo"));
    assert!(!stdout.contains("req-42"), "magic must be masked");
}

#[test]
fn list_command_shows_queue_in_order() {
    let dir = make_temp_dir("cli");
    write_demo_config(&dir);
    let path = write_queue(&dir);

    let output = run_binary(&dir, &["list", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let vega = stdout.find("vega").expect("first entry listed");
    let deneb = stdout.find("deneb").expect("second entry listed");
    assert!(vega < deneb);
    assert!(stdout.contains("m42 10.68,41.27,2000"));
}

#[test]
fn execute_command_drains_demo_queue() {
    let dir = make_temp_dir("cli");
    write_demo_config(&dir);
    let path = write_queue(&dir);

    let output = run_binary(&dir, &["execute", path.to_str().unwrap()]);
    let all = combined_output(&output);
    assert!(output.status.success(), "{all}");
    assert!(all.contains("Queue complete: 2 session(s)"), "{all}");
}

#[test]
fn execute_command_fails_on_missing_queue() {
    let dir = make_temp_dir("cli");
    write_demo_config(&dir);
    let output = run_binary(&dir, &["execute", "nowhere.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("nowhere.json"));
}

#[test]
fn demo_commands_are_printed_without_a_log_file() {
    let dir = make_temp_dir("cli");
    write_demo_config(&dir);
    let path = write_queue(&dir);

    let output = run_binary(&dir, &["execute", path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[demo] Executing catalog m31 | dopoint"), "{stdout}");
    assert!(stdout.contains("[demo] Executing closedown && logout"), "{stdout}");
    assert!(!dir.join("logs").exists());
}
