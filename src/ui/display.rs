use std::io::Write;

use crate::config::Config;
use crate::core::models::QueueEntry;
use crate::ui::ansi::{FG_LIGHT_GRAY, STYLE_RESET};
use crate::ui::table_printer::TablePrinter;

const QUEUE_HEADERS: [&str; 7] = ["#", "USER", "TARGETS", "EXPOSURE", "COUNT", "FILTERS", "BIN"];
const CONFIG_HEADERS: [&str; 3] = ["KEY", "VALUE", "DESCRIPTION"];

pub fn queue_rows(entries: &[QueueEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            vec![
                (idx + 1).to_string(),
                if e.user.is_empty() { "-".into() } else { e.user.clone() },
                e.targets.join(" "),
                format!("{}s", e.exposure_time),
                e.exposure_count.to_string(),
                e.filters.join(","),
                e.binning.to_string(),
            ]
        })
        .collect()
}

pub fn render_queue<W: Write + ?Sized>(
    printer: &TablePrinter,
    title: &str,
    entries: &[QueueEntry],
    out: &mut W,
) -> std::io::Result<()> {
    printer.render_table(
        title,
        &QUEUE_HEADERS,
        &queue_rows(entries),
        "Queue is empty.",
        out,
    )
}

pub fn render_config<W: Write + ?Sized>(
    printer: &TablePrinter,
    config: &Config,
    out: &mut W,
) -> std::io::Result<()> {
    let rows: Vec<Vec<String>> = config
        .rows()
        .iter()
        .map(|(key, description, value)| {
            vec![
                key.clone(),
                value.clone(),
                format!("{FG_LIGHT_GRAY}{description}{STYLE_RESET}"),
            ]
        })
        .collect();
    let title = format!("Configuration ({})", config.path().display());
    printer.render_table(&title, &CONFIG_HEADERS, &rows, "No configuration items.", out)
}
