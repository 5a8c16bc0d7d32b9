use chrono::{Datelike, NaiveDate};

pub trait NaiveDateExt {
    /// The following calendar day (month lengths and Gregorian leap years
    /// handled by chrono).
    fn next_day(self) -> NaiveDate;

    /// The preceding calendar day.
    fn previous_day(self) -> NaiveDate;

    /// Compact observation stamp used in frame names, e.g. `2016oct07`.
    fn frame_stamp(self) -> String;
}

impl NaiveDateExt for NaiveDate {
    fn next_day(self) -> NaiveDate {
        self.succ_opt().unwrap_or(NaiveDate::MAX)
    }

    fn previous_day(self) -> NaiveDate {
        self.pred_opt().unwrap_or(NaiveDate::MIN)
    }

    fn frame_stamp(self) -> String {
        let month = self.format("%b").to_string().to_lowercase();
        format!("{}{}{:02}", self.year(), month, self.day())
    }
}
