//! Tabular (civil) Islamic calendar conversion.
//!
//! Enough Hijri arithmetic to know which seasonal sunnah fasts apply on a
//! given Gregorian day. The civil calendar can differ from sighting-based
//! calendars by a day, which only shifts when a fast button shows up.

use chrono::{Datelike, NaiveDate, Weekday};

/// A date in the tabular Islamic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriDate {
    pub year: i32,
    /// 1 = Muharram .. 12 = Dzulhijjah
    pub month: u32,
    pub day: u32,
}

/// Convert a Gregorian date to the tabular Islamic calendar.
pub fn from_gregorian(date: NaiveDate) -> HijriDate {
    // Julian day number at noon of `date`.
    let jdn = i64::from(date.num_days_from_ce()) + 1_721_425;

    let l = jdn - 1_948_440 + 10_632;
    let n = (l - 1) / 10_631;
    let l = l - 10_631 * n + 354;
    let j = ((10_985 - l) / 5_316) * ((50 * l) / 17_719) + (l / 5_670) * ((43 * l) / 15_238);
    let l = l - ((30 - j) / 15) * ((17_719 * j) / 50) - (j / 16) * ((15_238 * j) / 43) + 29;
    let month = (24 * l) / 709;
    let day = l - (709 * month) / 24;
    let year = 30 * n + j - 30;

    HijriDate {
        year: year as i32,
        month: month as u32,
        day: day as u32,
    }
}

/// The seasonal sunnah fasts that apply on `date`.
///
/// Monday/Thursday fasts follow the weekday; Ayyamul Bidh the 13th-15th of
/// every Hijri month; Arafah 9 Dzulhijjah; Tasu'a/Asyura 9-10 Muharram.
pub fn sunnah_fasts_for(date: NaiveDate) -> Vec<&'static str> {
    let mut fasts = Vec::new();
    match date.weekday() {
        Weekday::Mon => fasts.push("Puasa Senin"),
        Weekday::Thu => fasts.push("Puasa Kamis"),
        _ => {}
    }
    let hijri = from_gregorian(date);
    if (13..=15).contains(&hijri.day) {
        fasts.push("Puasa Ayyamul Bidh");
    }
    if hijri.month == 12 && hijri.day == 9 {
        fasts.push("Puasa Arafah");
    }
    if hijri.month == 1 && (hijri.day == 9 || hijri.day == 10) {
        fasts.push("Puasa Tasu'a/Asyura");
    }
    fasts
}
