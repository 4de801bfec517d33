use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_MATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]{4}-[0-9]{2}-[0-9]{2})\s*([+-]\s*[0-9]+)\s*(day|week|month|year)s?").unwrap()
});

// Move by whole months, then re-apply the day of month, letting it spill into the next
// month when it does not fit: 2024-01-31 + 1 month is 2024-03-02.
fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(date.day0())))
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

// Finds `YYYY-MM-DD <+|-> n <day|week|month|year>[s]` anywhere in the text and applies it.
// None when there is no such substring, the literal is not a real calendar date, or the
// result is out of range; callers then treat the text as an ordinary expression.
pub fn apply_date_math(text: &str) -> Option<NaiveDate> {
    let caps = DATE_MATH.captures(text)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let amount: i64 = caps[2].split_whitespace().collect::<String>().parse().ok()?;
    let result = match caps[3].to_ascii_lowercase().as_str() {
        "day" => add_days(date, amount),
        "week" => add_days(date, amount.checked_mul(7)?),
        "month" => add_months(date, amount),
        _ => add_months(date, amount.checked_mul(12)?),
    };
    log::trace!("date math {:?} gave {:?}", &caps[0], result);
    result
}
