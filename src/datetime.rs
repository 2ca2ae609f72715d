//! Permissive date parsing for the `date` and `datetime` parameter types.
//!
//! Accepts absolute timestamps in the usual machine and human formats, a date
//! followed by a clock time (`Mar 5, 2024 3:00 PM`), dates without a year
//! (`5 March`), a trailing `UTC`/`GMT` zone name, plus a small relative
//! grammar: `now`, `tomorrow noon`, `+2 weeks`, `3 days ago`, `next friday`,
//! `last month`, `first day of next month`.

use chrono::{
    DateTime, Datelike, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday,
};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M",
];

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%z"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %d %B %Y",
    "%A %B %d %Y",
];

/// Tried with the current year appended.
const YEARLESS_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y", "%m/%d %Y"];

const ZONE_NAMES: &[&str] = &["utc", "gmt", "z"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M%p", "%I:%M:%S%p"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Fortnight,
    Month,
    Year,
}

/// Returns true if `input` names a point in time relative to the local clock.
pub fn is_parseable(input: &str) -> bool {
    parse(input, Local::now().naive_local()).is_some()
}

/// Parse `input` into a naive timestamp, resolving relative phrases
/// against `now`.
pub fn parse(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let lower = input.to_lowercase();
    parse_timestamp(input)
        .or_else(|| parse_absolute(input, now.year()))
        .or_else(|| parse_month_edge(&lower, now))
        .or_else(|| parse_relative(&lower, now))
}

/// `@1700000000` style unix timestamps.
fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let secs: i64 = input.strip_prefix('@')?.parse().ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

fn parse_absolute(input: &str, year: i32) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.naive_utc());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt);
        }
    }

    parse_date(input, year)
        .map(|date| date.and_time(NaiveTime::MIN))
        .or_else(|| parse_date_and_time(input, year))
        .or_else(|| parse_named_zone(input, year))
}

fn parse_date(input: &str, year: i32) -> Option<NaiveDate> {
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    {
        return Some(date);
    }

    let with_year = format!("{input} {year}");
    if let Some(date) = YEARLESS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
    {
        return Some(date);
    }

    // "March 2024" has no day; pin it to the first.
    NaiveDate::parse_from_str(&format!("1 {input}"), "%d %B %Y").ok()
}

/// A date followed by a one or two word clock time: `12/25/2024 3pm`,
/// `Mar 5, 2024 3:00 PM`.
fn parse_date_and_time(input: &str, year: i32) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    (1..=2)
        .filter(|&time_len| tokens.len() > time_len)
        .find_map(|time_len| {
            let split = tokens.len() - time_len;
            let time = parse_time(&tokens[split..].concat().to_lowercase())?;
            let date = parse_date(&tokens[..split].join(" "), year)?;
            Some(date.and_time(time))
        })
}

/// A timestamp with a trailing zone name, read as UTC.
fn parse_named_zone(input: &str, year: i32) -> Option<NaiveDateTime> {
    let (rest, zone) = input.rsplit_once(char::is_whitespace)?;
    if !ZONE_NAMES.iter().any(|name| zone.eq_ignore_ascii_case(name)) {
        return None;
    }
    parse_absolute(rest.trim_end(), year)
}

/// `first day of <x>` and `last day of <x>`, keeping the time of `x`.
fn parse_month_edge(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (first, rest) = if let Some(rest) = input.strip_prefix("first day of") {
        (true, rest)
    } else {
        (false, input.strip_prefix("last day of")?)
    };

    let rest = rest.trim();
    let base = if rest.is_empty() { now } else { parse(rest, now)? };
    let first_of_month = base.date().with_day(1)?;
    let date = if first {
        first_of_month
    } else {
        first_of_month.checked_add_months(Months::new(1))?.pred_opt()?
    };
    Some(date.and_time(base.time()))
}

fn parse_relative(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let mut current = now;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "now" => {}
            "today" | "midnight" => current = start_of_day(current),
            "noon" => current = current.date().and_time(NaiveTime::from_hms_opt(12, 0, 0)?),
            "tomorrow" => current = shift(start_of_day(current), Unit::Day, 1)?,
            "yesterday" => current = shift(start_of_day(current), Unit::Day, -1)?,
            "next" | "last" | "this" => {
                let target = tokens.get(i + 1)?;
                let direction = match token {
                    "next" => 1,
                    "last" => -1,
                    _ => 0,
                };
                current = shift_named(current, target, direction)?;
                i += 1;
            }
            _ => {
                if let Ok(weekday) = token.parse::<Weekday>() {
                    current = seek_weekday(current, weekday, 0)?;
                } else if let Some(time) = parse_time(token) {
                    current = current.date().and_time(time);
                } else {
                    let amount: i64 = token.strip_prefix('+').unwrap_or(token).parse().ok()?;
                    let unit = parse_unit(tokens.get(i + 1)?)?;
                    i += 1;
                    let amount = if tokens.get(i + 1) == Some(&"ago") {
                        i += 1;
                        amount.checked_neg()?
                    } else {
                        amount
                    };
                    current = shift(current, unit, amount)?;
                }
            }
        }
        i += 1;
    }

    Some(current)
}

fn parse_time(token: &str) -> Option<NaiveTime> {
    let parse = |s: &str| {
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
    };
    parse(token).or_else(|| {
        // "2pm" has no minutes, which chrono requires
        let (hour, suffix) = token
            .strip_suffix("am")
            .map(|hour| (hour, "am"))
            .or_else(|| token.strip_suffix("pm").map(|hour| (hour, "pm")))?;
        if hour.is_empty() || !hour.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parse(&format!("{hour}:00{suffix}"))
    })
}

fn parse_unit(token: &str) -> Option<Unit> {
    let singular = token.strip_suffix('s').unwrap_or(token);
    match singular {
        "sec" | "second" => Some(Unit::Second),
        "min" | "minute" => Some(Unit::Minute),
        "hour" => Some(Unit::Hour),
        "day" => Some(Unit::Day),
        "week" => Some(Unit::Week),
        "fortnight" => Some(Unit::Fortnight),
        "month" => Some(Unit::Month),
        "year" => Some(Unit::Year),
        _ => None,
    }
}

fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_time(NaiveTime::MIN)
}

fn shift(current: NaiveDateTime, unit: Unit, amount: i64) -> Option<NaiveDateTime> {
    let delta = match unit {
        Unit::Second => TimeDelta::try_seconds(amount)?,
        Unit::Minute => TimeDelta::try_minutes(amount)?,
        Unit::Hour => TimeDelta::try_hours(amount)?,
        Unit::Day => TimeDelta::try_days(amount)?,
        Unit::Week => TimeDelta::try_weeks(amount)?,
        Unit::Fortnight => TimeDelta::try_weeks(amount.checked_mul(2)?)?,
        Unit::Month => return shift_months(current, amount),
        Unit::Year => return shift_months(current, amount.checked_mul(12)?),
    };
    current.checked_add_signed(delta)
}

fn shift_months(current: NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        current.checked_add_months(months)
    } else {
        current.checked_sub_months(months)
    }
}

/// Handles `next <x>`, `last <x>` and `this <x>` where `x` is a weekday or a unit.
fn shift_named(current: NaiveDateTime, target: &str, direction: i64) -> Option<NaiveDateTime> {
    if let Ok(weekday) = target.parse::<Weekday>() {
        return seek_weekday(current, weekday, direction);
    }
    let unit = parse_unit(target)?;
    shift(current, unit, direction)
}

/// Moves to the start of the given weekday.
///
/// Direction 0 allows today, 1 is strictly after today, -1 strictly before.
fn seek_weekday(current: NaiveDateTime, weekday: Weekday, direction: i64) -> Option<NaiveDateTime> {
    let today = i64::from(current.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let days = match direction {
        0 => (target - today).rem_euclid(7),
        d if d > 0 => match (target - today).rem_euclid(7) {
            0 => 7,
            n => n,
        },
        _ => match (today - target).rem_euclid(7) {
            0 => -7,
            n => -n,
        },
    };
    shift(start_of_day(current), Unit::Day, days)
}
