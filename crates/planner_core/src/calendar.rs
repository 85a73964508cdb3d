use time::{Date, Duration, Month, Weekday};

/// Local midnight boundaries only; weeks always begin on Sunday.
pub fn start_of_week(date: Date) -> Date {
    add_days(date, -i64::from(date.weekday().number_days_from_sunday()))
}

pub fn add_days(date: Date, days: i64) -> Date {
    date.checked_add(Duration::days(days)).unwrap_or(date)
}

pub fn week_days(week_start: Date) -> [Date; 7] {
    std::array::from_fn(|index| add_days(week_start, index as i64))
}

/// Start of the week `offset` whole weeks away from the week containing
/// `today`. Callers pass today from a live clock so offset 0 tracks the
/// real date across day boundaries.
pub fn week_start_for_offset(today: Date, offset: i32) -> Date {
    add_days(start_of_week(today), i64::from(offset) * 7)
}

pub fn date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn parse_date_key(key: &str) -> Option<Date> {
    let mut parts = key.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// 42 consecutive days covering the viewed month: the Sunday on or before
/// the 1st, through six full weeks, so a picker always shows complete rows.
pub fn month_grid(year: i32, month: Month) -> Vec<Date> {
    let Ok(first) = Date::from_calendar_date(year, month, 1) else {
        return Vec::new();
    };

    let grid_start = start_of_week(first);
    (0..42).map(|index| add_days(grid_start, index)).collect()
}

pub fn weekday_label(date: Date) -> &'static str {
    match date.weekday() {
        Weekday::Sunday => "Sun",
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
    }
}

pub fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

pub fn month_day_label(date: Date) -> String {
    format!("{} {}", month_label(date.month()), date.day())
}
